use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::instrument;
use utils::api::identity::ProfileResponse;

use super::error::{ErrorResponse, storage_error};
use crate::{AppState, auth::RequestContext, db::users::UserRecord};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/me", get(get_profile))
}

#[instrument(
    name = "identity.get_profile",
    skip(state, ctx),
    fields(subject = %ctx.identity.subject())
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ProfileResponse>, ErrorResponse> {
    let user = state
        .users()
        .find_by_subject(ctx.identity.subject())
        .await
        .map_err(|error| storage_error(error, "load profile"))?
        .ok_or_else(|| ErrorResponse::new(StatusCode::NOT_FOUND, "User not found"))?;

    Ok(Json(profile_response(user)))
}

fn profile_response(user: UserRecord) -> ProfileResponse {
    ProfileResponse {
        subject: user.id,
        email: user.email,
        email_verified: user.email_verified,
        name: user.name,
        preferred_username: user.preferred_username,
        given_name: user.given_name,
        family_name: user.family_name,
        realm: user.realm,
        created_at: user.created_at,
    }
}
