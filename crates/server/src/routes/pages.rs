use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, instrument};
use utils::api::identity::IdentityResponse;

use crate::{AppState, auth::Identity};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/protected", get(protected))
}

/// Signed-in visitors go straight to the protected page; everyone else starts a login.
#[instrument(name = "pages.index", skip(state, jar))]
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    match state.guard().resolve(&jar).await {
        Ok(_) => Redirect::temporary("/protected"),
        Err(error) => {
            debug!(kind = error.kind(), "starting login");
            Redirect::temporary(state.provider().authorize_url().as_str())
        }
    }
}

#[instrument(name = "pages.protected", skip(state, jar))]
pub async fn protected(State(state): State<AppState>, jar: CookieJar) -> Response {
    match state.guard().resolve(&jar).await {
        Ok(identity) => Json(identity_response(identity)).into_response(),
        Err(error) => {
            debug!(kind = error.kind(), "protected page requires a session");
            Redirect::temporary("/").into_response()
        }
    }
}

fn identity_response(identity: Identity) -> IdentityResponse {
    IdentityResponse {
        subject: identity.subject().to_string(),
        email: identity.email,
        email_verified: identity.email_verified,
        display_name: identity.display_name,
        preferred_username: identity.preferred_username,
        given_name: identity.given_name,
        family_name: identity.family_name,
        realm: identity.realm,
    }
}
