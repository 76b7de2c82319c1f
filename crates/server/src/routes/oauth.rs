use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::error::ErrorResponse;
use crate::{
    AppState,
    auth::{LogoutRedirect, SessionCodec, SetCookies},
};

const POST_LOGIN_PATH: &str = "/protected";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/login/callback", get(login_callback))
        .route("/api/logout", get(logout))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[instrument(name = "oauth.login_callback", skip(state, query))]
pub async fn login_callback(
    State(state): State<AppState>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(kind = "malformed_callback", %rejection, "login callback failed");
            return authentication_failed();
        }
    };

    let outcome = state
        .login()
        .handle_callback(
            query.code.as_deref(),
            query.error.as_deref(),
            query.error_description.as_deref(),
        )
        .await;

    match outcome {
        Ok(outcome) => {
            info!(
                subject = outcome.identity.subject(),
                created = outcome.created,
                "login completed"
            );
            let cookies = SessionCodec::encode(&outcome.tokens, state.secure_cookies());
            (SetCookies(cookies), Redirect::temporary(POST_LOGIN_PATH)).into_response()
        }
        Err(error) => {
            warn!(kind = error.kind(), %error, "login callback failed");
            authentication_failed()
        }
    }
}

fn authentication_failed() -> Response {
    ErrorResponse::new(StatusCode::UNAUTHORIZED, "Authentication failed").into_response()
}

#[instrument(name = "oauth.logout", skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> LogoutRedirect {
    let id_token = SessionCodec::id_token(&jar);
    LogoutRedirect::new(
        state.config().auth(),
        id_token.as_deref(),
        state.secure_cookies(),
    )
}
