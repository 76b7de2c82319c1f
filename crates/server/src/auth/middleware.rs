use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use utils::sentry::configure_user_scope;

use super::{
    error::AuthError,
    provider::{Identity, IdentityProviderClient},
    session::SessionCodec,
};
use crate::{AppState, routes::ErrorResponse};

#[derive(Clone)]
pub struct RequestContext {
    pub identity: Identity,
}

/// Decides per request whether the caller holds a session the provider still accepts.
///
/// There is no local token verification: the userinfo call is the authority, every time.
#[derive(Clone)]
pub struct AuthGuard {
    provider: Arc<IdentityProviderClient>,
}

impl AuthGuard {
    pub fn new(provider: Arc<IdentityProviderClient>) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, jar: &CookieJar) -> Result<Identity, AuthError> {
        let Some(access_token) = SessionCodec::decode(jar) else {
            return Err(AuthError::NoSession);
        };
        self.provider.get_user_info(&access_token).await
    }
}

pub async fn require_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let identity = match state.guard().resolve(&jar).await {
        Ok(identity) => identity,
        Err(error) => {
            warn!(kind = error.kind(), %error, "request rejected by auth guard");
            return ErrorResponse::new(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    configure_user_scope(
        identity.subject(),
        identity.preferred_username.as_deref(),
        identity.email.as_deref(),
    );

    req.extensions_mut().insert(RequestContext { identity });

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::cookie::Cookie;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;
    use crate::test_support::{USERINFO_PATH, provider_for};

    fn guard_for(uri: &str) -> AuthGuard {
        AuthGuard::new(Arc::new(provider_for(uri)))
    }

    #[tokio::test]
    async fn missing_cookie_is_no_session_without_provider_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sub": "u-1" })))
            .expect(0)
            .mount(&server)
            .await;

        let guard = guard_for(&server.uri());
        let err = guard.resolve(&CookieJar::new()).await.unwrap_err();

        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn valid_cookie_resolves_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERINFO_PATH))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "u-1",
                "preferred_username": "ada",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let guard = guard_for(&server.uri());
        let jar = CookieJar::new().add(Cookie::new("access_token", "access-1"));
        let identity = guard.resolve(&jar).await.unwrap();

        assert_eq!(identity.subject(), "u-1");
        assert_eq!(identity.preferred_username.as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn provider_errors_propagate_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let guard = guard_for(&server.uri());
        let jar = CookieJar::new().add(Cookie::new("access_token", "revoked"));
        let err = guard.resolve(&jar).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn every_request_asks_the_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USERINFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sub": "u-1" })))
            .expect(2)
            .mount(&server)
            .await;

        let guard = guard_for(&server.uri());
        let jar = CookieJar::new().add(Cookie::new("access_token", "access-1"));
        guard.resolve(&jar).await.unwrap();
        guard.resolve(&jar).await.unwrap();
    }
}
