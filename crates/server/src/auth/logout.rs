use axum::response::{IntoResponse, Redirect, Response};
use url::Url;

use super::session::{CookieDirective, SessionCodec, SetCookies};
use crate::config::AuthConfig;

/// Redirect to the provider's end-session endpoint, clearing the local session on the way.
#[derive(Debug)]
pub struct LogoutRedirect {
    pub location: Url,
    pub cookies: [CookieDirective; 3],
}

impl LogoutRedirect {
    pub fn new(config: &AuthConfig, id_token_hint: Option<&str>, secure: bool) -> Self {
        Self {
            location: logout_url(config, id_token_hint),
            cookies: SessionCodec::clear(secure),
        }
    }
}

impl IntoResponse for LogoutRedirect {
    fn into_response(self) -> Response {
        (
            SetCookies(self.cookies),
            Redirect::temporary(self.location.as_str()),
        )
            .into_response()
    }
}

pub fn logout_url(config: &AuthConfig, id_token_hint: Option<&str>) -> Url {
    let mut url = config.end_session_endpoint().clone();
    {
        let mut qp = url.query_pairs_mut();
        qp.append_pair("client_id", config.client_id());
        qp.append_pair("post_logout_redirect_uri", config.post_logout_redirect_uri());
        if let Some(hint) = id_token_hint {
            qp.append_pair("id_token_hint", hint);
        }
    }
    url
}
