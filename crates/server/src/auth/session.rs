use axum::{
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use secrecy::{ExposeSecret, SecretString};
use time::Duration;

use super::provider::SessionTokens;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const ID_TOKEN_COOKIE: &str = "id_token";

pub const DEFAULT_ACCESS_MAX_AGE_SECS: i64 = 3600;
pub const DEFAULT_REFRESH_MAX_AGE_SECS: i64 = 2_592_000;

/// One `Set-Cookie` instruction for the browser.
pub type CookieDirective = Cookie<'static>;

/// Maps session tokens to and from the three session cookies. Pure, no I/O.
pub struct SessionCodec;

impl SessionCodec {
    /// Cookies for a fresh session, always in the order access, refresh, id.
    ///
    /// The id token cookie lives as long as the access token cookie.
    pub fn encode(tokens: &SessionTokens, secure: bool) -> [CookieDirective; 3] {
        let access_max_age = tokens
            .access_expires_in
            .unwrap_or(DEFAULT_ACCESS_MAX_AGE_SECS);
        let refresh_max_age = tokens
            .refresh_expires_in
            .unwrap_or(DEFAULT_REFRESH_MAX_AGE_SECS);

        [
            directive(
                ACCESS_TOKEN_COOKIE,
                tokens.access_token.expose_secret().to_string(),
                Duration::seconds(access_max_age),
                secure,
            ),
            directive(
                REFRESH_TOKEN_COOKIE,
                tokens.refresh_token.expose_secret().to_string(),
                Duration::seconds(refresh_max_age),
                secure,
            ),
            directive(
                ID_TOKEN_COOKIE,
                tokens.id_token.expose_secret().to_string(),
                Duration::seconds(access_max_age),
                secure,
            ),
        ]
    }

    /// The access token, if the request carries a session. No cookie is not an error.
    pub fn decode(jar: &CookieJar) -> Option<SecretString> {
        cookie_value(jar, ACCESS_TOKEN_COOKIE).map(|token| SecretString::new(token.into()))
    }

    pub fn id_token(jar: &CookieJar) -> Option<String> {
        cookie_value(jar, ID_TOKEN_COOKIE)
    }

    /// Deletion cookies for all three names, whether or not they were ever set.
    pub fn clear(secure: bool) -> [CookieDirective; 3] {
        [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, ID_TOKEN_COOKIE]
            .map(|name| directive(name, String::new(), Duration::ZERO, secure))
    }
}

fn directive(
    name: &'static str,
    value: String,
    max_age: Duration,
    secure: bool,
) -> CookieDirective {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Appends cookie directives to a response as `Set-Cookie` headers, preserving their order.
pub struct SetCookies(pub [CookieDirective; 3]);

impl IntoResponseParts for SetCookies {
    type Error = (StatusCode, &'static str);

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.0 {
            let value = HeaderValue::try_from(cookie.encoded().to_string()).map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "session cookie is not a valid header value",
                )
            })?;
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}
