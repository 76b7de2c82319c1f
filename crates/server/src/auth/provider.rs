use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use utils::jwt;

use super::error::AuthError;
use crate::config::AuthConfig;

pub const USER_AGENT: &str = "ShedSoftNotes/1.0";

const LOGIN_SCOPES: &[&str] = &["openid", "profile", "email"];
const MAX_ERROR_DETAIL_LEN: usize = 512;

/// Tokens issued by a successful code exchange. Lives only long enough to be written into cookies.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub id_token: SecretString,
    pub access_expires_in: Option<i64>,
    pub refresh_expires_in: Option<i64>,
}

/// Principal resolved for one request. `subject` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    subject: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub display_name: Option<String>,
    pub preferred_username: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub realm: Option<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Option<Self> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return None;
        }
        Some(Self {
            subject,
            email: None,
            email_verified: None,
            display_name: None,
            preferred_username: None,
            given_name: None,
            family_name: None,
            realm: None,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    id_token: Option<String>,
    expires_in: Option<i64>,
    refresh_expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_session_tokens(self) -> Result<SessionTokens, AuthError> {
        let access_token = require_token(self.access_token, "access_token")?;
        let refresh_token = require_token(self.refresh_token, "refresh_token")?;
        let id_token = require_token(self.id_token, "id_token")?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            id_token,
            access_expires_in: self.expires_in,
            refresh_expires_in: self.refresh_expires_in,
        })
    }
}

fn require_token(value: Option<String>, field: &'static str) -> Result<SecretString, AuthError> {
    match value {
        Some(token) if !token.is_empty() => Ok(SecretString::new(token.into())),
        _ => Err(AuthError::IncompleteToken { missing: field }),
    }
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    preferred_username: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

/// Client for the two identity provider calls the login flow needs.
///
/// Holds a clone of the process-wide `reqwest::Client`, so every request shares one connection
/// pool. Nothing is cached and nothing is retried.
pub struct IdentityProviderClient {
    client: Client,
    config: AuthConfig,
}

impl IdentityProviderClient {
    pub fn new(client: Client, config: AuthConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authorization endpoint URL the browser is sent to when it has no session.
    pub fn authorize_url(&self) -> Url {
        let mut url = self.config.authorization_endpoint().clone();
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("client_id", self.config.client_id());
            qp.append_pair("redirect_uri", self.config.redirect_uri().as_str());
            qp.append_pair("response_type", "code");
            qp.append_pair("scope", &LOGIN_SCOPES.join(" "));
        }
        url
    }

    pub async fn exchange_code(&self, code: &str) -> Result<SessionTokens, AuthError> {
        let response = self
            .client
            .post(self.config.token_endpoint().clone())
            .timeout(self.config.request_timeout())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri().as_str()),
                ("client_id", self.config.client_id()),
                ("client_secret", self.config.client_secret().expose_secret()),
            ])
            .send()
            .await
            .map_err(AuthError::Unreachable)?;

        let status = response.status();
        let body = read_body(response).await?;
        if !status.is_success() {
            return Err(AuthError::ProviderRejected {
                status,
                detail: error_detail(&body),
            });
        }

        let payload: TokenResponse = serde_json::from_slice(&body)
            .map_err(|err| AuthError::ProtocolError(format!("token response: {err}")))?;

        payload.into_session_tokens()
    }

    pub async fn get_user_info(&self, access_token: &SecretString) -> Result<Identity, AuthError> {
        let response = self
            .client
            .get(self.config.userinfo_endpoint().clone())
            .timeout(self.config.request_timeout())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await
            .map_err(AuthError::Unreachable)?;

        let status = response.status();
        let body = read_body(response).await?;
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AuthError::InvalidToken);
            }
            status if !status.is_success() => {
                return Err(AuthError::ProviderRejected {
                    status,
                    detail: error_detail(&body),
                });
            }
            _ => {}
        }

        let profile: UserInfoResponse = serde_json::from_slice(&body)
            .map_err(|err| AuthError::ProtocolError(format!("userinfo response: {err}")))?;

        let mut identity = profile
            .sub
            .and_then(Identity::new)
            .ok_or(AuthError::MissingSubject)?;
        identity.email = profile.email;
        identity.email_verified = profile.email_verified;
        identity.display_name = profile.name;
        identity.preferred_username = profile.preferred_username;
        identity.given_name = profile.given_name;
        identity.family_name = profile.family_name;
        identity.realm = realm_label(access_token);

        Ok(identity)
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>, AuthError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(AuthError::Unreachable)
}

fn error_detail(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().take(MAX_ERROR_DETAIL_LEN).collect()
}

/// Best-effort tenant label from the token issuer. Not a verification step.
fn realm_label(access_token: &SecretString) -> Option<String> {
    match jwt::extract_realm(access_token.expose_secret()) {
        Ok(realm) => Some(realm),
        Err(error) => {
            debug!(%error, "no realm label in access token");
            None
        }
    }
}
