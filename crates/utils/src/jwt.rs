use jsonwebtoken::dangerous::insecure_decode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenClaimsError {
    #[error("failed to decode JWT: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),
    #[error("missing `iss` claim in token")]
    MissingIssuer,
    #[error("issuer `{0}` does not name a realm")]
    NoRealm(String),
}

#[derive(Debug, Deserialize)]
struct IssClaim {
    iss: Option<String>,
}

/// Extract the issuer from a JWT without verifying its signature.
pub fn extract_issuer(token: &str) -> Result<String, TokenClaimsError> {
    let data = insecure_decode::<IssClaim>(token)?;
    data.claims
        .iss
        .filter(|iss| !iss.is_empty())
        .ok_or(TokenClaimsError::MissingIssuer)
}

/// Extract the realm label from a JWT issuer of the form `<origin>/realms/<realm>`.
///
/// The signature is NOT verified. The result is a label for logs and storage, never an
/// authentication decision.
pub fn extract_realm(token: &str) -> Result<String, TokenClaimsError> {
    let issuer = extract_issuer(token)?;
    match realm_from_issuer(&issuer) {
        Some(realm) => Ok(realm.to_string()),
        None => Err(TokenClaimsError::NoRealm(issuer)),
    }
}

pub fn realm_from_issuer(issuer: &str) -> Option<&str> {
    let (_, rest) = issuer.trim_end_matches('/').rsplit_once("/realms/")?;
    let realm = rest.split('/').next()?;
    (!realm.is_empty()).then_some(realm)
}
