use std::sync::Arc;

use super::{
    error::AuthError,
    provider::{Identity, IdentityProviderClient, SessionTokens},
};
use crate::db::{
    StorageError,
    users::{NewUser, UserStore},
};

#[derive(Debug)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub tokens: SessionTokens,
    /// Whether this login created the user row.
    pub created: bool,
}

/// Completes the authorization-code flow once the provider redirects back.
pub struct LoginCallbackService {
    provider: Arc<IdentityProviderClient>,
    users: Arc<dyn UserStore>,
}

impl LoginCallbackService {
    pub fn new(provider: Arc<IdentityProviderClient>, users: Arc<dyn UserStore>) -> Self {
        Self { provider, users }
    }

    pub async fn handle_callback(
        &self,
        code: Option<&str>,
        error: Option<&str>,
        error_description: Option<&str>,
    ) -> Result<LoginOutcome, AuthError> {
        // A provider-side denial wins over any code that came with it.
        if let Some(error) = error.filter(|error| !error.is_empty()) {
            return Err(AuthError::ProviderError {
                error: error.to_string(),
                description: error_description.map(str::to_string),
            });
        }

        let code = code
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingCode)?;

        let tokens = self.provider.exchange_code(code).await?;
        let identity = self.provider.get_user_info(&tokens.access_token).await?;
        let created = self.ensure_user(&identity).await?;

        Ok(LoginOutcome {
            identity,
            tokens,
            created,
        })
    }

    /// Creates the user row on first login. Existing rows are left as they are.
    async fn ensure_user(&self, identity: &Identity) -> Result<bool, StorageError> {
        if self
            .users
            .find_by_subject(identity.subject())
            .await?
            .is_some()
        {
            return Ok(false);
        }

        self.users.insert(NewUser::from(identity)).await
    }
}
