use std::sync::Arc;

use crate::{
    auth::{AuthGuard, IdentityProviderClient, LoginCallbackService},
    config::ServerConfig,
    db::{notes::NoteStore, users::UserStore},
};

#[derive(Clone)]
pub struct AppState {
    config: ServerConfig,
    provider: Arc<IdentityProviderClient>,
    users: Arc<dyn UserStore>,
    notes: Arc<dyn NoteStore>,
    login: Arc<LoginCallbackService>,
    guard: AuthGuard,
}

impl AppState {
    /// Wires the provider client and auth services around one shared HTTP client.
    pub fn new(
        config: ServerConfig,
        http_client: reqwest::Client,
        users: Arc<dyn UserStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        let provider = Arc::new(IdentityProviderClient::new(
            http_client,
            config.auth().clone(),
        ));
        let login = Arc::new(LoginCallbackService::new(
            Arc::clone(&provider),
            Arc::clone(&users),
        ));
        let guard = AuthGuard::new(Arc::clone(&provider));

        Self {
            config,
            provider,
            users,
            notes,
            login,
            guard,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn provider(&self) -> &IdentityProviderClient {
        &self.provider
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn notes(&self) -> &dyn NoteStore {
        self.notes.as_ref()
    }

    pub fn login(&self) -> Arc<LoginCallbackService> {
        Arc::clone(&self.login)
    }

    pub fn guard(&self) -> &AuthGuard {
        &self.guard
    }

    /// Session cookies are marked `Secure` only in production.
    pub fn secure_cookies(&self) -> bool {
        self.config.environment.is_production()
    }
}
