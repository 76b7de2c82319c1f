use std::{env, time::Duration};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const CALLBACK_PATH: &str = "/api/login/callback";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable `{0}`")]
    InvalidVar(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Session cookies carry the `Secure` attribute only in production.
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub pool_size: u32,
    pub listen_addr: String,
    pub environment: Environment,
    pub sentry_dsn: Option<String>,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts()?,
        };

        let pool_size = match env::var("POOL_SIZE") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidVar("POOL_SIZE"))?,
            Err(_) => DEFAULT_POOL_SIZE,
        };

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let environment = env::var("ENVIRONMENT")
            .map(|value| Environment::parse(&value))
            .unwrap_or(Environment::Development);

        let sentry_dsn = env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty());

        let auth = AuthConfig::from_env()?;

        Ok(Self {
            database_url,
            pool_size,
            listen_addr,
            environment,
            sentry_dsn,
            auth,
        })
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

fn database_url_from_parts() -> Result<String, ConfigError> {
    let host = required("DB_HOST")?;
    let port: u16 = required("DB_PORT")?
        .parse()
        .map_err(|_| ConfigError::InvalidVar("DB_PORT"))?;
    let name = required("DB_NAME")?;
    let user = required("DB_USER")?;
    let password = required("DB_PASS")?;

    compose_database_url(&host, port, &name, &user, &password)
}

fn compose_database_url(
    host: &str,
    port: u16,
    name: &str,
    user: &str,
    password: &str,
) -> Result<String, ConfigError> {
    let mut url = Url::parse(&format!("postgres://{host}:{port}"))
        .map_err(|_| ConfigError::InvalidVar("DB_HOST"))?;
    url.set_username(user)
        .map_err(|_| ConfigError::InvalidVar("DB_USER"))?;
    url.set_password(Some(password))
        .map_err(|_| ConfigError::InvalidVar("DB_PASS"))?;
    url.set_path(name);
    Ok(url.into())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

/// Identity provider client registration and the OIDC endpoints of its realm.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    client_id: String,
    client_secret: SecretString,
    realm: String,
    public_base_url: Url,
    redirect_uri: Url,
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
    end_session_endpoint: Url,
    request_timeout: Duration,
}

impl AuthConfig {
    pub fn new(
        provider_base_url: &str,
        realm: &str,
        client_id: String,
        client_secret: SecretString,
        public_base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let public_base_url = Url::parse(public_base_url.trim_end_matches('/'))
            .map_err(|_| ConfigError::InvalidVar("BASE_URL"))?;
        let redirect_uri = Url::parse(&format!(
            "{}{CALLBACK_PATH}",
            public_base_url.as_str().trim_end_matches('/')
        ))
        .map_err(|_| ConfigError::InvalidVar("BASE_URL"))?;

        let endpoint = |name: &str| {
            Url::parse(&format!(
                "{}/realms/{realm}/protocol/openid-connect/{name}",
                provider_base_url.trim_end_matches('/')
            ))
            .map_err(|_| ConfigError::InvalidVar("KEYCLOAK_BASE_URL"))
        };

        Ok(Self {
            client_id,
            client_secret,
            realm: realm.to_string(),
            authorization_endpoint: endpoint("auth")?,
            token_endpoint: endpoint("token")?,
            userinfo_endpoint: endpoint("userinfo")?,
            end_session_endpoint: endpoint("logout")?,
            public_base_url,
            redirect_uri,
            request_timeout,
        })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let public_base_url = required("BASE_URL")?;
        let provider_base_url = required("KEYCLOAK_BASE_URL")?;
        let realm = required("REALM")?;
        let client_id = required("CLIENT_ID")?;
        let client_secret = SecretString::new(required("CLIENT_SECRET")?.into());

        let timeout_secs = match env::var("PROVIDER_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidVar("PROVIDER_TIMEOUT_SECS"))?,
            Err(_) => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        Self::new(
            &provider_base_url,
            &realm,
            client_id,
            client_secret,
            &public_base_url,
            Duration::from_secs(timeout_secs),
        )
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Where the provider sends the browser after it has ended its own session.
    pub fn post_logout_redirect_uri(&self) -> &str {
        self.public_base_url.as_str().trim_end_matches('/')
    }

    pub fn authorization_endpoint(&self) -> &Url {
        &self.authorization_endpoint
    }

    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    pub fn userinfo_endpoint(&self) -> &Url {
        &self.userinfo_endpoint
    }

    pub fn end_session_endpoint(&self) -> &Url {
        &self.end_session_endpoint
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "https://sso.example.com/",
            "shed",
            "notes-web".into(),
            SecretString::new("s3cret".into()),
            "https://notes.example.com/",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn endpoints_are_derived_from_realm() {
        let config = config();
        assert_eq!(
            config.token_endpoint().as_str(),
            "https://sso.example.com/realms/shed/protocol/openid-connect/token"
        );
        assert_eq!(
            config.userinfo_endpoint().as_str(),
            "https://sso.example.com/realms/shed/protocol/openid-connect/userinfo"
        );
        assert_eq!(
            config.authorization_endpoint().as_str(),
            "https://sso.example.com/realms/shed/protocol/openid-connect/auth"
        );
        assert_eq!(
            config.end_session_endpoint().as_str(),
            "https://sso.example.com/realms/shed/protocol/openid-connect/logout"
        );
    }

    #[test]
    fn redirect_uri_points_at_callback() {
        let config = config();
        assert_eq!(
            config.redirect_uri().as_str(),
            "https://notes.example.com/api/login/callback"
        );
        assert_eq!(config.post_logout_redirect_uri(), "https://notes.example.com");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = AuthConfig::new(
            "https://sso.example.com",
            "shed",
            "notes-web".into(),
            SecretString::new("s3cret".into()),
            "not a url",
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(ConfigError::InvalidVar("BASE_URL"))));
    }

    #[test]
    fn environment_parsing() {
        assert!(Environment::parse("Production").is_production());
        assert!(Environment::parse(" production ").is_production());
        assert!(!Environment::parse("development").is_production());
        assert!(!Environment::parse("staging").is_production());
    }

    #[test]
    fn database_url_is_composed_from_parts() {
        let url = compose_database_url("db", 5432, "notes", "app", "p@ss").unwrap();
        assert_eq!(url, "postgres://app:p%40ss@db:5432/notes");
    }
}
