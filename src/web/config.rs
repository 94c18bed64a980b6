use axum_extra::extract::cookie::Key;
use time::Duration;
use url::Url;

use super::error::AuthError;
use crate::http::HttpExchange;
use crate::oauth::{AuthClient, OAuthConfig};
use crate::session;

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_idle_ttl: Duration,
    pub(crate) secure_cookies: bool,
    pub(crate) login_redirect: String,
    pub(crate) logout_redirect: String,
    pub(crate) error_redirect: String,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "session".into(),
            session_idle_ttl: session::DEFAULT_IDLE_TTL,
            secure_cookies: true,
            login_redirect: "/".into(),
            logout_redirect: "/".into(),
            error_redirect: "/".into(),
        }
    }
}

/// Google authentication configuration.
///
/// Required field (`client`) is a constructor parameter.
///
/// Use [`from_env()`](GoogleAuthConfig::from_env) for convention-based setup,
/// or [`new()`](GoogleAuthConfig::new) with `with_*` methods for full control.
pub struct GoogleAuthConfig<H = crate::http::ReqwestExchange> {
    pub(super) client: AuthClient<H>,
    pub(super) settings: AuthSettings,
}

impl GoogleAuthConfig {
    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `GOOGLE_CLIENT_ID`: OAuth2 client ID
    /// - `GOOGLE_CLIENT_SECRET`: OAuth2 client secret
    /// - `GOOGLE_REDIRECT_URI`: OAuth2 callback URI (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `GOOGLE_AUTH_URL`: Override the authorize endpoint
    /// - `GOOGLE_TOKEN_URL`: Override the token endpoint
    /// - `GOOGLE_USERINFO_URL`: Override the userinfo endpoint
    /// - `GOOGLE_SCOPES`: Comma-separated OAuth2 scopes
    /// - `SESSION_ENCRYPTION_KEY`: Cookie encryption key bytes (≥64 bytes)
    /// - `DEV_AUTH`: Set to `"1"` or `"true"` to disable secure cookies for
    ///   plain-HTTP local development
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required env vars are missing or URLs
    /// are invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| AuthError::Config("GOOGLE_CLIENT_ID is required".into()))?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| AuthError::Config("GOOGLE_CLIENT_SECRET is required".into()))?;
        let redirect_uri_str = std::env::var("GOOGLE_REDIRECT_URI")
            .map_err(|_| AuthError::Config("GOOGLE_REDIRECT_URI is required".into()))?;
        let redirect_uri: Url = redirect_uri_str
            .parse()
            .map_err(|e| AuthError::Config(format!("GOOGLE_REDIRECT_URI: {e}")))?;

        let mut config = OAuthConfig::new(client_id, client_secret, redirect_uri);

        if let Ok(url_str) = std::env::var("GOOGLE_AUTH_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| AuthError::Config(format!("GOOGLE_AUTH_URL: {e}")))?;
            config = config.with_auth_url(url);
        }
        if let Ok(url_str) = std::env::var("GOOGLE_TOKEN_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| AuthError::Config(format!("GOOGLE_TOKEN_URL: {e}")))?;
            config = config.with_token_url(url);
        }
        if let Ok(url_str) = std::env::var("GOOGLE_USERINFO_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| AuthError::Config(format!("GOOGLE_USERINFO_URL: {e}")))?;
            config = config.with_userinfo_url(url);
        }
        if let Ok(scopes) = std::env::var("GOOGLE_SCOPES") {
            config =
                config.with_scopes(scopes.split(',').map(|s| s.trim().to_string()).collect());
        }

        let dev_auth = matches!(std::env::var("DEV_AUTH").as_deref(), Ok("1") | Ok("true"));

        let cookie_key = match std::env::var("SESSION_ENCRYPTION_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "SESSION_ENCRYPTION_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => Key::generate(),
        };

        Ok(Self::new(AuthClient::new(config))
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_auth))
    }
}

impl<H: HttpExchange> GoogleAuthConfig<H> {
    /// Create config with the required `AuthClient`.
    ///
    /// All optional fields use sensible defaults. Override with `with_*` methods.
    #[must_use]
    pub fn new(client: AuthClient<H>) -> Self {
        Self {
            client,
            settings: AuthSettings::defaults(),
        }
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_idle_ttl(mut self, ttl: Duration) -> Self {
        self.settings.session_idle_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_error_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.error_redirect = path.into();
        self
    }
}
