use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::http::{HttpExchange, ReqwestExchange};

/// Google `OAuth2` configuration.
///
/// Required fields are constructor parameters — no runtime "missing field"
/// errors. Constructed once at process start and shared by reference through
/// the [`AuthClient`]; request handlers never consult ambient state.
///
/// ```rust,ignore
/// use google_login::OAuthConfig;
///
/// let config = OAuthConfig::new("client-id", "client-secret", "https://my-app.com/login/google/callback".parse()?);
/// // Optional overrides via chaining:
/// let config = config.with_scopes(vec!["openid".into(), "profile".into()]);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) userinfo_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) prompt: Option<String>,
}

impl OAuthConfig {
    /// Create a new OAuth2 configuration with Google's endpoints.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth"
                .parse()
                .expect("valid default URL"),
            token_url: "https://oauth2.googleapis.com/token"
                .parse()
                .expect("valid default URL"),
            userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo"
                .parse()
                .expect("valid default URL"),
            scopes: vec!["https://www.googleapis.com/auth/userinfo.profile".into()],
            prompt: Some("select_account".into()),
        }
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    /// Override the OAuth2 scopes (default: the Google profile-read scope).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Override the `prompt` parameter (default: `select_account`).
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Omit the `prompt` parameter from the authorization URL.
    #[must_use]
    pub fn without_prompt(mut self) -> Self {
        self.prompt = None;
        self
    }

    /// `OAuth2` client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Authorization endpoint URL.
    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Token exchange endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// User info endpoint URL.
    #[must_use]
    pub fn userinfo_url(&self) -> &Url {
        &self.userinfo_url
    }

    /// `OAuth2` redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Requested `OAuth2` scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Token response from the provider's token endpoint.
///
/// Ephemeral: lives only for the duration of the callback handler.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Provider-returned profile claims.
///
/// Opaque JSON — validated only by a successful parse, stored in the
/// session exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(serde_json::Value);

impl UserProfile {
    /// Gets a claim value by key.
    #[must_use]
    pub fn claim(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Gets the inner JSON value.
    #[must_use]
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consumes the profile, returning the inner JSON value.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for UserProfile {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// `OAuth2` authorization-code client for Google.
pub struct AuthClient<H = ReqwestExchange> {
    config: OAuthConfig,
    http: H,
}

impl AuthClient {
    /// Create a new auth client with the default reqwest-backed transport.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: ReqwestExchange::new(),
        }
    }
}

impl<H: HttpExchange> AuthClient<H> {
    /// Create an auth client over a custom [`HttpExchange`] (for tests).
    #[must_use]
    pub fn with_exchange(config: OAuthConfig, http: H) -> Self {
        Self { config, http }
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the provider authorization URL for one login attempt.
    ///
    /// Pure URL construction, no network I/O. Visiting the URL makes the
    /// provider redirect back to `redirect_uri` with `code` and `state` on
    /// success, or an `error` parameter on denial.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> Url {
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &scope)
            .append_pair("state", state);

        if let Some(prompt) = &self.config.prompt {
            url.query_pairs_mut().append_pair("prompt", prompt);
        }

        url
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Single attempt, never retried — a failure propagates to the caller
    /// as a failed login.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenExchange`] on transport failure, a non-success
    /// status, or a body without a usable `access_token` field.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post_form(&self.config.token_url, &params)
            .await
            .map_err(|e| Error::TokenExchange {
                status: None,
                detail: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(Error::TokenExchange {
                status: Some(response.status),
                detail: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| Error::TokenExchange {
            status: None,
            detail: format!("malformed token response: {e}"),
        })
    }

    /// Fetch the user's profile using an access token.
    ///
    /// Single attempt, never retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileFetch`] on transport failure, a non-success
    /// status, or a non-JSON body.
    pub async fn fetch_user(&self, access_token: &str) -> Result<UserProfile, Error> {
        let response = self
            .http
            .get_bearer(&self.config.userinfo_url, access_token)
            .await
            .map_err(|e| Error::ProfileFetch {
                status: None,
                detail: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(Error::ProfileFetch {
                status: Some(response.status),
                detail: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| Error::ProfileFetch {
            status: None,
            detail: format!("non-JSON profile body: {e}"),
        })
    }
}
