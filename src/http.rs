use std::future::Future;
use std::time::Duration;

use url::Url;

/// Transport-level error from an [`HttpExchange`] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Both provider calls are bounded by this timeout; hitting it surfaces as
/// a transport error, not a hang.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw provider response, decoupled from the HTTP client type.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Narrow HTTP capability covering the two provider calls the login flow
/// makes: the form-encoded token exchange and the bearer-authenticated
/// userinfo fetch.
///
/// Production uses [`ReqwestExchange`]; tests substitute deterministic
/// fakes so no real network I/O happens.
pub trait HttpExchange: Send + Sync + 'static {
    /// POST `application/x-www-form-urlencoded` parameters.
    fn post_form(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse, BoxError>> + Send;

    /// GET with a bearer `Authorization` header.
    fn get_bearer(
        &self,
        url: &Url,
        access_token: &str,
    ) -> impl Future<Output = Result<HttpResponse, BoxError>> + Send;
}

/// [`HttpExchange`] backed by a shared [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestExchange {
    http: reqwest::Client,
}

impl ReqwestExchange {
    #[must_use]
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("reqwest client with static configuration");
        Self { http }
    }

    /// Use a custom HTTP client (for connection pool reuse).
    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn collect(response: reqwest::Response) -> Result<HttpResponse, BoxError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpExchange for ReqwestExchange {
    async fn post_form(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, BoxError> {
        let response = self.http.post(url.clone()).form(params).send().await?;
        Self::collect(response).await
    }

    async fn get_bearer(&self, url: &Url, access_token: &str) -> Result<HttpResponse, BoxError> {
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::collect(response).await
    }
}
