//! Route-level tests of the login state machine, driven through the router
//! with a deterministic fake provider — no network I/O anywhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

use google_login::app_routes;
use google_login::http::{BoxError, HttpExchange, HttpResponse};
use google_login::oauth::{AuthClient, OAuthConfig};
use google_login::web::GoogleAuthConfig;

/// Records provider calls so tests can assert "no network calls made".
#[derive(Clone, Default)]
struct FakeProvider {
    token_calls: Arc<AtomicUsize>,
    user_calls: Arc<AtomicUsize>,
    reject_code: bool,
}

impl FakeProvider {
    fn token_call_count(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    fn user_call_count(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }
}

impl HttpExchange for FakeProvider {
    async fn post_form(
        &self,
        _url: &Url,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, BoxError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_code {
            return Ok(HttpResponse {
                status: 400,
                body: r#"{"error":"invalid_grant"}"#.into(),
            });
        }
        assert!(params.contains(&("grant_type", "authorization_code")));
        Ok(HttpResponse {
            status: 200,
            body: r#"{"access_token":"at-123","token_type":"Bearer","expires_in":3600}"#.into(),
        })
    }

    async fn get_bearer(&self, _url: &Url, access_token: &str) -> Result<HttpResponse, BoxError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(access_token, "at-123");
        Ok(HttpResponse {
            status: 200,
            body: r#"{"id":"42","name":"Ada"}"#.into(),
        })
    }
}

fn test_router(fake: FakeProvider) -> Router {
    let config = OAuthConfig::new(
        "test-client",
        "test-secret",
        "http://localhost:3000/login/google/callback".parse().unwrap(),
    );
    let client = AuthClient::with_exchange(config, fake);
    app_routes(GoogleAuthConfig::new(client).with_secure_cookies(false))
}

async fn send(router: &Router, uri: &str, cookies: Option<&str>) -> Response {
    let mut request = Request::get(uri);
    if let Some(cookies) = cookies {
        request = request.header(header::COOKIE, cookies);
    }
    router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// `name=value` pairs from every `Set-Cookie` header on the response.
fn set_cookie_pairs(res: &Response) -> Vec<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|s| s.split(';').next())
        .map(str::to_string)
        .collect()
}

/// Cookie header forwarding the response's non-cleared cookies.
fn cookie_header(res: &Response) -> String {
    set_cookie_pairs(res)
        .into_iter()
        .filter(|pair| pair.split_once('=').is_some_and(|(_, value)| !value.is_empty()))
        .collect::<Vec<_>>()
        .join("; ")
}

fn sets_session_cookie(res: &Response) -> bool {
    set_cookie_pairs(res)
        .iter()
        .any(|pair| pair.split_once('=').is_some_and(|(name, value)| name == "session" && !value.is_empty()))
}

fn location(res: &Response) -> String {
    res.headers()[header::LOCATION].to_str().unwrap().to_string()
}

/// The `state` the provider would echo back, read from the redirect URL.
fn provider_state(res: &Response) -> String {
    let url = Url::parse(&location(res)).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

async fn body_string(res: Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn login_redirects_to_provider_and_sets_state_cookie() {
    let router = test_router(FakeProvider::default());

    let res = send(&router, "/login/google", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(location(&res).starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
    assert!(location(&res).contains("prompt=select_account"));

    let raw = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(raw.starts_with("google_oauth2_state="));
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("Path=/"));
    assert!(raw.contains("Max-Age=3600"));
}

#[tokio::test]
async fn each_login_attempt_uses_a_fresh_state() {
    let router = test_router(FakeProvider::default());

    let first = send(&router, "/login/google", None).await;
    let second = send(&router, "/login/google", None).await;
    assert_ne!(provider_state(&first), provider_state(&second));
}

#[tokio::test]
async fn callback_without_state_is_rejected() {
    let fake = FakeProvider::default();
    let router = test_router(fake.clone());

    let login = send(&router, "/login/google", None).await;
    let cookies = cookie_header(&login);

    let res = send(&router, "/login/google/callback?code=abc", Some(&cookies)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fake.token_call_count(), 0);
    assert_eq!(fake.user_call_count(), 0);
    assert!(!sets_session_cookie(&res));
}

#[tokio::test]
async fn callback_with_wrong_state_is_rejected() {
    let fake = FakeProvider::default();
    let router = test_router(fake.clone());

    let login = send(&router, "/login/google", None).await;
    let cookies = cookie_header(&login);

    let res = send(
        &router,
        "/login/google/callback?code=abc&state=not-the-right-one",
        Some(&cookies),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fake.token_call_count(), 0);
    assert_eq!(fake.user_call_count(), 0);
    assert!(!sets_session_cookie(&res));
}

#[tokio::test]
async fn callback_without_state_cookie_is_rejected() {
    let fake = FakeProvider::default();
    let router = test_router(fake.clone());

    let res = send(&router, "/login/google/callback?code=abc&state=whatever", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fake.token_call_count(), 0);
}

#[tokio::test]
async fn provider_denial_aborts_before_exchange() {
    let fake = FakeProvider::default();
    let router = test_router(fake.clone());

    let login = send(&router, "/login/google", None).await;
    let cookies = cookie_header(&login);

    let res = send(
        &router,
        "/login/google/callback?error=access_denied&error_description=user%20said%20no",
        Some(&cookies),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/?error=provider_denied");
    assert_eq!(fake.token_call_count(), 0);
    assert!(!sets_session_cookie(&res));
}

#[tokio::test]
async fn rejected_code_fails_login_without_touching_session() {
    let fake = FakeProvider {
        reject_code: true,
        ..FakeProvider::default()
    };
    let router = test_router(fake.clone());

    let login = send(&router, "/login/google", None).await;
    let cookies = cookie_header(&login);
    let state = provider_state(&login);

    let res = send(
        &router,
        &format!("/login/google/callback?code=bad-code&state={state}"),
        Some(&cookies),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/?error=token_exchange_failed");
    assert_eq!(fake.token_call_count(), 1);
    assert_eq!(fake.user_call_count(), 0);
    assert!(!sets_session_cookie(&res));
}

#[tokio::test]
async fn successful_login_stores_profile_and_home_shows_it() {
    let fake = FakeProvider::default();
    let router = test_router(fake.clone());

    let login = send(&router, "/login/google", None).await;
    let cookies = cookie_header(&login);
    let state = provider_state(&login);

    let callback = send(
        &router,
        &format!("/login/google/callback?code=good-code&state={state}"),
        Some(&cookies),
    )
    .await;
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&callback), "/");
    assert!(sets_session_cookie(&callback));
    assert_eq!(fake.token_call_count(), 1);
    assert_eq!(fake.user_call_count(), 1);

    // The state cookie is consumed at the callback.
    assert!(set_cookie_pairs(&callback).contains(&"google_oauth2_state=".to_string()));

    let session_cookies = cookie_header(&callback);
    let home = send(&router, "/", Some(&session_cookies)).await;
    assert_eq!(home.status(), StatusCode::OK);

    let body = body_string(home).await;
    assert!(body.contains(r#"{"id":"42","name":"Ada"}"#), "body: {body}");
    assert!(body.contains("/logout"));
}

#[tokio::test]
async fn anonymous_home_shows_login_link() {
    let router = test_router(FakeProvider::default());

    let res = send(&router, "/", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!sets_session_cookie(&res));

    let body = body_string(res).await;
    assert!(body.contains("/login/google"));
    assert!(!body.contains("/logout"));
}

#[tokio::test]
async fn logout_clears_session_and_is_idempotent() {
    let fake = FakeProvider::default();
    let router = test_router(fake.clone());

    let login = send(&router, "/login/google", None).await;
    let state = provider_state(&login);
    let callback = send(
        &router,
        &format!("/login/google/callback?code=good-code&state={state}"),
        Some(&cookie_header(&login)),
    )
    .await;
    let session_cookies = cookie_header(&callback);

    let logout = send(&router, "/logout", Some(&session_cookies)).await;
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&logout), "/");
    assert!(set_cookie_pairs(&logout).contains(&"session=".to_string()));

    // Browser dropped the cookie; home is anonymous again.
    let home = send(&router, "/", None).await;
    let body = body_string(home).await;
    assert!(body.contains("/login/google"));

    // Logout with no active session is a no-op, not an error.
    let again = send(&router, "/logout", None).await;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie_pairs(&again).is_empty());
}

#[tokio::test]
async fn tampered_session_cookie_is_treated_as_anonymous() {
    let router = test_router(FakeProvider::default());

    let res = send(&router, "/", Some("session=ZmFrZS1nYXJiYWdl")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_string(res).await;
    assert!(body.contains("/login/google"));
}
