use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use super::config::GoogleAuthConfig;
use super::cookies;
use super::error::AuthError;
use super::state::AppState;
use crate::http::HttpExchange;
use crate::session::SessionStore;
use crate::state_token;

/// Session key under which the authenticated profile is stored.
const USER_KEY: &str = "user";

/// Create the application router: home view plus the three login-flow routes.
pub fn app_routes<H: HttpExchange>(config: GoogleAuthConfig<H>) -> Router {
    let sessions = SessionStore::new()
        .with_cookie_name(config.settings.session_cookie_name.clone())
        .with_idle_ttl(config.settings.session_idle_ttl)
        .with_secure(config.settings.secure_cookies);

    let state = AppState {
        client: Arc::new(config.client),
        sessions,
        settings: config.settings,
    };

    Router::new()
        .route("/", get(home::<H>))
        .route("/login/google", get(login::<H>))
        .route("/login/google/callback", get(callback::<H>))
        .route("/logout", get(logout::<H>))
        .with_state(state)
}

// ── Home ───────────────────────────────────────────────────────────

async fn home<H: HttpExchange>(
    State(state): State<AppState<H>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Html<String>) {
    let session = state.sessions.load(&jar);

    let body = match session.get(USER_KEY) {
        Some(user) => format!(
            "<html><body><div>User: {user}</div><a href=\"/logout\">Logout</a></body></html>"
        ),
        None => "<html><body><div><a href=\"/login/google\">Google Login</a></div></body></html>"
            .to_string(),
    };

    // Re-committing refreshes the idle expiry for active visitors.
    let jar = state.sessions.commit(jar, session);
    (jar, Html(body))
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<H: HttpExchange>(
    State(state): State<AppState<H>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let oauth_state = state_token::generate_state();
    let url = state.client.authorization_url(&oauth_state);

    let jar = jar.add(cookies::state_cookie(
        &oauth_state,
        state.settings.secure_cookies,
    ));

    (jar, Redirect::to(url.as_str()))
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback<H: HttpExchange>(
    State(state): State<AppState<H>>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    if let Some(error) = &params.error {
        let desc = params.error_description.as_deref().unwrap_or("unknown error");
        tracing::warn!(error = %error, description = %desc, "OAuth2 error from Google");
        return Err(login_error(&state.settings.error_redirect, "provider_denied"));
    }

    // CSRF guard: both states must be present and equal before anything
    // touches the network.
    let stored_state = cookies::get_state(&jar);
    if !state_token::verify_state(stored_state.as_deref(), params.state.as_deref()) {
        tracing::warn!("OAuth state mismatch");
        return Err(AuthError::StateMismatch.into_response());
    }

    let code = params
        .code
        .ok_or_else(|| login_error(&state.settings.error_redirect, "missing_code"))?;

    let token_response = state.client.exchange_code(&code).await.map_err(|e| {
        tracing::error!(error = %e, "Token exchange failed");
        login_error(&state.settings.error_redirect, "token_exchange_failed")
    })?;

    let user = state
        .client
        .fetch_user(&token_response.access_token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Userinfo request failed");
            login_error(&state.settings.error_redirect, "userinfo_failed")
        })?;

    // Both provider calls succeeded; only now does the session change.
    let mut session = state.sessions.load(&jar);
    session.set(USER_KEY, user.into_json());

    let jar = state.sessions.commit(jar, session);
    let jar = jar.remove(cookies::clear_state_cookie());

    tracing::info!("Google OAuth2 login successful");

    Ok((jar, Redirect::to(&state.settings.login_redirect)))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<H: HttpExchange>(
    State(state): State<AppState<H>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let mut session = state.sessions.load(&jar);
    session.destroy();

    // No-op when there is no active session.
    let jar = state.sessions.commit(jar, session);
    (jar, Redirect::to(&state.settings.logout_redirect))
}

// ── Helpers ────────────────────────────────────────────────────────

fn login_error(error_redirect: &str, code: &str) -> Response {
    let encoded = urlencoding::encode(code);
    Redirect::to(&format!("{error_redirect}?error={encoded}")).into_response()
}
