use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

const STATE_COOKIE_NAME: &str = "google_oauth2_state";

// One login attempt must complete within this window.
const STATE_COOKIE_TTL: Duration = Duration::hours(1);

/// Create the short-lived CSRF state cookie for the authorization request.
pub(super) fn state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, state.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(STATE_COOKIE_TTL)
        .build()
}

/// Create the removal cookie for the CSRF state.
pub(super) fn clear_state_cookie() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Get the stored state from cookies.
pub(super) fn get_state(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string())
}
