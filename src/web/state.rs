use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::AuthSettings;
use crate::http::HttpExchange;
use crate::oauth::AuthClient;
use crate::session::SessionStore;

/// Shared state for the auth route handlers.
pub(super) struct AppState<H> {
    pub(super) client: Arc<AuthClient<H>>,
    pub(super) sessions: SessionStore,
    pub(super) settings: AuthSettings,
}

// Manual Clone: avoid derive adding an `H: Clone` bound.
impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            sessions: self.sessions.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<H: HttpExchange> FromRef<AppState<H>> for Key {
    fn from_ref(state: &AppState<H>) -> Self {
        state.settings.cookie_key.clone()
    }
}
