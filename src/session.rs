use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

const DEFAULT_COOKIE_NAME: &str = "session";

/// Default idle expiry for the session cookie.
pub const DEFAULT_IDLE_TTL: Duration = Duration::seconds(900);

/// Encrypted cookie payload.
///
/// `expires_at` enforces idle expiry server-side even if the browser keeps
/// the cookie past its `Max-Age`.
#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    #[serde(with = "time::serde::timestamp")]
    expires_at: OffsetDateTime,
    data: serde_json::Map<String, Value>,
}

/// Per-browser key/value session state.
///
/// Lazily created: loading with no (or an invalid) cookie yields an empty
/// session. Mutations only reach the browser when the store commits the
/// session back onto the outgoing cookie jar.
#[derive(Debug, Clone, Default)]
pub struct Session {
    data: serde_json::Map<String, Value>,
    destroyed: bool,
}

impl Session {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Mark the session for deletion; the commit emits a removal cookie.
    pub fn destroy(&mut self) {
        self.data.clear();
        self.destroyed = true;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Cookie-transported session store.
///
/// The session payload is serialized to JSON and carried in a cookie
/// encrypted by the jar's key; the browser owns the cookie but only the
/// server holding the key can read or write its contents.
#[derive(Debug, Clone)]
pub struct SessionStore {
    cookie_name: String,
    idle_ttl: Duration,
    secure: bool,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.into(),
            idle_ttl: DEFAULT_IDLE_TTL,
            secure: true,
        }
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Load the session from the request's cookie jar.
    ///
    /// Fails closed: a missing, tampered (undecryptable), malformed, or
    /// expired cookie yields a fresh empty session instead of an error.
    #[must_use]
    pub fn load(&self, jar: &PrivateCookieJar) -> Session {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Session::default();
        };

        let payload: Payload = match serde_json::from_str(cookie.value()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable session payload, starting fresh");
                return Session::default();
            }
        };

        if payload.expires_at <= OffsetDateTime::now_utc() {
            tracing::debug!("session idle expiry reached, starting fresh");
            return Session::default();
        }

        Session {
            data: payload.data,
            destroyed: false,
        }
    }

    /// Serialize the (possibly mutated) session back onto the outgoing jar.
    ///
    /// Committing refreshes the idle expiry. Destroyed or empty sessions
    /// produce a removal cookie when one was previously set, so anonymous
    /// visitors never accumulate session cookies.
    #[must_use]
    pub fn commit(&self, jar: PrivateCookieJar, session: Session) -> PrivateCookieJar {
        if session.destroyed || session.is_empty() {
            if jar.get(&self.cookie_name).is_some() {
                return jar.remove(self.removal_cookie());
            }
            return jar;
        }

        let payload = Payload {
            expires_at: OffsetDateTime::now_utc() + self.idle_ttl,
            data: session.data,
        };
        let value = match serde_json::to_string(&payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "session serialization failed, dropping mutation");
                return jar;
            }
        };

        let cookie = Cookie::build((self.cookie_name.clone(), value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(self.idle_ttl)
            .build();

        jar.add(cookie)
    }

    fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .max_age(Duration::ZERO)
            .build()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;
    use serde_json::json;

    fn store() -> SessionStore {
        SessionStore::new().with_secure(false)
    }

    #[test]
    fn test_commit_load_round_trip() {
        let jar = PrivateCookieJar::new(Key::generate());

        let mut session = store().load(&jar);
        session.set("user", json!({"id": "42", "name": "Ada"}));
        let jar = store().commit(jar, session);

        let loaded = store().load(&jar);
        assert_eq!(loaded.get("user"), Some(&json!({"id": "42", "name": "Ada"})));
    }

    #[test]
    fn test_missing_cookie_yields_empty_session() {
        let jar = PrivateCookieJar::new(Key::generate());
        let session = store().load(&jar);
        assert!(session.is_empty());
        assert!(session.get("user").is_none());
    }

    #[test]
    fn test_malformed_payload_fails_closed() {
        let jar = PrivateCookieJar::new(Key::generate()).add(Cookie::new("session", "not json"));
        let session = store().load(&jar);
        assert!(session.is_empty());
    }

    #[test]
    fn test_expired_session_fails_closed() {
        let jar = PrivateCookieJar::new(Key::generate());

        let expired = store().with_idle_ttl(Duration::seconds(-1));
        let mut session = Session::default();
        session.set("user", json!({"id": "42"}));
        let jar = expired.commit(jar, session);

        let loaded = store().load(&jar);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_destroy_removes_cookie() {
        let jar = PrivateCookieJar::new(Key::generate());

        let mut session = Session::default();
        session.set("user", json!({"id": "42"}));
        let jar = store().commit(jar, session);
        assert!(jar.get("session").is_some());

        let mut session = store().load(&jar);
        session.destroy();
        let jar = store().commit(jar, session);
        assert!(jar.get("session").is_none());
    }

    #[test]
    fn test_empty_session_never_sets_cookie() {
        let jar = PrivateCookieJar::new(Key::generate());
        let session = store().load(&jar);
        let jar = store().commit(jar, session);
        assert!(jar.get("session").is_none());
    }

    #[test]
    fn test_remove_key() {
        let mut session = Session::default();
        session.set("user", json!({"id": "42"}));
        assert!(session.remove("user").is_some());
        assert!(session.is_empty());
        assert!(session.remove("user").is_none());
    }
}
