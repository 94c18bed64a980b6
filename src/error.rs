#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Token endpoint rejected the code, returned a malformed body, or the
    /// exchange transport failed (including timeout).
    #[error("token exchange failed: {detail}")]
    TokenExchange {
        status: Option<u16>,
        detail: String,
    },
    /// Userinfo endpoint failed after a valid token was obtained.
    #[error("profile fetch failed: {detail}")]
    ProfileFetch {
        status: Option<u16>,
        detail: String,
    },
}

impl Error {
    /// Provider HTTP status, when the provider answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenExchange { status, .. } | Self::ProfileFetch { status, .. } => *status,
        }
    }
}
