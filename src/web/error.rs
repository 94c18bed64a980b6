use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Authentication errors surfaced directly as HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// CSRF state missing from the callback or not matching the login cookie.
    /// The mandatory guard before any token exchange happens.
    #[error("invalid OAuth2 state")]
    StateMismatch,

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::StateMismatch => StatusCode::BAD_REQUEST.into_response(),
            Self::Config(_) => {
                tracing::error!(error = %self, "auth configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
