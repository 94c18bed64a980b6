#![doc = include_str!("../README.md")]

pub mod error;
pub mod http;
pub mod oauth;
pub mod session;
pub mod state_token;
pub mod web;

// Re-exports for convenient access
pub use error::Error;
pub use http::{HttpExchange, HttpResponse, ReqwestExchange};
pub use oauth::{AuthClient, OAuthConfig, TokenResponse, UserProfile};
pub use session::{Session, SessionStore};
pub use state_token::{generate_state, verify_state};
pub use web::{AuthError, GoogleAuthConfig, app_routes};
