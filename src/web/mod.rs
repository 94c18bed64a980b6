//! Axum HTTP surface for the Google login flow.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use google_login::web::{GoogleAuthConfig, app_routes};
//!
//! // 1. Configure from environment
//! let config = GoogleAuthConfig::from_env()?;
//!
//! // 2. Serve the routes
//! let app = app_routes(config);
//! axum::serve(listener, app).await?;
//! ```
//!
//! Routes: `GET /` (home view), `GET /login/google` (initiate),
//! `GET /login/google/callback` (state check + token exchange + profile
//! fetch), `GET /logout`.

mod config;
mod cookies;
mod error;
mod routes;
mod state;

pub use config::GoogleAuthConfig;
pub use error::AuthError;
pub use routes::app_routes;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
