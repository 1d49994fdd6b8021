//! # Auth Module
//!
//! This module handles sign-in through Firebase Authentication:
//! - Exchanging a Firebase ID token for the application user
//! - Resolving the sign-in provider from token claims
//! - Reporting whether the user is part of a couple

pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;


pub use models::AuthResponse;
pub use routes::auth_routes;
pub use service::{determine_provider, AuthError, AuthService};
