//! # Users Module
//!
//! The application's user accounts, keyed by the Firebase subject identifier:
//! - User row model and the sign-in provider enum
//! - Repository trait with an SQLite implementation

pub mod models;
pub mod repository;

#[cfg(test)]
mod tests;

pub use models::{Provider, User, UserUpsert};
pub use repository::{RepositoryError, SqliteUserRepository, UserRepository};
