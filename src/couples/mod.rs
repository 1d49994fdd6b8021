//! # Couples Module
//!
//! Read side of the pairing between two users. Couples are created and
//! dissolved elsewhere; this service only looks them up.

pub mod models;
pub mod repository;


pub use models::Couple;
pub use repository::{CoupleRepository, SqliteCoupleRepository};
