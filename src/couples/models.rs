//! Couple data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Couple database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Couple {
    pub id: i64,
    pub couple_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
