//! Authentication data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::couples::Couple;
use crate::users::{Provider, User};

/// Body of `POST /auth/firebase`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseAuthRequest {
    pub id_token: String,
}

/// Public projection of a user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    pub id: i64,
    pub firebase_uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfileDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            firebase_uid: user.firebase_uid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            photo_url: user.photo_url.clone(),
            provider: user.provider,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Whether the user is paired, and with which couple
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoupleStateDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub couple_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub couple_name: Option<String>,
    pub has_partner: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CoupleStateDto {
    pub fn single() -> Self {
        Self {
            couple_id: None,
            couple_name: None,
            has_partner: false,
            created_at: None,
        }
    }
}

impl From<Option<&Couple>> for CoupleStateDto {
    fn from(couple: Option<&Couple>) -> Self {
        match couple {
            Some(couple) => Self {
                couple_id: Some(couple.id),
                couple_name: couple.couple_name.clone(),
                has_partner: true,
                created_at: Some(couple.created_at),
            },
            None => Self::single(),
        }
    }
}

/// Successful response of `POST /auth/firebase`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserProfileDto,
    pub couple_state: CoupleStateDto,
}
