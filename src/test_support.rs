//! In-memory stand-ins for the verifier and repositories used by unit tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::AuthService;
use crate::couples::{Couple, CoupleRepository};
use crate::services::{IdentityVerifier, VerifiedClaims, VerifyError};
use crate::users::{RepositoryError, User, UserRepository, UserUpsert};

pub fn fixed_time(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
}

pub fn claims(
    subject_id: &str,
    email: Option<&str>,
    name: Option<&str>,
    picture_url: Option<&str>,
    issuer: &str,
    extra: Value,
) -> VerifiedClaims {
    let extra: Map<String, Value> = extra.as_object().cloned().unwrap_or_default();
    VerifiedClaims {
        subject_id: subject_id.to_string(),
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        picture_url: picture_url.map(str::to_string),
        issuer: issuer.to_string(),
        claims: extra,
    }
}

/// Accepts only the tokens it was told about
#[derive(Default)]
pub struct StubVerifier {
    tokens: HashMap<String, VerifiedClaims>,
    pub calls: AtomicUsize,
}

impl StubVerifier {
    pub fn accepting(mut self, token: &str, claims: VerifiedClaims) -> Self {
        self.tokens.insert(token.to_string(), claims);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| VerifyError::Malformed("Invalid token".to_string()))
    }
}

/// Behaves like the SQLite upsert: one row per firebase uid, `created_at`
/// and `id` kept on conflict.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<Vec<User>>,
    pub lookups: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail: AtomicBool,
}

impl InMemoryUserRepository {
    pub async fn insert(&self, user: User) {
        self.rows.write().await.push(user);
    }

    pub async fn all(&self) -> Vec<User> {
        self.rows.read().await.clone()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(RepositoryError::DatabaseError(sqlx::Error::PoolClosed))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_firebase_uid(
        &self,
        firebase_uid: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|u| u.firebase_uid == firebase_uid)
            .cloned())
    }

    async fn upsert(&self, user: &UserUpsert) -> Result<User, RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut rows = self.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|u| u.firebase_uid == user.firebase_uid) {
            row.email = user.email.clone();
            row.name = user.name.clone();
            row.photo_url = user.photo_url.clone();
            row.provider = user.provider;
            row.updated_at = user.updated_at;
            return Ok(row.clone());
        }

        let row = User {
            id: rows.len() as i64 + 1,
            firebase_uid: user.firebase_uid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            photo_url: user.photo_url.clone(),
            provider: user.provider,
            couple_id: None,
            created_at: user.created_at,
            updated_at: user.updated_at,
        };
        rows.push(row.clone());
        Ok(row)
    }
}

#[derive(Default)]
pub struct InMemoryCoupleRepository {
    couples: RwLock<HashMap<i64, Couple>>,
    pub reads: AtomicUsize,
}

impl InMemoryCoupleRepository {
    pub async fn insert(&self, couple: Couple) {
        self.couples.write().await.insert(couple.id, couple);
    }
}

#[async_trait]
impl CoupleRepository for InMemoryCoupleRepository {
    async fn find_by_user(&self, user: &User) -> Result<Option<Couple>, RepositoryError> {
        let Some(couple_id) = user.couple_id else {
            return Ok(None);
        };
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.couples.read().await.get(&couple_id).cloned())
    }
}

/// An [`AuthService`] wired to fresh fakes, with handles to inspect them
pub struct Harness {
    pub verifier: Arc<StubVerifier>,
    pub users: Arc<InMemoryUserRepository>,
    pub couples: Arc<InMemoryCoupleRepository>,
    pub service: AuthService,
}

impl Harness {
    pub fn new(verifier: StubVerifier) -> Self {
        let verifier = Arc::new(verifier);
        let users = Arc::new(InMemoryUserRepository::default());
        let couples = Arc::new(InMemoryCoupleRepository::default());
        let service = AuthService::new(verifier.clone(), users.clone(), couples.clone());
        Self {
            verifier,
            users,
            couples,
            service,
        }
    }
}
