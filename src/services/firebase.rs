// src/services/firebase.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation,
};
use reqwest::{header::CACHE_CONTROL, Client};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Google's JWK set for keys that sign Firebase ID tokens
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Firebase ID tokens are issued by `https://securetoken.google.com/<project-id>`
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Clock skew tolerated on `exp`, `iat` and `auth_time`
const LEEWAY_SECS: i64 = 60;

/// Used when Google's response has no usable `Cache-Control: max-age`
const DEFAULT_KEY_TTL_SECS: i64 = 3600;

/// Upper bound on how long a fetched key set is trusted
const MAX_KEY_TTL_SECS: i64 = 86_400;

/// An unknown `kid` only triggers a refetch once the key set is this old
const MIN_REFETCH_INTERVAL_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("ID token must not be empty")]
    EmptyToken,

    #[error("Malformed ID token: {0}")]
    Malformed(String),

    #[error("Firebase ID token has expired")]
    Expired,

    #[error("Firebase ID token has incorrect \"aud\" (audience) claim")]
    InvalidAudience,

    #[error("Firebase ID token has incorrect \"iss\" (issuer) claim")]
    InvalidIssuer,

    #[error("Firebase ID token has an invalid signature")]
    InvalidSignature,

    #[error("Firebase ID token has invalid claims: {0}")]
    InvalidClaims(String),

    #[error("No public key found for key id {0}")]
    UnknownKey(String),

    #[error("Failed to fetch Firebase public keys: {0}")]
    KeyFetch(String),
}

/// Identity asserted by a successfully verified token
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    pub subject_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub issuer: String,
    /// Every claim in the token payload, including the ones above
    pub claims: Map<String, Value>,
}

impl VerifiedClaims {
    /// Builds the typed view over a raw claim map.
    ///
    /// Fails only when `sub` is missing or empty.
    pub fn from_claims(claims: Map<String, Value>) -> Result<Self, VerifyError> {
        let subject_id = string_claim(&claims, "sub")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VerifyError::InvalidClaims("\"sub\" must be a non-empty string".into()))?;

        Ok(Self {
            subject_id,
            email: string_claim(&claims, "email"),
            name: string_claim(&claims, "name"),
            picture_url: string_claim(&claims, "picture"),
            issuer: string_claim(&claims, "iss").unwrap_or_default(),
            claims,
        })
    }
}

fn string_claim(claims: &Map<String, Value>, key: &str) -> Option<String> {
    claims.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Turns a bearer token into verified claims, or refuses it
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError>;
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug)]
struct CachedKeys {
    keys: HashMap<String, Jwk>,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

enum CacheLookup {
    Hit(Jwk),
    /// Fresh set that does not know the kid and was fetched too recently to retry
    Miss,
    Refetch,
}

impl CachedKeys {
    fn lookup(cache: Option<&CachedKeys>, kid: &str, now: DateTime<Utc>) -> CacheLookup {
        let Some(cached) = cache else {
            return CacheLookup::Refetch;
        };
        if cached.expires_at <= now {
            return CacheLookup::Refetch;
        }
        if let Some(jwk) = cached.keys.get(kid) {
            return CacheLookup::Hit(jwk.clone());
        }
        if now - cached.fetched_at < Duration::seconds(MIN_REFETCH_INTERVAL_SECS) {
            CacheLookup::Miss
        } else {
            CacheLookup::Refetch
        }
    }
}

/// Verifies Firebase Authentication ID tokens against Google's public keys
///
/// Built once at startup and shared behind an `Arc`. Only the public key set
/// is cached; every token is checked in full on every call.
#[derive(Debug)]
pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    client: Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            client,
            keys: RwLock::new(None),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn expected_issuer(&self) -> String {
        format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)
    }

    /// Returns the key for `kid`, refetching the key set when the cache is
    /// stale, or when it does not know the id and is older than the
    /// minimum refetch interval.
    async fn key_for(&self, kid: &str) -> Result<Jwk, VerifyError> {
        match CachedKeys::lookup(self.keys.read().await.as_ref(), kid, Utc::now()) {
            CacheLookup::Hit(jwk) => return Ok(jwk),
            CacheLookup::Miss => return Err(unknown_key(kid)),
            CacheLookup::Refetch => {}
        }

        // Concurrent misses queue here; only the first one fetches.
        let mut cache = self.keys.write().await;
        match CachedKeys::lookup(cache.as_ref(), kid, Utc::now()) {
            CacheLookup::Hit(jwk) => return Ok(jwk),
            CacheLookup::Miss => return Err(unknown_key(kid)),
            CacheLookup::Refetch => {}
        }

        debug!(kid = %kid, "Refreshing Firebase public keys");
        let fresh = self.fetch_keys().await?;
        let found = fresh.keys.get(kid).cloned();
        *cache = Some(fresh);

        found.ok_or_else(|| unknown_key(kid))
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, VerifyError> {
        debug!(url = %self.jwks_url, "Fetching Firebase public keys");

        let response = self.client.get(&self.jwks_url).send().await.map_err(|e| {
            error!(error = %e, url = %self.jwks_url, "HTTP error fetching Firebase public keys");
            VerifyError::KeyFetch(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(http_status = %status, "Firebase public key endpoint returned error status");
            return Err(VerifyError::KeyFetch(format!("key endpoint returned {}", status)));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEY_TTL_SECS);

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| VerifyError::KeyFetch(format!("invalid key set: {}", e)))?;

        info!(key_count = set.keys.len(), ttl_secs = ttl, "Fetched Firebase public keys");

        let now = Utc::now();
        Ok(CachedKeys {
            keys: set.keys.into_iter().map(|k| (k.kid.clone(), k)).collect(),
            fetched_at: now,
            expires_at: now + Duration::seconds(ttl),
        })
    }

    fn decode_claims(&self, token: &str, jwk: &Jwk) -> Result<Map<String, Value>, VerifyError> {
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| VerifyError::KeyFetch(format!("unusable public key {}: {}", jwk.kid, e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = LEEWAY_SECS as u64;
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.expected_issuer()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let data = decode::<Map<String, Value>>(token, &key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                ErrorKind::InvalidAudience => VerifyError::InvalidAudience,
                ErrorKind::InvalidIssuer => VerifyError::InvalidIssuer,
                ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
                ErrorKind::MissingRequiredClaim(claim) => {
                    VerifyError::InvalidClaims(format!("missing \"{}\" claim", claim))
                }
                ErrorKind::ImmatureSignature => {
                    VerifyError::InvalidClaims("token is not valid yet".to_string())
                }
                _ => VerifyError::Malformed(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

fn unknown_key(kid: &str) -> VerifyError {
    warn!(kid = %kid, "ID token signed with an unknown key");
    VerifyError::UnknownKey(kid.to_string())
}

/// Rejects tokens whose sign-in or issue time lies in the future
fn check_times(claims: &Map<String, Value>, now: i64) -> Result<(), VerifyError> {
    for field in ["auth_time", "iat"] {
        if let Some(ts) = claims.get(field).and_then(Value::as_i64) {
            if ts > now + LEEWAY_SECS {
                return Err(VerifyError::InvalidClaims(format!(
                    "\"{}\" is in the future",
                    field
                )));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerifyError::EmptyToken);
        }

        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Malformed(format!(
                "expected RS256 algorithm, got {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Malformed("missing \"kid\" header".to_string()))?;

        let jwk = self.key_for(&kid).await?;
        let claims = self.decode_claims(token, &jwk)?;
        check_times(&claims, Utc::now().timestamp())?;

        let verified = VerifiedClaims::from_claims(claims)?;
        info!(firebase_uid = %verified.subject_id, "Successfully verified Firebase token");
        Ok(verified)
    }
}

/// Extracts `max-age` seconds from a Cache-Control header value, capped at
/// [`MAX_KEY_TTL_SECS`]
fn parse_max_age(value: &str) -> Option<i64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<i64>().ok())
        .filter(|secs| *secs > 0)
        .map(|secs| secs.min(MAX_KEY_TTL_SECS))
}

#[cfg(test)]
impl FirebaseVerifier {
    /// A verifier whose key set is already loaded and never expires
    pub(crate) fn with_static_keys(project_id: &str, keys: &[(&str, &str, &str)]) -> Self {
        let verifier = Self::new(project_id, "http://127.0.0.1:9/unreachable");
        let keys = keys
            .iter()
            .map(|(kid, n, e)| {
                (
                    kid.to_string(),
                    Jwk {
                        kid: kid.to_string(),
                        n: n.to_string(),
                        e: e.to_string(),
                    },
                )
            })
            .collect();
        *verifier.keys.try_write().expect("fresh lock") = Some(CachedKeys {
            keys,
            fetched_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(1),
        });
        verifier
    }

    /// A verifier with an empty cache that loads keys from `jwks_url`
    pub(crate) fn with_key_endpoint(project_id: &str, jwks_url: &str) -> Self {
        let mut verifier = Self::new(project_id, jwks_url);
        verifier.client = Client::builder()
            .no_proxy()
            .build()
            .expect("test http client");
        verifier
    }

    /// Shifts the cached key set `secs` seconds into the past
    pub(crate) async fn age_cached_keys(&self, secs: i64) {
        if let Some(cached) = self.keys.write().await.as_mut() {
            cached.fetched_at = cached.fetched_at - Duration::seconds(secs);
            cached.expires_at = cached.expires_at - Duration::seconds(secs);
        }
    }

    pub(crate) async fn cached_ttl_secs(&self) -> Option<i64> {
        self.keys
            .read()
            .await
            .as_ref()
            .map(|cached| (cached.expires_at - cached.fetched_at).num_seconds())
    }
}
