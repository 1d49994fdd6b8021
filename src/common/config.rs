// src/common/config.rs
//! Process configuration loaded from the environment at startup

use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::path::Path;

use crate::services::firebase::DEFAULT_JWKS_URL;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub firebase_project_id: String,
    pub firebase_jwks_url: String,
    pub cors_origins: Vec<String>,
    pub sentry_dsn: Option<String>,
    pub environment: String,
    pub reset_db: bool,
}

/// The subset of a Google service-account key file we care about
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    project_id: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://couple_back.db".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        let firebase_project_id = match env::var("FIREBASE_PROJECT_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            Some(id) => id.trim().to_string(),
            None => {
                let key_path = env::var("FIREBASE_SERVICE_ACCOUNT_KEY").map_err(|_| {
                    anyhow!("either FIREBASE_PROJECT_ID or FIREBASE_SERVICE_ACCOUNT_KEY must be set")
                })?;
                project_id_from_service_account(Path::new(&key_path))?
            }
        };

        let firebase_jwks_url =
            env::var("FIREBASE_JWKS_URL").unwrap_or_else(|_| DEFAULT_JWKS_URL.to_string());

        let cors_origins = parse_list(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        );

        let sentry_dsn = env::var("SENTRY_DSN").ok().filter(|v| !v.is_empty());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let reset_db = env::var("RESET_DB")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        Ok(Self {
            database_url,
            port,
            firebase_project_id,
            firebase_jwks_url,
            cors_origins,
            sentry_dsn,
            environment,
            reset_db,
        })
    }
}

/// Reads the `project_id` out of a service-account JSON key file
pub fn project_id_from_service_account(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read service account key {}", path.display()))?;
    parse_service_account(&raw)
}

fn parse_service_account(raw: &str) -> anyhow::Result<String> {
    let key: ServiceAccountKey =
        serde_json::from_str(raw).context("service account key is not valid JSON")?;
    if key.project_id.trim().is_empty() {
        return Err(anyhow!("service account key has an empty project_id"));
    }
    Ok(key.project_id)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
