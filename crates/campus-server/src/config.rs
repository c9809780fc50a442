use std::path::PathBuf;

use anyhow::{Context, Result};

/// Placeholder JWT secret used when none is configured. Fine locally, never in production.
pub const PLACEHOLDER_SECRET: &str = "dev-secret-change-me";

const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_FROM_EMAIL: &str = "Campus Market <noreply@campusmarket.ca>";

/// Origins always allowed alongside an explicitly configured `FRONTEND_URL`.
pub const PRODUCTION_ORIGINS: &[&str] = &["https://campusmarket.ca", "http://campusmarket.ca"];

/// Server settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub frontend_url: String,
    /// Whether `FRONTEND_URL` was set explicitly; switches CORS to an allow-list.
    pub frontend_url_explicit: bool,
    pub resend_api_key: Option<String>,
    pub from_email: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p.trim().parse().with_context(|| format!("invalid PORT '{}'", p))?,
            None => 4001,
        };
        let frontend = var("FRONTEND_URL");

        Ok(Self {
            host: var("CAMPUS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            data_dir: var("CAMPUS_DATA_DIR").unwrap_or_else(|| "./data".into()).into(),
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| PLACEHOLDER_SECRET.into()),
            frontend_url_explicit: frontend.is_some(),
            frontend_url: frontend.unwrap_or_else(|| DEFAULT_FRONTEND_URL.into()),
            resend_api_key: var("RESEND_API_KEY"),
            from_email: var("FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.into()),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("campusmarket.db")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Explicit CORS origins, or `None` for a permissive policy.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        if !self.frontend_url_explicit {
            return None;
        }
        let mut origins = vec![self.frontend_url.trim_end_matches('/').to_string()];
        origins.extend(PRODUCTION_ORIGINS.iter().map(|o| o.to_string()));
        Some(origins)
    }
}
