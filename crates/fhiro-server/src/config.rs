use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub admin_emails: Vec<String>,
    pub export_prefix: String,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Read the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = var("FHIRO_JWT_SECRET", "");
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FHIRO_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("FHIRO_HOST", "0.0.0.0");
        let port: u16 = var("FHIRO_PORT", "3000")
            .parse()
            .context("FHIRO_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            addr,
            db_path: var("FHIRO_DB_PATH", "fhiro.db").into(),
            jwt_secret,
            admin_emails: parse_admin_emails(&var("FHIRO_ADMIN_EMAILS", "")),
            export_prefix: var("FHIRO_EXPORT_PREFIX", "fhiro"),
            cors_origin: lookup("FHIRO_CORS_ORIGIN").filter(|o| !o.trim().is_empty()),
        })
    }

    /// Allow-list entries that no signed-in identity can ever match, since
    /// identities are stored trimmed and lower-cased.
    pub fn unreachable_admins(&self) -> Vec<&str> {
        self.admin_emails
            .iter()
            .filter(|e| e.to_lowercase() != **e)
            .map(String::as_str)
            .collect()
    }
}

/// Comma-separated list; entries are trimmed, blanks dropped.
pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}
