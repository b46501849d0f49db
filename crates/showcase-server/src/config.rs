use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Sample `.env` values; startup refuses them.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("SHOWCASE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SHOWCASE_JWT_SECRET is unset or still a placeholder; it must match the sign-in front-end's secret");
        }

        let db_path = lookup("SHOWCASE_DB_PATH").unwrap_or_else(|| "showcase.db".into());
        let host = lookup("SHOWCASE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("SHOWCASE_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("SHOWCASE_PORT '{}' is not a valid port", raw))?,
            None => 3000,
        };

        Ok(Self {
            jwt_secret,
            db_path: PathBuf::from(db_path),
            host,
            port,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
