use std::path::PathBuf;

use anyhow::{bail, Context};

use crate::session::SessionConfig;

const MIN_SECRET_LEN: usize = 32;

/// Process configuration read from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub enable_hsts: bool,
    /// Snapshot directory for the in-memory store.
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
}

fn flag_env(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().ok().with_context(|| format!("{name} has an invalid value: {v:?}")),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let session_secret = std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?;
        if session_secret.len() < MIN_SECRET_LEN {
            bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} characters long");
        }
        let session_ttl_hours: i64 = parse_env("SESSION_TTL_HOURS", 24 * 30)?;
        if !(1..=24 * 365 * 10).contains(&session_ttl_hours) {
            bail!("SESSION_TTL_HOURS must be between 1 and 87600");
        }
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_env("PORT", 8080)?,
            session_secret,
            session_ttl_hours,
            cookie_secure: flag_env("COOKIE_SECURE"),
            enable_hsts: flag_env("ENABLE_HSTS"),
            data_dir: std::env::var("IDEABOARD_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("data")),
            database_url: std::env::var("DATABASE_URL").ok(),
        })
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig::new(self.session_secret.clone(), self.session_ttl_hours, self.cookie_secure)
    }
}
