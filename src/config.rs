use std::net::SocketAddr;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_STORAGE_URL: &str = "sqlite://todogo.db";
pub const DEFAULT_USER_ID: &str = "local-user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind { Api, Local }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub bind_addr: SocketAddr,
    pub storage_url: String,
    pub backend: BackendKind,
    pub local_user_id: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string());

        let bind = get("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind.parse::<SocketAddr>().with_context(|| format!("invalid BIND_ADDR {bind:?}"))?;
        let backend = match get("TODO_BACKEND", "api").as_str() {
            "api" => BackendKind::Api,
            "local" => BackendKind::Local,
            other => bail!("invalid TODO_BACKEND {other:?}, expected \"api\" or \"local\""),
        };

        Ok(Self {
            api_base_url: get("API_BASE_URL", DEFAULT_API_BASE_URL),
            bind_addr,
            storage_url: get("STORAGE_URL", DEFAULT_STORAGE_URL),
            backend,
            local_user_id: get("TODO_USER_ID", DEFAULT_USER_ID),
        })
    }
}
