//! Runtime configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first when
//! present.  Every setting has a default, so the server starts with
//! no configuration at all.

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use crate::rules::DEFAULT_RULE_SET;

#[derive(Debug, Clone)]
pub struct Config {
    /// `PAYROLL_BIND_ADDR`, default `127.0.0.1:3000`.
    pub bind_addr: SocketAddr,
    /// `PAYROLL_RULES_DIR`, default `rules`.
    pub rules_dir: PathBuf,
    /// `PAYROLL_DEFAULT_RULE_SET`, default `KR-2024`.
    pub default_rule_set: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("PAYROLL_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("`PAYROLL_BIND_ADDR` is not a socket address: {bind_addr}"))?;

        let rules_dir = PathBuf::from(lookup("PAYROLL_RULES_DIR").unwrap_or_else(|| "rules".to_string()));
        let default_rule_set =
            lookup("PAYROLL_DEFAULT_RULE_SET").unwrap_or_else(|| DEFAULT_RULE_SET.to_string());

        let config = Config {
            bind_addr,
            rules_dir,
            default_rule_set,
        };
        info!(?config, "configuration loaded");
        Ok(config)
    }
}
