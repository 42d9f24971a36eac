use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("MESSENGER_DB_PATH").unwrap_or_else(|| "messenger.db".into());
        let host = lookup("MESSENGER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("MESSENGER_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("MESSENGER_PORT must be a port number")?;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            db_path: PathBuf::from(db_path),
            addr,
        })
    }
}
