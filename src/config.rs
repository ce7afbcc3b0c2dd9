use std::{env, net::SocketAddr};

use anyhow::Context;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration, read once at startup. `JWT_SECRET` is not part of
/// this struct: token code reads it at the point of use, so the migrate and
/// seed binaries run without it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// `DATABASE_URL` is required; `APP_HOST` and `APP_PORT` fall back to a
    /// local development default.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        Ok(Self {
            database_url,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .host
            .parse::<std::net::IpAddr>()
            .with_context(|| format!("invalid APP_HOST: {}", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}
