// src/config.rs
use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    /// Reads configuration from the process environment. Call `dotenvy::dotenv()` first
    /// so a local `.env` file is honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let host = match get("HOST") {
            Some(h) => h
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "HOST", value: h })?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match get("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value: p })?,
            None => 3000,
        };
        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(n) => n
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", value: n })?,
            None => 10,
        };
        let cors_allowed_origin = get("CORS_ALLOWED_ORIGIN").filter(|o| !o.trim().is_empty());

        Ok(Self {
            database_url,
            jwt_secret,
            host,
            port,
            db_max_connections,
            cors_allowed_origin,
        })
    }
}
