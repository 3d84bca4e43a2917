use anyhow::{Context, Result};
use std::env;

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: env::var("DATABASE_HOST").context("DATABASE_HOST is not set")?,
            port: env::var("DATABASE_PORT")
                .context("DATABASE_PORT is not set")?
                .parse()
                .context("DATABASE_PORT must be a port number")?,
            username: env::var("DATABASE_USERNAME").context("DATABASE_USERNAME is not set")?,
            password: env::var("DATABASE_PASSWORD").context("DATABASE_PASSWORD is not set")?,
            database: env::var("DATABASE_NAME").context("DATABASE_NAME is not set")?,
        };
        let redis = RedisConfig {
            host: env::var("REDIS_HOST").context("REDIS_HOST is not set")?,
            port: env::var("REDIS_PORT")
                .context("REDIS_PORT is not set")?
                .parse()
                .context("REDIS_PORT must be a port number")?,
        };
        let auth = AuthConfig {
            ttl: env::var("AUTH_TOKEN_TTL")
                .context("AUTH_TOKEN_TTL is not set")?
                .parse()
                .context("AUTH_TOKEN_TTL must be a number of seconds")?,
        };
        let admin = AdminConfig {
            email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into()),
            password: env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?,
        };
        let server = ServerConfig {
            port: match env::var("PORT") {
                Ok(port) => port.parse().context("PORT must be a port number")?,
                Err(_) => 8080,
            },
        };
        Ok(Self {
            database,
            redis,
            auth,
            admin,
            server,
        })
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

pub struct AuthConfig {
    /// Lifetime of an access token in seconds.
    pub ttl: u64,
}

/// Account ensured at startup so a fresh deployment has an administrator.
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

pub struct ServerConfig {
    pub port: u16,
}
