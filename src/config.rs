use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://coursehub.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Where the caller's identity comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityMode {
    /// Trust the `x-user-id` header set by a gateway in front of the service.
    TrustedHeader,
    /// Ask an external session endpoint, giving up after `timeout`.
    Http { session_url: String, timeout: Duration },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub identity: IdentityMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_addr.clone(),
        })?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DB_MAX_CONNECTIONS",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let identity = match lookup("IDENTITY_MODE").as_deref() {
            None | Some("header") => IdentityMode::TrustedHeader,
            Some("http") => IdentityMode::Http {
                session_url: lookup("IDENTITY_SESSION_URL")
                    .ok_or(ConfigError::Missing("IDENTITY_SESSION_URL"))?,
                timeout: identity_timeout(&lookup)?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "IDENTITY_MODE",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            identity,
        })
    }
}

fn identity_timeout<F>(lookup: &F) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("IDENTITY_TIMEOUT_MS") {
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(ConfigError::Invalid {
                name: "IDENTITY_TIMEOUT_MS",
                value: raw,
            }),
        },
        None => Ok(Duration::from_millis(DEFAULT_IDENTITY_TIMEOUT_MS)),
    }
}
