use std::env;
use std::num::ParseIntError;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// `None` when `MAIL_ADDRESS` or `MAIL_PASSWORD` is unset.
    pub mail: Option<MailSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub address: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid SMTP_PORT {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("SMTP_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_SMTP_PORT,
        };

        let mail = match (var("MAIL_ADDRESS"), var("MAIL_PASSWORD")) {
            (Some(address), Some(password)) => Some(MailSettings {
                address,
                password,
                host: var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port,
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            mail,
        })
    }
}
