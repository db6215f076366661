//! # Configuration Module
//!
//! This module defines the bot configuration: credentials, recognition API
//! settings, transport selection and log format. Everything is read once at
//! startup and injected into the components that need it.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Url;

use crate::credentials::{Credential, CredentialSource};
use crate::errors::ConfigError;

// Constants for bot configuration
pub const DEFAULT_RECOGNITION_BASE_URL: &str = "https://api.cloudmersive.com";
pub const DEFAULT_RECOGNITION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_WEBHOOK_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_WEBHOOK_PORT: u16 = 5000;
pub const TELEGRAM_FILE_TIMEOUT_SECS: u64 = 60;

pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const RECOGNITION_API_KEY_VAR: &str = "CLOUDMERSIVE_API_KEY";

/// Settings of the outbound image recognition call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Base URL of the recognition API, without trailing path
    pub base_url: String,
    /// Timeout for one describe request in seconds
    pub timeout_secs: u64,
}

impl RecognitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RECOGNITION_BASE_URL.to_string(),
            timeout_secs: DEFAULT_RECOGNITION_TIMEOUT_SECS, // 30 seconds
        }
    }
}

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMode {
    /// Telegram pushes updates to `<public_url>/<token>`, served on `bind_address:port`
    Webhook {
        bind_address: IpAddr,
        port: u16,
        public_url: Url,
    },
    /// The bot long-polls `getUpdates`
    Polling,
}

impl TransportMode {
    pub fn name(&self) -> &'static str {
        match self {
            TransportMode::Webhook { .. } => "webhook",
            TransportMode::Polling => "polling",
        }
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl LogFormat {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") => Ok(LogFormat::Plain),
            Some(v) if v.eq_ignore_ascii_case("plain") => Ok(LogFormat::Plain),
            Some(v) if v.eq_ignore_ascii_case("json") => Ok(LogFormat::Json),
            Some(other) => Err(ConfigError::Invalid {
                variable: "LOG_FORMAT",
                value: other.to_string(),
                reason: "expected `plain` or `json`".to_string(),
            }),
        }
    }
}

/// Complete configuration of the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: Credential,
    pub recognition_api_key: Credential,
    pub recognition: RecognitionConfig,
    pub transport: TransportMode,
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_token =
            CredentialSource::from_lookup(TELEGRAM_TOKEN_VAR, &lookup).load_with(&lookup)?;
        let recognition_api_key =
            CredentialSource::from_lookup(RECOGNITION_API_KEY_VAR, &lookup).load_with(&lookup)?;

        let recognition = RecognitionConfig {
            base_url: non_blank(lookup("CLOUDMERSIVE_BASE_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_RECOGNITION_BASE_URL.to_string()),
            timeout_secs: match non_blank(lookup("RECOGNITION_TIMEOUT_SECS")) {
                Some(raw) => parse_timeout(&raw)?,
                None => DEFAULT_RECOGNITION_TIMEOUT_SECS,
            },
        };

        Ok(Self {
            telegram_token,
            recognition_api_key,
            recognition,
            transport: parse_transport(&lookup)?,
            log_format: LogFormat::from_lookup(&lookup)?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        Ok(_) => Err(ConfigError::Invalid {
            variable: "RECOGNITION_TIMEOUT_SECS",
            value: raw.to_string(),
            reason: "timeout must be positive".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            variable: "RECOGNITION_TIMEOUT_SECS",
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_transport<F>(lookup: &F) -> Result<TransportMode, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mode = non_blank(lookup("BOT_TRANSPORT")).unwrap_or_else(|| "polling".to_string());

    if mode.eq_ignore_ascii_case("polling") {
        return Ok(TransportMode::Polling);
    }
    if !mode.eq_ignore_ascii_case("webhook") {
        return Err(ConfigError::Invalid {
            variable: "BOT_TRANSPORT",
            value: mode,
            reason: "expected `polling` or `webhook`".to_string(),
        });
    }

    let raw_url = non_blank(lookup("WEBHOOK_PUBLIC_URL")).ok_or(ConfigError::Missing {
        variable: "WEBHOOK_PUBLIC_URL",
        reason: "BOT_TRANSPORT=webhook",
    })?;
    let public_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
        variable: "WEBHOOK_PUBLIC_URL",
        value: raw_url.clone(),
        reason: e.to_string(),
    })?;

    let raw_address = non_blank(lookup("WEBHOOK_BIND_ADDRESS"))
        .unwrap_or_else(|| DEFAULT_WEBHOOK_BIND_ADDRESS.to_string());
    let bind_address = raw_address
        .parse::<IpAddr>()
        .map_err(|e| ConfigError::Invalid {
            variable: "WEBHOOK_BIND_ADDRESS",
            value: raw_address.clone(),
            reason: e.to_string(),
        })?;

    let port = match non_blank(lookup("TELEGRAM_WEBHOOK_PORT")) {
        Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
            variable: "TELEGRAM_WEBHOOK_PORT",
            value: raw.clone(),
            reason: e.to_string(),
        })?,
        None => DEFAULT_WEBHOOK_PORT,
    };

    Ok(TransportMode::Webhook {
        bind_address,
        port,
        public_url,
    })
}
