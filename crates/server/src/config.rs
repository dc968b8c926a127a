//! Server configuration from the process environment.
//!
//! All ambient configuration is read once at startup into an explicit
//! struct; nothing downstream touches the environment again. The model
//! credential is optional here — its absence only matters (and only
//! surfaces as an extraction error) when extract mode is actually used.

use std::net::SocketAddr;

use thiserror::Error;

use favea_core::{ExtractorConfig, ReaderConfig, RobotsConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

/// Everything the server needs to run, resolved at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub robots: RobotsConfig,
    pub reader: ReaderConfig,
    pub extractor: ExtractorConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("FAVEA_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name: "FAVEA_BIND", value: bind_raw.clone() })?;

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?;

        let mut reader = ReaderConfig::default();
        if let Some(endpoint) = lookup("READER_ENDPOINT") {
            reader.endpoint = endpoint;
        }

        let mut extractor = ExtractorConfig { api_key: lookup("LLM_API_KEY"), ..ExtractorConfig::default() };
        if let Some(endpoint) = lookup("LLM_ENDPOINT") {
            extractor.endpoint = endpoint;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            extractor.model = model;
        }
        if let Some(raw) = lookup("LLM_MAX_TOKENS") {
            extractor.max_tokens = raw
                .parse()
                .map_err(|_| ConfigError::InvalidVar { name: "LLM_MAX_TOKENS", value: raw })?;
        }

        Ok(Self { bind_addr, database_url, robots: RobotsConfig::default(), reader, extractor })
    }
}
