//! CLI module for the fetch cache
//!
//! Provides subcommands:
//! - `fetch`: run one fetch with a chosen strategy and print every outcome
//! - `purge`: remove a cached entry from both tiers

pub mod fetch;
pub mod purge;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::config::AppConfig;
use crate::domain::cache::RequestParams;
use crate::domain::transport::{Endpoint, HttpMethod};
use crate::infrastructure::logging;

/// PMP Fetch Cache - tiered response cache with fetch strategies
#[derive(Parser)]
#[command(name = "pmp-fetch-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch an endpoint through the cache
    Fetch(fetch::FetchArgs),

    /// Remove the cached entry for an endpoint
    Purge(purge::PurgeArgs),
}

/// Request identity shared by the subcommands
#[derive(Args, Clone, Debug)]
pub struct RequestArgs {
    /// Endpoint URL, absolute or relative to the configured base URL
    pub endpoint: String,

    /// HTTP method; GET sends parameters as query string, POST as JSON body
    #[arg(long, short = 'X', value_name = "METHOD", default_value = "GET")]
    pub method: HttpMethod,

    /// Request parameter as name=value; values that parse as JSON are sent as JSON
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, Value)>,

    /// Cache namespace (overrides config)
    #[arg(long)]
    pub namespace: Option<String>,
}

impl RequestArgs {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.method, &self.endpoint)
    }

    pub fn request_params(&self) -> RequestParams {
        self.params.iter().cloned().collect()
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(namespace) = &self.namespace {
            config.cache.namespace = namespace.clone();
        }
    }
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter '{}': expected NAME=VALUE", raw))?;

    if name.is_empty() {
        return Err(format!("Invalid parameter '{}': empty name", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// Loads configuration and installs logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load_or_env()?;
    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    })?;

    Ok(config)
}
