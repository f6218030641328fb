use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fetcher::{DEFAULT_BATCH_SIZE, PacingPolicy};
use crate::logging::LogConfig;
use crate::transport::BackoffPolicy;

pub const ENV_RPC_URL: &str = "SOLANA_RPC_URL";
pub const ENV_ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
pub const ENV_LIMIT: &str = "SCAN_LIMIT";
pub const ENV_BATCH_SIZE: &str = "SCAN_BATCH_SIZE";
pub const ENV_LOG_LEVEL: &str = "SCAN_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SCAN_LOG_FORMAT";

pub const DEFAULT_API_KEY: &str = "demo";
pub const DEFAULT_LIMIT: usize = 50;
const ALCHEMY_BASE_URL: &str = "https://solana-mainnet.g.alchemy.com/v2/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub rpc_url: String,
    /// Signatures to process per scan.
    pub limit: usize,
    pub batch_size: usize,
    pub request_timeout_ms: u64,
    pub backoff: BackoffPolicy,
    pub pacing: PacingPolicy,
    pub log: LogConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rpc_url: alchemy_url(DEFAULT_API_KEY),
            limit: DEFAULT_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_ms: 30_000,
            backoff: BackoffPolicy::default(),
            pacing: PacingPolicy::default(),
            log: LogConfig::default(),
        }
    }
}

pub fn alchemy_url(api_key: &str) -> String {
    format!("{ALCHEMY_BASE_URL}{api_key}")
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    raw.filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| Error::Config {
                reason: format!("{name}={v}: {e}"),
            })
        })
        .transpose()
}

impl ScannerConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        match lookup(ENV_RPC_URL).filter(|v| !v.trim().is_empty()) {
            Some(url) => config.rpc_url = url.trim().to_string(),
            None => {
                let key = lookup(ENV_ALCHEMY_API_KEY)
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_API_KEY.to_string());
                config.rpc_url = alchemy_url(key.trim());
            }
        }
        if let Some(limit) = parse_var(ENV_LIMIT, lookup(ENV_LIMIT))? {
            config.limit = limit;
        }
        if let Some(batch_size) = parse_var(ENV_BATCH_SIZE, lookup(ENV_BATCH_SIZE))? {
            config.batch_size = batch_size;
        }
        if let Some(level) = parse_var(ENV_LOG_LEVEL, lookup(ENV_LOG_LEVEL))? {
            config.log.level = level;
        }
        if let Some(format) = parse_var(ENV_LOG_FORMAT, lookup(ENV_LOG_FORMAT))? {
            config.log.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(Error::Config {
                reason: reason.to_string(),
            })
        };
        if self.rpc_url.is_empty() {
            return fail("rpc_url is empty");
        }
        if self.limit == 0 {
            return fail("limit must be at least 1");
        }
        if self.backoff.base_delay_ms == 0 {
            return fail("backoff base delay must be positive");
        }
        if self.backoff.max_delay_ms < self.backoff.base_delay_ms {
            return fail("backoff max delay is below the base delay");
        }
        if self.pacing.batch_max_ms < self.pacing.batch_min_ms {
            return fail("batch pacing range is inverted");
        }
        if self.pacing.item_max_ms < self.pacing.item_min_ms {
            return fail("item pacing range is inverted");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `rpc_url` safe for logs: a path-embedded API key keeps its first four
    /// characters.
    pub fn redacted_rpc_url(&self) -> String {
        redact_url(&self.rpc_url)
    }
}

fn redact_url(url: &str) -> String {
    let Some(key) = url.strip_prefix(ALCHEMY_BASE_URL) else {
        return url.to_string();
    };
    let visible: String = key.chars().take(4).collect();
    if visible.len() == key.len() {
        return url.to_string();
    }
    format!("{ALCHEMY_BASE_URL}{visible}****")
}
