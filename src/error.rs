#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("rate limit exhausted after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("transport failure: {reason}")]
    TransportFailure { reason: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("parse error: {reason}")]
    Parse { reason: String },

    #[error("config error: {reason}")]
    Config { reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Throttling signalled by the node (HTTP 429 or JSON-RPC code 429).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExhausted { .. })
    }

    /// Per-reference failures the scanner skips instead of aborting the run.
    pub fn is_soft(&self) -> bool {
        !matches!(self, Self::InvalidAddress { .. } | Self::Config { .. })
    }
}
