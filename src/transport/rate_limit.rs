use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};

pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Below this share of remaining quota a warning is logged.
pub const LOW_QUOTA_RATIO: f64 = 0.2;

/// Rate-limit headers of one response. Purely informational: nothing here
/// changes retry behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimitTelemetry {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    /// Unix timestamp (seconds) at which the window resets.
    pub reset: Option<i64>,
    /// Seconds the server asks us to wait.
    pub retry_after: Option<u64>,
}

fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

impl RateLimitTelemetry {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: header(headers, HEADER_LIMIT),
            remaining: header(headers, HEADER_REMAINING),
            reset: header(headers, HEADER_RESET),
            retry_after: header(headers, HEADER_RETRY_AFTER),
        }
    }

    pub fn is_present(&self) -> bool {
        self.limit.is_some() || self.remaining.is_some() || self.reset.is_some()
    }

    pub fn remaining_ratio(&self) -> Option<f64> {
        match (self.limit, self.remaining) {
            (Some(limit), Some(remaining)) if limit > 0 => Some(remaining as f64 / limit as f64),
            _ => None,
        }
    }

    pub fn is_low_quota(&self) -> bool {
        self.remaining_ratio()
            .is_some_and(|ratio| ratio < LOW_QUOTA_RATIO)
    }

    /// `(used, used_percent)` of the current window.
    pub fn usage(&self) -> Option<(u64, f64)> {
        let limit = self.limit.filter(|l| *l > 0)?;
        let used = limit.saturating_sub(self.remaining?);
        Some((used, used as f64 / limit as f64 * 100.0))
    }

    pub fn seconds_until_reset(&self, now_unix: i64) -> Option<i64> {
        self.reset.map(|reset| reset - now_unix)
    }

    /// Logged for every response that carries rate-limit headers.
    pub fn log_usage(&self, method: &str, status: u16) {
        if !self.is_present() {
            return;
        }
        debug!(
            method,
            status,
            limit = ?self.limit,
            remaining = ?self.remaining,
            reset = ?self.reset,
            retry_after = ?self.retry_after,
            "rate limit headers"
        );
        if self.is_low_quota() {
            let remaining_percent = self.remaining_ratio().unwrap_or_default() * 100.0;
            warn!(
                method,
                remaining_percent = format!("{remaining_percent:.1}"),
                "rpc quota nearly exhausted"
            );
        }
    }

    /// Logged when a response signals throttling.
    pub fn log_throttled(&self, method: &str, status: u16, now_unix: i64) {
        warn!(
            method,
            status,
            limit = ?self.limit,
            remaining = ?self.remaining,
            reset = ?self.reset,
            retry_after = ?self.retry_after,
            "rpc call throttled"
        );

        match (self.seconds_until_reset(now_unix), self.retry_after) {
            (Some(wait), _) if wait > 0 => info!(method, wait_secs = wait, "rate limit window resets soon"),
            (Some(_), _) => warn!(method, "rate limit window should have reset but calls are still throttled"),
            (None, Some(secs)) => info!(method, retry_after_secs = secs, "server requested retry-after"),
            (None, None) => debug!(method, "no reset hint, relying on exponential backoff"),
        }

        if let (Some((used, percent)), Some(limit)) = (self.usage(), self.limit) {
            info!(method, used, limit, used_percent = format!("{percent:.1}"), "rate limit usage");
        }
    }
}
