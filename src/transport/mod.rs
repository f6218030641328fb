pub mod backoff;
pub mod http;
pub mod rate_limit;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub use backoff::BackoffPolicy;
pub use http::HttpTransport;
pub use rate_limit::RateLimitTelemetry;

pub const JSONRPC_VERSION: &str = "2.0";
pub const THROTTLED_CODE: i64 = 429;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

/// One raw attempt as seen on the wire.
#[derive(Debug, Clone)]
pub struct RpcReply {
    pub status: u16,
    pub headers: HeaderMap,
    /// Parsed JSON, or `Value::String` holding the raw text when the body was
    /// not JSON.
    pub body: Value,
}

impl RpcReply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body,
        }
    }
}

/// Performs exactly one request. Retrying is the client's job.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send(&self, request: &RpcRequest) -> Result<RpcReply>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Backoff { attempt: u32, delay: Duration },
    Batch { delay: Duration },
    Item { delay: Duration },
}

impl Pause {
    pub fn delay(&self) -> Duration {
        match self {
            Self::Backoff { delay, .. } | Self::Batch { delay } | Self::Item { delay } => *delay,
        }
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn pause(&self, pause: Pause);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn pause(&self, pause: Pause) {
        tokio::time::sleep(pause.delay()).await;
    }
}

/// What a single reply means for the retry loop.
enum Verdict {
    Done(Value),
    Throttled,
    Failed(String),
    Definitive(Error),
}

fn judge(reply: &RpcReply) -> Verdict {
    if reply.status == 429 {
        return Verdict::Throttled;
    }
    let Some(body) = reply.body.as_object() else {
        return Verdict::Failed(format!(
            "http {}: non-json body {}",
            reply.status,
            preview(&reply.body)
        ));
    };

    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        if code == THROTTLED_CODE {
            return Verdict::Throttled;
        }
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown rpc error")
            .to_string();
        return Verdict::Definitive(Error::Rpc { code, message });
    }

    if !(200..300).contains(&reply.status) {
        return Verdict::Failed(format!("http {}", reply.status));
    }

    match body.get("result") {
        Some(result) => Verdict::Done(result.clone()),
        None => Verdict::Failed("response has neither result nor error".to_string()),
    }
}

fn preview(body: &Value) -> String {
    let text = match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.chars().take(120).collect()
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// JSON-RPC client that retries throttled and failed attempts on the backoff
/// schedule.
pub struct RpcClient<T, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    policy: BackoffPolicy,
    next_id: AtomicU64,
}

impl<T: RpcTransport> RpcClient<T, TokioSleeper> {
    pub fn with_transport(transport: T, policy: BackoffPolicy) -> Self {
        Self::new(transport, TokioSleeper, policy)
    }
}

impl<T: RpcTransport, S: Sleeper> RpcClient<T, S> {
    pub fn new(transport: T, sleeper: S, policy: BackoffPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Returns the `result` member; `null` results are passed through.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: method.to_string(),
            params,
        };
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(method, id = request.id, attempt, "rpc call");

            let verdict = match self.transport.send(&request).await {
                Ok(reply) => {
                    let telemetry = RateLimitTelemetry::from_headers(&reply.headers);
                    telemetry.log_usage(method, reply.status);
                    let verdict = judge(&reply);
                    if matches!(verdict, Verdict::Throttled) {
                        telemetry.log_throttled(method, reply.status, now_unix());
                    }
                    verdict
                }
                Err(err) => Verdict::Failed(err.to_string()),
            };

            let last_failure = match verdict {
                Verdict::Done(result) => return Ok(result),
                Verdict::Definitive(err) => return Err(err),
                Verdict::Throttled => None,
                Verdict::Failed(reason) => Some(reason),
            };

            if attempt >= max_attempts {
                return Err(match last_failure {
                    None => Error::RateLimitExhausted { attempts: attempt },
                    Some(reason) => Error::TransportFailure { reason },
                });
            }

            let delay = self
                .policy
                .with_jitter(attempt, self.policy.random_jitter_ms());
            warn!(
                method,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                throttled = last_failure.is_none(),
                reason = last_failure.as_deref().unwrap_or("throttled"),
                "retrying rpc call"
            );
            self.sleeper.pause(Pause::Backoff { attempt, delay }).await;
        }
    }
}
