use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::transport::{Pause, RpcClient, RpcTransport, Sleeper};
use crate::types::{RawTransactionRecord, SignatureRef};

pub const GET_TRANSACTION: &str = "getTransaction";
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Voluntary pauses between detail calls, independent of backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingPolicy {
    pub batch_min_ms: u64,
    pub batch_max_ms: u64,
    pub item_min_ms: u64,
    pub item_max_ms: u64,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            batch_min_ms: 1_000,
            batch_max_ms: 2_000,
            item_min_ms: 1_500,
            item_max_ms: 3_000,
        }
    }
}

fn uniform(min_ms: u64, max_ms: u64) -> Duration {
    let ms = if max_ms > min_ms {
        rand::thread_rng().gen_range(min_ms..max_ms)
    } else {
        min_ms
    };
    Duration::from_millis(ms)
}

impl PacingPolicy {
    pub fn none() -> Self {
        Self {
            batch_min_ms: 0,
            batch_max_ms: 0,
            item_min_ms: 0,
            item_max_ms: 0,
        }
    }

    pub fn batch_delay(&self) -> Duration {
        uniform(self.batch_min_ms, self.batch_max_ms)
    }

    pub fn item_delay(&self) -> Duration {
        uniform(self.item_min_ms, self.item_max_ms)
    }
}

/// Result of fetching one signature's details.
#[derive(Debug)]
pub struct FetchOutcome {
    pub signature: SignatureRef,
    pub result: Result<RawTransactionRecord>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub async fn fetch_one<T: RpcTransport, S: Sleeper>(
    client: &RpcClient<T, S>,
    signature: &str,
) -> Result<RawTransactionRecord> {
    let result = client
        .call(
            GET_TRANSACTION,
            json!([
                signature,
                { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
            ]),
        )
        .await?;

    if let Value::Null = result {
        return Err(Error::Parse {
            reason: format!("transaction not found: {signature}"),
        });
    }
    Ok(serde_json::from_value(result)?)
}

/// Fetches every reference in order, `batch_size` at a time. Failures are
/// kept in the outcome and never stop the batch.
pub async fn fetch_batch<T: RpcTransport, S: Sleeper>(
    client: &RpcClient<T, S>,
    refs: &[SignatureRef],
    batch_size: usize,
    pacing: &PacingPolicy,
) -> Vec<FetchOutcome> {
    let batch_size = batch_size.max(1);
    let batches = refs.len().div_ceil(batch_size);
    let mut outcomes = Vec::with_capacity(refs.len());

    for (index, batch) in refs.chunks(batch_size).enumerate() {
        let delay = pacing.batch_delay();
        debug!(batch = index + 1, batches, size = batch.len(), delay_ms = delay.as_millis() as u64, "starting batch");
        client.sleeper().pause(Pause::Batch { delay }).await;

        for reference in batch {
            client
                .sleeper()
                .pause(Pause::Item {
                    delay: pacing.item_delay(),
                })
                .await;

            let result = fetch_one(client, &reference.signature).await;
            match &result {
                Ok(record) => debug!(signature = reference.short(), slot = ?record.slot, "transaction fetched"),
                Err(err) => warn!(signature = reference.short(), error = %err, "skipping transaction"),
            }
            outcomes.push(FetchOutcome {
                signature: reference.clone(),
                result,
            });
        }
    }

    let fetched = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(requested = refs.len(), fetched, failed = refs.len() - fetched, "detail fetch finished");
    outcomes
}
