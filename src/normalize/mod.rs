pub mod amount;
pub mod summary;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::classifier::stablecoins::CHAIN;
use crate::classifier::{ClassifiedTransfer, Direction, Stablecoin};

pub use amount::{AMOUNT_SCALE, AmountTier, parse_amount, to_scaled_string};
pub use summary::{Summary, aggregate};

/// Normalized stablecoin transfer handed to reporting consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Block time, seconds since epoch.
    pub timestamp: i64,
    /// Transaction signature, or `summary-<millis>` for folded records.
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Non-negative integer string in units of 10^-6; `direction` carries the sign.
    pub amount: String,
    pub direction: Direction,
    /// UTC calendar date, `YYYY-MM-DD`.
    pub formatted_date: String,
    pub coin: Stablecoin,
    pub chain: String,
    /// Constituents of a folded summary record. Never `Some(vec![])`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_transactions: Option<Vec<TransactionRecord>>,
}

impl TransactionRecord {
    pub fn is_summary(&self) -> bool {
        self.all_transactions.is_some()
    }
}

/// Per-transaction facts the classifier does not carry.
pub struct RecordContext<'a> {
    pub signature: &'a str,
    pub block_time: i64,
    pub wallet: &'a str,
    pub counterparty: &'a str,
}

pub fn normalize(classified: &ClassifiedTransfer, ctx: &RecordContext<'_>) -> TransactionRecord {
    let (from, to) = match classified.direction {
        Direction::In => (ctx.counterparty, ctx.wallet),
        Direction::Out => (ctx.wallet, ctx.counterparty),
    };
    TransactionRecord {
        timestamp: ctx.block_time,
        hash: ctx.signature.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        amount: to_scaled_string(classified.magnitude),
        direction: classified.direction,
        formatted_date: format_date(ctx.block_time),
        coin: classified.coin,
        chain: CHAIN.to_string(),
        all_transactions: None,
    }
}

pub fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Newest first; records with equal timestamps keep their relative order.
pub fn sort_by_recency(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Folds `records` into one synthetic record carrying them as constituents.
/// Nested summary records are flattened so constituents are always plain
/// transfers. Returns `None` when there is nothing to fold.
pub fn fold_into_summary_record(
    records: &[TransactionRecord],
    now: DateTime<Utc>,
) -> Option<TransactionRecord> {
    let constituents: Vec<TransactionRecord> = records
        .iter()
        .flat_map(|r| match &r.all_transactions {
            Some(inner) => inner.clone(),
            None => vec![r.clone()],
        })
        .collect();
    let first = constituents.first()?;

    let net = aggregate(&constituents).net_amount;
    let direction = if net >= Decimal::ZERO {
        Direction::In
    } else {
        Direction::Out
    };

    Some(TransactionRecord {
        timestamp: now.timestamp(),
        hash: format!("summary-{}", now.timestamp_millis()),
        from: first.from.clone(),
        to: first.to.clone(),
        amount: to_scaled_string(net.abs()),
        direction,
        formatted_date: now.format("%Y-%m-%d").to_string(),
        coin: first.coin,
        chain: first.chain.clone(),
        all_transactions: Some(constituents),
    })
}
