pub mod strategies;

use tracing::debug;

use crate::classifier::Direction;
use crate::types::RawTransactionRecord;

/// Returned when no strategy finds an address other than the wallet.
pub const UNKNOWN_COUNTERPARTY: &str = "unknown";

pub type Strategy = fn(&RawTransactionRecord, &str, Direction) -> Option<String>;

/// Resolution order; the first strategy returning `Some` wins.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("transfer_instruction", strategies::from_transfer_instruction),
    ("token_owner", strategies::from_token_owner),
    ("signer_or_writable", strategies::from_signer_or_writable),
    ("first_listed_account", strategies::first_listed_account),
];

/// Counterparty of a classified transfer. Never fails, but the later
/// strategies are heuristics and can be wrong on multi-party transactions.
pub fn resolve(record: &RawTransactionRecord, wallet: &str, direction: Direction) -> String {
    for (name, strategy) in STRATEGIES {
        if let Some(address) = strategy(record, wallet, direction) {
            debug!(strategy = name, %direction, counterparty = %address, "counterparty resolved");
            return address;
        }
    }
    debug!(%direction, "no counterparty strategy matched");
    UNKNOWN_COUNTERPARTY.to_string()
}
