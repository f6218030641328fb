use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::Direction;
use crate::normalize::TransactionRecord;
use crate::normalize::amount::parse_amount;

/// Directional totals in human units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub net_amount: Decimal,
}

/// Recomputes the totals from scratch. Records whose amount cannot be parsed
/// are left out of the totals.
pub fn aggregate(records: &[TransactionRecord]) -> Summary {
    let mut total_in = Decimal::ZERO;
    let mut total_out = Decimal::ZERO;

    for record in records {
        let Some((amount, tier)) = parse_amount(&record.amount) else {
            warn!(hash = %record.hash, amount = %record.amount, "unparseable amount left out of summary");
            continue;
        };
        debug!(hash = %record.hash, %tier, %amount, direction = %record.direction, "summing record");
        match record.direction {
            Direction::In => total_in = total_in.saturating_add(amount),
            Direction::Out => total_out = total_out.saturating_add(amount),
        }
    }

    Summary {
        total_in: total_in.normalize(),
        total_out: total_out.normalize(),
        net_amount: total_in.saturating_sub(total_out).normalize(),
    }
}
