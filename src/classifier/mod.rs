pub mod stablecoins;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::RawTransactionRecord;

pub use stablecoins::Stablecoin;

/// Decimal scale assumed when a balance entry omits `decimals`.
pub const DEFAULT_DECIMALS: u8 = 6;

/// Transfer direction relative to the queried wallet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTransfer {
    pub coin: Stablecoin,
    pub direction: Direction,
    /// `|post - pre| / 10^decimals`, always positive.
    pub magnitude: Decimal,
    /// `|post - pre|` in the token's smallest unit.
    pub raw_delta: u128,
    pub decimals: u8,
    /// Index of the balance entry the delta was taken from.
    pub account_index: usize,
}

/// Why a transaction produced no classification. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    MissingTokenBalances,
    NoStablecoin,
    MissingPreBalance,
    UnparseableAmount,
    ZeroDelta,
    AmountOutOfRange,
}

pub fn classify(record: &RawTransactionRecord, wallet: &str) -> Option<ClassifiedTransfer> {
    classify_with_reason(record, wallet).ok()
}

/// Scans post balances in list order and classifies on the first allow-listed
/// mint. Later stablecoin entries are never looked at, so a transaction moving
/// two stablecoins reports only the first.
pub fn classify_with_reason(
    record: &RawTransactionRecord,
    wallet: &str,
) -> Result<ClassifiedTransfer, SkipReason> {
    let (Some(pre_balances), Some(post_balances)) =
        (record.pre_token_balances(), record.post_token_balances())
    else {
        return Err(SkipReason::MissingTokenBalances);
    };

    let Some((coin, post)) = post_balances
        .iter()
        .find_map(|b| Stablecoin::from_mint(&b.mint).map(|coin| (coin, b)))
    else {
        return Err(SkipReason::NoStablecoin);
    };

    debug!(
        %coin,
        account_index = post.account_index,
        owner = post.owner.as_deref().unwrap_or("unknown"),
        wallet_owned = post.owner.as_deref() == Some(wallet),
        "stablecoin balance entry found"
    );

    let pre = pre_balances
        .iter()
        .find(|b| b.account_index == post.account_index)
        .ok_or(SkipReason::MissingPreBalance)?;

    let (Some(pre_amount), Some(post_amount)) = (pre.ui_token_amount.raw(), post.ui_token_amount.raw())
    else {
        return Err(SkipReason::UnparseableAmount);
    };
    let decimals = post.ui_token_amount.decimals.unwrap_or(DEFAULT_DECIMALS);

    let delta = post_amount
        .checked_sub(pre_amount)
        .ok_or(SkipReason::AmountOutOfRange)?;
    trace!(pre_amount, post_amount, delta, decimals, "balance delta");

    let direction = match delta.signum() {
        1 => Direction::In,
        -1 => Direction::Out,
        _ => return Err(SkipReason::ZeroDelta),
    };

    let raw_delta = delta.unsigned_abs();
    let magnitude = i128::try_from(raw_delta)
        .ok()
        .and_then(|abs| Decimal::try_from_i128_with_scale(abs, u32::from(decimals)).ok())
        .ok_or(SkipReason::AmountOutOfRange)?
        .normalize();

    Ok(ClassifiedTransfer {
        coin,
        direction,
        magnitude,
        raw_delta,
        decimals,
        account_index: post.account_index,
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use rust_decimal_macros::dec;

    use super::{Direction, SkipReason, Stablecoin, classify, classify_with_reason};
    use crate::classifier::stablecoins::{USDC_MINT, USDT_MINT};
    use crate::types::RawTransactionRecord;

    const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const OTHER_MINT: &str = "So11111111111111111111111111111111111111112";

    fn balance(index: usize, mint: &str, amount: &str, decimals: u8) -> serde_json::Value {
        serde_json::json!({
            "accountIndex": index,
            "mint": mint,
            "owner": "CounterpartyOwner1111111111111111111111111",
            "uiTokenAmount": { "amount": amount, "decimals": decimals }
        })
    }

    fn record(pre: serde_json::Value, post: serde_json::Value) -> RawTransactionRecord {
        serde_json::from_value(serde_json::json!({
            "blockTime": 1_700_000_000,
            "meta": { "preTokenBalances": pre, "postTokenBalances": post },
            "transaction": { "message": { "accountKeys": [WALLET] } }
        }))
        .unwrap()
    }

    #[test]
    fn missing_balance_lists_yield_nothing() {
        let no_meta: RawTransactionRecord = serde_json::from_value(serde_json::json!({
            "transaction": { "message": {} }
        }))
        .unwrap();
        assert_eq!(
            classify_with_reason(&no_meta, WALLET),
            Err(SkipReason::MissingTokenBalances)
        );

        let pre_only: RawTransactionRecord = serde_json::from_value(serde_json::json!({
            "meta": { "preTokenBalances": [] },
            "transaction": { "message": {} }
        }))
        .unwrap();
        assert!(classify(&pre_only, WALLET).is_none());
    }

    #[test]
    fn zero_delta_is_not_a_transfer() {
        for amount in ["0", "1", "1000000", "987654321012"] {
            let rec = record(
                serde_json::json!([balance(0, USDC_MINT, amount, 6)]),
                serde_json::json!([balance(0, USDC_MINT, amount, 6)]),
            );
            assert_eq!(
                classify_with_reason(&rec, WALLET),
                Err(SkipReason::ZeroDelta)
            );
        }
    }

    #[test]
    fn increase_is_inbound_with_scaled_magnitude() {
        let cases: &[(u64, u64, u8)] = &[
            (1_000_000, 3_000_000, 6),
            (0, 1, 6),
            (5, 17, 0),
            (123_456, 123_457, 2),
            (0, 999_999_999_999, 6),
        ];
        for &(pre, post, decimals) in cases {
            let rec = record(
                serde_json::json!([balance(0, USDC_MINT, &pre.to_string(), decimals)]),
                serde_json::json!([balance(0, USDC_MINT, &post.to_string(), decimals)]),
            );
            let transfer = classify(&rec, WALLET).unwrap();
            assert_eq!(transfer.direction, Direction::In);
            let expected = rust_decimal::Decimal::from_i128_with_scale(
                i128::from(post - pre),
                u32::from(decimals),
            );
            assert_eq!(transfer.magnitude, expected, "pre={pre} post={post}");
        }
    }

    #[test]
    fn decrease_is_outbound_with_absolute_magnitude() {
        let rec = record(
            serde_json::json!([balance(1, USDT_MINT, "5000000", 6)]),
            serde_json::json!([balance(1, USDT_MINT, "4600000", 6)]),
        );
        let transfer = classify(&rec, WALLET).unwrap();
        assert_eq!(transfer.coin, Stablecoin::Usdt);
        assert_eq!(transfer.direction, Direction::Out);
        assert_eq!(transfer.magnitude, dec!(0.4));
        assert_eq!(transfer.raw_delta, 400_000);
        assert_eq!(transfer.account_index, 1);
    }

    #[test]
    fn pre_balance_is_matched_by_account_index_not_position() {
        let rec = record(
            serde_json::json!([
                balance(3, USDC_MINT, "900", 6),
                balance(2, USDC_MINT, "100", 6),
            ]),
            serde_json::json!([balance(2, USDC_MINT, "600", 6)]),
        );
        let transfer = classify(&rec, WALLET).unwrap();
        assert_eq!(transfer.raw_delta, 500);
        assert_eq!(transfer.direction, Direction::In);
    }

    #[test]
    fn missing_pre_balance_on_first_match_stops_scan() {
        let rec = record(
            serde_json::json!([balance(1, USDT_MINT, "0", 6)]),
            serde_json::json!([
                balance(0, USDC_MINT, "1000000", 6),
                balance(1, USDT_MINT, "2000000", 6),
            ]),
        );
        assert_eq!(
            classify_with_reason(&rec, WALLET),
            Err(SkipReason::MissingPreBalance)
        );
    }

    #[test]
    fn only_first_stablecoin_entry_is_reported() {
        let rec = record(
            serde_json::json!([
                balance(0, OTHER_MINT, "0", 9),
                balance(1, USDT_MINT, "0", 6),
                balance(2, USDC_MINT, "0", 6),
            ]),
            serde_json::json!([
                balance(0, OTHER_MINT, "5000000000", 9),
                balance(1, USDT_MINT, "7000000", 6),
                balance(2, USDC_MINT, "9000000", 6),
            ]),
        );
        let transfer = classify(&rec, WALLET).unwrap();
        assert_eq!(transfer.coin, Stablecoin::Usdt);
        assert_eq!(transfer.magnitude, dec!(7));
    }

    #[test]
    fn non_stablecoin_mints_are_ignored() {
        let rec = record(
            serde_json::json!([balance(0, OTHER_MINT, "0", 9)]),
            serde_json::json!([balance(0, OTHER_MINT, "10", 9)]),
        );
        assert_eq!(
            classify_with_reason(&rec, WALLET),
            Err(SkipReason::NoStablecoin)
        );
    }

    #[test]
    fn garbage_amounts_are_skipped() {
        let rec = record(
            serde_json::json!([balance(0, USDC_MINT, "1e6", 6)]),
            serde_json::json!([balance(0, USDC_MINT, "2000000", 6)]),
        );
        assert_eq!(
            classify_with_reason(&rec, WALLET),
            Err(SkipReason::UnparseableAmount)
        );
    }

    #[test]
    fn missing_decimals_default_to_six() {
        let rec = record(
            serde_json::json!([{ "accountIndex": 0, "mint": USDC_MINT, "uiTokenAmount": { "amount": "0" } }]),
            serde_json::json!([{ "accountIndex": 0, "mint": USDC_MINT, "uiTokenAmount": { "amount": "2500000" } }]),
        );
        let transfer = classify(&rec, WALLET).unwrap();
        assert_eq!(transfer.decimals, 6);
        assert_eq!(transfer.magnitude, dec!(2.5));
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::ZeroDelta.to_string(), "zero_delta");
        assert_eq!(Direction::In.as_ref(), "in");
        assert_eq!("out".parse::<Direction>().ok(), Some(Direction::Out));
    }
}
