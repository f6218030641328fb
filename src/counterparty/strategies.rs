use crate::classifier::Direction;
use crate::types::RawTransactionRecord;

/// Parsed SPL transfer instruction types carrying `info.source` / `info.destination`.
const TRANSFER_TYPES: &[&str] = &["transfer", "transferChecked"];

/// Inbound transfers take `info.source`, outbound take `info.destination`.
/// When several transfers qualify the last one wins. The value is used as-is even though it is
/// usually a token account rather than its owning wallet.
pub fn from_transfer_instruction(
    record: &RawTransactionRecord,
    wallet: &str,
    direction: Direction,
) -> Option<String> {
    let field = match direction {
        Direction::In => "source",
        Direction::Out => "destination",
    };
    record
        .instructions()
        .iter()
        .filter(|ix| ix.parsed_type().is_some_and(|t| TRANSFER_TYPES.contains(&t)))
        .filter_map(|ix| ix.info_field(field))
        .rfind(|addr| *addr != wallet)
        .map(str::to_string)
}

/// Owner of the first post-balance token account that belongs to someone else.
/// Both the owner and the raw account key must differ from the wallet, so a
/// wallet sending to its own token account is not picked up here.
pub fn from_token_owner(
    record: &RawTransactionRecord,
    wallet: &str,
    _direction: Direction,
) -> Option<String> {
    let keys = record.account_keys();
    record
        .post_token_balances()?
        .iter()
        .find_map(|balance| {
            let key = keys.get(balance.account_index)?;
            let owner = balance.owner.as_deref()?;
            (owner != wallet && key.pubkey != wallet).then(|| owner.to_string())
        })
}

/// Inbound: the first signer other than the wallet paid for the transfer.
/// Outbound: the first writable account other than the wallet received it.
pub fn from_signer_or_writable(
    record: &RawTransactionRecord,
    wallet: &str,
    direction: Direction,
) -> Option<String> {
    record
        .account_keys()
        .iter()
        .filter(|key| match direction {
            Direction::In => key.signer,
            Direction::Out => key.writable,
        })
        .find(|key| key.pubkey != wallet)
        .map(|key| key.pubkey.clone())
}

/// First account key other than the wallet, so the result is never the wallet itself.
pub fn first_listed_account(
    record: &RawTransactionRecord,
    wallet: &str,
    _direction: Direction,
) -> Option<String> {
    record
        .account_keys()
        .iter()
        .find(|key| key.pubkey != wallet)
        .map(|key| key.pubkey.clone())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::{
        first_listed_account, from_signer_or_writable, from_token_owner,
        from_transfer_instruction,
    };
    use crate::classifier::Direction;
    use crate::types::RawTransactionRecord;

    const WALLET: &str = "WaLLet1111111111111111111111111111111111111";

    fn record(value: serde_json::Value) -> RawTransactionRecord {
        serde_json::from_value(value).unwrap()
    }

    fn transfer_ix(kind: &str, source: &str, destination: &str) -> serde_json::Value {
        serde_json::json!({
            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "parsed": { "type": kind, "info": { "source": source, "destination": destination } }
        })
    }

    #[test]
    fn instruction_strategy_picks_field_by_direction() {
        let rec = record(serde_json::json!({
            "transaction": { "message": { "instructions": [transfer_ix("transfer", "SRC", "DST")] } }
        }));
        assert_eq!(
            from_transfer_instruction(&rec, WALLET, Direction::In).as_deref(),
            Some("SRC")
        );
        assert_eq!(
            from_transfer_instruction(&rec, WALLET, Direction::Out).as_deref(),
            Some("DST")
        );
    }

    #[test]
    fn instruction_strategy_skips_wallet_and_non_transfers() {
        let rec = record(serde_json::json!({
            "transaction": { "message": { "instructions": [
                { "programId": "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr", "parsed": "memo text" },
                { "programId": "11111111111111111111111111111111", "parsed": { "type": "createAccount", "info": { "source": "NOPE" } } },
                transfer_ix("transfer", WALLET, "DST"),
                transfer_ix("transferChecked", "SRC2", "DST2"),
            ] } }
        }));
        assert_eq!(
            from_transfer_instruction(&rec, WALLET, Direction::In).as_deref(),
            Some("SRC2")
        );
    }

    #[test]
    fn instruction_strategy_prefers_the_last_transfer() {
        let rec = record(serde_json::json!({
            "transaction": { "message": { "instructions": [
                transfer_ix("transfer", "FeeSource", "FeeVault"),
                transfer_ix("transfer", "MainSource", "MainDestination"),
                transfer_ix("transfer", WALLET, WALLET),
            ] } }
        }));
        assert_eq!(
            from_transfer_instruction(&rec, WALLET, Direction::In).as_deref(),
            Some("MainSource")
        );
        assert_eq!(
            from_transfer_instruction(&rec, WALLET, Direction::Out).as_deref(),
            Some("MainDestination")
        );
    }

    #[test]
    fn owner_strategy_requires_owner_and_foreign_key() {
        let rec = record(serde_json::json!({
            "meta": {
                "preTokenBalances": [],
                "postTokenBalances": [
                    { "accountIndex": 0, "mint": "M", "uiTokenAmount": { "amount": "1" } },
                    { "accountIndex": 1, "mint": "M", "owner": WALLET, "uiTokenAmount": { "amount": "1" } },
                    { "accountIndex": 0, "mint": "M", "owner": "SelfOwner", "uiTokenAmount": { "amount": "1" } },
                    { "accountIndex": 9, "mint": "M", "owner": "OutOfRange", "uiTokenAmount": { "amount": "1" } },
                    { "accountIndex": 2, "mint": "M", "owner": "Counterparty", "uiTokenAmount": { "amount": "1" } }
                ]
            },
            "transaction": { "message": { "accountKeys": [WALLET, "TokenAcctA", "TokenAcctB"] } }
        }));
        assert_eq!(
            from_token_owner(&rec, WALLET, Direction::In).as_deref(),
            Some("Counterparty")
        );
    }

    #[test]
    fn signer_and_writable_fallbacks() {
        let rec = record(serde_json::json!({
            "transaction": { "message": { "accountKeys": [
                { "pubkey": WALLET, "signer": true, "writable": true },
                { "pubkey": "ReadOnlySigner", "signer": true, "writable": false },
                { "pubkey": "WritableAcct", "signer": false, "writable": true }
            ] } }
        }));
        assert_eq!(
            from_signer_or_writable(&rec, WALLET, Direction::In).as_deref(),
            Some("ReadOnlySigner")
        );
        assert_eq!(
            from_signer_or_writable(&rec, WALLET, Direction::Out).as_deref(),
            Some("WritableAcct")
        );
    }

    #[test]
    fn first_listed_account_skips_wallet() {
        let rec = record(serde_json::json!({
            "transaction": { "message": { "accountKeys": [WALLET, "Program"] } }
        }));
        assert_eq!(
            first_listed_account(&rec, WALLET, Direction::Out).as_deref(),
            Some("Program")
        );
        let only_wallet = record(serde_json::json!({
            "transaction": { "message": { "accountKeys": [WALLET] } }
        }));
        assert!(first_listed_account(&only_wallet, WALLET, Direction::Out).is_none());
    }
}
