use wasm_bindgen::prelude::*;

use crate::address::validate_address;
use crate::classifier::classify_with_reason;
use crate::counterparty;
use crate::normalize::{self, RecordContext, TransactionRecord};
use crate::types::RawTransactionRecord;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = JSON)]
    fn parse(s: &str) -> JsValue;
}

fn to_js(value: &serde_json::Value) -> JsValue {
    match serde_json::to_string(value) {
        Ok(json_str) => parse(&json_str),
        Err(_) => JsValue::NULL,
    }
}

fn error_result(msg: &str) -> JsValue {
    let obj = serde_json::json!({"error": msg});
    to_js(&obj)
}

/// Structural Solana address check.
#[wasm_bindgen]
pub fn is_valid_address(address: &str) -> bool {
    validate_address(address).is_ok()
}

/// Classify one `getTransaction` (jsonParsed) result for `wallet` and return
/// the normalized record, or `{"skipped": reason}`.
#[wasm_bindgen]
pub fn classify_transaction(wallet: &str, signature: &str, json: &str) -> JsValue {
    if let Err(err) = validate_address(wallet) {
        return error_result(&err.to_string());
    }
    let raw: RawTransactionRecord = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => return error_result(&format!("Invalid transaction JSON: {e}")),
    };

    let classified = match classify_with_reason(&raw, wallet) {
        Ok(c) => c,
        Err(reason) => return to_js(&serde_json::json!({ "skipped": reason.as_ref() })),
    };
    let counterparty = counterparty::resolve(&raw, wallet, classified.direction);
    let record = normalize::normalize(
        &classified,
        &RecordContext {
            signature,
            block_time: raw.block_time.unwrap_or_default(),
            wallet,
            counterparty: &counterparty,
        },
    );
    match serde_json::to_value(&record) {
        Ok(v) => to_js(&v),
        Err(_) => JsValue::NULL,
    }
}

/// Totals for a JSON array of records.
#[wasm_bindgen]
pub fn aggregate_records(json: &str) -> JsValue {
    let records: Vec<TransactionRecord> = match serde_json::from_str(json) {
        Ok(r) => r,
        Err(_) => return error_result("Expected a JSON array of transaction records"),
    };
    match serde_json::to_value(normalize::aggregate(&records)) {
        Ok(v) => to_js(&v),
        Err(_) => JsValue::NULL,
    }
}

/// Parse a record amount; returns `{"value": "<decimal>", "tier": ..}` or null.
#[wasm_bindgen]
pub fn parse_amount(raw: &str) -> JsValue {
    match normalize::parse_amount(raw) {
        Some((value, tier)) => to_js(&serde_json::json!({
            "value": value.to_string(),
            "tier": tier.as_ref(),
        })),
        None => JsValue::NULL,
    }
}
