use serde_json::{Value, json};
use tracing::{debug, info};

use crate::address::validate_address;
use crate::error::Result;
use crate::transport::{RpcClient, RpcTransport, Sleeper};
use crate::types::SignatureRef;

pub const GET_SIGNATURES_FOR_ADDRESS: &str = "getSignaturesForAddress";

/// Upper bound on `limit` sent to the node. Keeps a single page small enough
/// for free-tier quotas.
pub const MAX_SIGNATURES_PER_CALL: usize = 25;

/// Most recent signatures touching `address`, newest first, one page only.
pub async fn discover<T: RpcTransport, S: Sleeper>(
    client: &RpcClient<T, S>,
    address: &str,
    limit: usize,
) -> Result<Vec<SignatureRef>> {
    validate_address(address)?;

    let page = limit.min(MAX_SIGNATURES_PER_CALL);
    debug!(address, requested = limit, page, "discovering signatures");

    let result = client
        .call(GET_SIGNATURES_FOR_ADDRESS, json!([address, { "limit": page }]))
        .await?;

    let refs: Vec<SignatureRef> = match result {
        Value::Null => Vec::new(),
        other => serde_json::from_value(other)?,
    };
    info!(address, found = refs.len(), "signatures discovered");
    Ok(refs)
}
