use crate::error::Error;

pub const MIN_ADDRESS_LEN: usize = 32;
pub const MAX_ADDRESS_LEN: usize = 44;

/// Structural check for a Solana account address: length bounds plus base58
/// alphabet. It does not check that the address decodes to a curve point.
pub fn validate_address(address: &str) -> Result<(), Error> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidAddress {
            reason: "address is empty".into(),
        });
    }
    if trimmed.starts_with("0x") {
        return Err(Error::InvalidAddress {
            reason: format!("{trimmed} looks like an EVM address"),
        });
    }
    if trimmed.len() != address.len() {
        return Err(Error::InvalidAddress {
            reason: "address has surrounding whitespace".into(),
        });
    }
    if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address.len()) {
        return Err(Error::InvalidAddress {
            reason: format!(
                "length {} outside {MIN_ADDRESS_LEN}..={MAX_ADDRESS_LEN}",
                address.len()
            ),
        });
    }
    bs58::decode(address)
        .into_vec()
        .map_err(|e| Error::InvalidAddress {
            reason: format!("not base58: {e}"),
        })?;
    Ok(())
}

pub fn is_valid_address(address: &str) -> bool {
    validate_address(address).is_ok()
}
