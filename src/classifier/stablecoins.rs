use serde::{Deserialize, Serialize};

pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Chain tag carried on every emitted record.
pub const CHAIN: &str = "solana";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Stablecoin {
    Usdc,
    Usdt,
}

impl Stablecoin {
    /// Exact allow-list lookup; no prefix or case-insensitive matching.
    pub fn from_mint(mint: &str) -> Option<Self> {
        match mint {
            USDC_MINT => Some(Self::Usdc),
            USDT_MINT => Some(Self::Usdt),
            _ => None,
        }
    }

    pub fn mint(self) -> &'static str {
        match self {
            Self::Usdc => USDC_MINT,
            Self::Usdt => USDT_MINT,
        }
    }

    pub fn all_mints() -> &'static [&'static str] {
        &[USDC_MINT, USDT_MINT]
    }
}
