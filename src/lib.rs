#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod address;
pub mod classifier;
pub mod counterparty;
pub mod error;
pub mod normalize;
pub mod types;

#[cfg(feature = "native")]
pub mod config;
#[cfg(feature = "native")]
pub mod discovery;
#[cfg(feature = "native")]
pub mod fetcher;
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod scanner;
#[cfg(feature = "native")]
pub mod transport;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use address::{is_valid_address, validate_address};
pub use classifier::{ClassifiedTransfer, Direction, SkipReason, Stablecoin, classify, classify_with_reason};
pub use counterparty::{UNKNOWN_COUNTERPARTY, resolve};
pub use error::{Error, Result};
pub use normalize::{
    AmountTier, RecordContext, Summary, TransactionRecord, aggregate, fold_into_summary_record,
    normalize, parse_amount, sort_by_recency,
};
pub use types::{RawTransactionRecord, SignatureRef};

#[cfg(feature = "native")]
pub use config::ScannerConfig;
#[cfg(feature = "native")]
pub use discovery::discover;
#[cfg(feature = "native")]
pub use fetcher::{FetchOutcome, PacingPolicy, fetch_batch};
#[cfg(feature = "native")]
pub use scanner::{ScanOptions, ScanReport, Scanner};
#[cfg(feature = "native")]
pub use transport::{BackoffPolicy, HttpTransport, Pause, RpcClient, RpcTransport, Sleeper};
