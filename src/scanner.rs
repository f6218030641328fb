use serde::Serialize;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument, debug, error, info, info_span, warn};

use crate::address::validate_address;
use crate::classifier::classify_with_reason;
use crate::config::ScannerConfig;
use crate::counterparty::resolve;
use crate::discovery::discover;
use crate::error::Result;
use crate::fetcher::{DEFAULT_BATCH_SIZE, PacingPolicy, fetch_batch};
use crate::logging;
use crate::normalize::{RecordContext, Summary, TransactionRecord, aggregate, normalize, sort_by_recency};
use crate::transport::{HttpTransport, RpcClient, RpcTransport, Sleeper, TokioSleeper};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub limit: usize,
    pub batch_size: usize,
    pub pacing: PacingPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            limit: crate::config::DEFAULT_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            pacing: PacingPolicy::default(),
        }
    }
}

impl From<&ScannerConfig> for ScanOptions {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            limit: config.limit,
            batch_size: config.batch_size,
            pacing: config.pacing.clone(),
        }
    }
}

/// Output of one scan, rebuilt from scratch every run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Newest first.
    pub records: Vec<TransactionRecord>,
    pub summary: Summary,
}

impl ScanReport {
    pub fn from_records(mut records: Vec<TransactionRecord>) -> Self {
        sort_by_recency(&mut records);
        let summary = aggregate(&records);
        Self { records, summary }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drives discovery, detail fetching, classification and aggregation for one
/// wallet at a time. All log output goes to the dispatch it was built with.
pub struct Scanner<T, S = TokioSleeper> {
    client: RpcClient<T, S>,
    options: ScanOptions,
    dispatch: Dispatch,
}

impl Scanner<HttpTransport> {
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.rpc_url.clone(), config.request_timeout())?;
        let client = RpcClient::with_transport(transport, config.backoff.clone());
        Ok(Self::new(
            client,
            ScanOptions::from(config),
            logging::dispatch(&config.log),
        ))
    }
}

impl<T: RpcTransport, S: Sleeper> Scanner<T, S> {
    pub fn new(client: RpcClient<T, S>, options: ScanOptions, dispatch: Dispatch) -> Self {
        Self {
            client,
            options,
            dispatch,
        }
    }

    pub fn client(&self) -> &RpcClient<T, S> {
        &self.client
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Best effort: an invalid wallet or failed discovery yields an empty
    /// report, and unfetchable, failed or unclassifiable transactions are left
    /// out.
    pub async fn scan(&self, wallet: &str) -> ScanReport {
        async {
            let span = info_span!("scan", wallet);
            self.run(wallet).instrument(span).await
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }

    async fn run(&self, wallet: &str) -> ScanReport {
        if let Err(err) = validate_address(wallet) {
            warn!(error = %err, "refusing to scan");
            return ScanReport::default();
        }

        let mut refs = match discover(&self.client, wallet, self.options.limit).await {
            Ok(refs) => refs,
            Err(err) => {
                warn!(error = %err, "signature discovery failed");
                return ScanReport::default();
            }
        };
        refs.truncate(self.options.limit);
        if refs.is_empty() {
            info!("no signatures for wallet");
            return ScanReport::default();
        }

        let outcomes = fetch_batch(&self.client, &refs, self.options.batch_size, &self.options.pacing).await;

        let mut records = Vec::new();
        let mut skipped = 0_usize;
        let mut failed = 0_usize;
        let mut failed_on_chain = 0_usize;
        for outcome in outcomes {
            let signature = &outcome.signature;
            let raw = match outcome.result {
                Ok(raw) => raw,
                Err(err) if err.is_soft() => {
                    failed += 1;
                    continue;
                }
                Err(err) => {
                    error!(
                        signature = signature.short(),
                        error = %err,
                        "detail lookup failed with a non-transient error"
                    );
                    failed += 1;
                    continue;
                }
            };

            if let Some(chain_err) = signature.err.as_ref().or(raw.chain_error()) {
                debug!(signature = signature.short(), error = %chain_err, "transaction failed on chain");
                failed_on_chain += 1;
                continue;
            }

            let classified = match classify_with_reason(&raw, wallet) {
                Ok(classified) => classified,
                Err(reason) => {
                    debug!(signature = signature.short(), %reason, "not a stablecoin transfer");
                    skipped += 1;
                    continue;
                }
            };

            let counterparty = resolve(&raw, wallet, classified.direction);
            let block_time = match raw.block_time.or(signature.block_time) {
                Some(t) => t,
                None => {
                    warn!(signature = signature.short(), "no block time, using epoch");
                    0
                }
            };
            records.push(normalize(
                &classified,
                &RecordContext {
                    signature: &signature.signature,
                    block_time,
                    wallet,
                    counterparty: &counterparty,
                },
            ));
        }

        let report = ScanReport::from_records(records);
        info!(
            signatures = refs.len(),
            transfers = report.records.len(),
            skipped,
            failed,
            failed_on_chain,
            total_in = %report.summary.total_in,
            total_out = %report.summary.total_out,
            net = %report.summary.net_amount,
            "scan finished"
        );
        report
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use super::{ScanOptions, ScanReport, Scanner};
    use crate::classifier::Direction;
    use crate::classifier::stablecoins::USDC_MINT;
    use crate::fetcher::PacingPolicy;
    use crate::logging;
    use crate::transport::testing::{RecordingSleeper, ScriptedTransport, result};
    use crate::transport::{BackoffPolicy, RpcClient, RpcReply};

    const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const OTHER: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

    fn scanner(replies: Vec<crate::error::Result<RpcReply>>, limit: usize) -> Scanner<ScriptedTransport, RecordingSleeper> {
        let client = RpcClient::new(
            ScriptedTransport::new(replies),
            RecordingSleeper::default(),
            BackoffPolicy::immediate(5),
        );
        let options = ScanOptions {
            limit,
            batch_size: 3,
            pacing: PacingPolicy::none(),
        };
        Scanner::new(client, options, logging::noop())
    }

    fn transfer_tx(block_time: Option<i64>, pre: &str, post: &str) -> Value {
        json!({
            "slot": 1,
            "blockTime": block_time,
            "meta": {
                "err": null,
                "preTokenBalances": [
                    { "accountIndex": 1, "mint": USDC_MINT, "owner": WALLET,
                      "uiTokenAmount": { "amount": pre, "decimals": 6 } }
                ],
                "postTokenBalances": [
                    { "accountIndex": 1, "mint": USDC_MINT, "owner": WALLET,
                      "uiTokenAmount": { "amount": post, "decimals": 6 } }
                ]
            },
            "transaction": {
                "signatures": ["s"],
                "message": {
                    "accountKeys": [
                        { "pubkey": OTHER, "signer": true, "writable": true },
                        { "pubkey": WALLET, "signer": false, "writable": true }
                    ],
                    "instructions": []
                }
            }
        })
    }

    #[tokio::test]
    async fn invalid_wallet_gives_empty_report_without_calls() {
        let scanner = scanner(vec![], 10);
        let report = scanner.scan("0xdeadbeef").await;
        assert_eq!(report, ScanReport::default());
        assert_eq!(scanner.client().transport().calls(), 0);
    }

    #[tokio::test]
    async fn records_are_sorted_and_summed() {
        let scanner = scanner(
            vec![
                result(json!([
                    { "signature": "older", "blockTime": 100 },
                    { "signature": "newer", "blockTime": 200 },
                    { "signature": "nostable" }
                ])),
                result(transfer_tx(Some(100), "1000000", "3000000")),
                result(transfer_tx(None, "3000000", "2500000")),
                result(transfer_tx(Some(300), "5", "5")),
            ],
            10,
        );
        let report = scanner.scan(WALLET).await;

        let hashes: Vec<&str> = report.records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, ["newer", "older"]);
        assert_eq!(report.records[0].timestamp, 200);
        assert_eq!(report.records[0].direction, Direction::Out);
        assert_eq!(report.records[0].amount, "500000");
        assert_eq!(report.records[0].from, WALLET);
        assert_eq!(report.records[1].from, OTHER);
        assert_eq!(report.summary.total_in, dec!(2));
        assert_eq!(report.summary.total_out, dec!(0.5));
        assert_eq!(report.summary.net_amount, dec!(1.5));
    }

    #[tokio::test]
    async fn limit_bounds_the_number_of_detail_calls() {
        let scanner = scanner(
            vec![
                result(json!([{ "signature": "a" }, { "signature": "b" }, { "signature": "c" }])),
                result(transfer_tx(Some(1), "0", "1")),
            ],
            1,
        );
        let report = scanner.scan(WALLET).await;
        assert_eq!(report.records.len(), 1);
        assert_eq!(
            scanner.client().transport().methods(),
            ["getSignaturesForAddress", "getTransaction"]
        );
    }

    #[tokio::test]
    async fn failed_transactions_are_left_out() {
        let mut reverted = transfer_tx(Some(50), "0", "7000000");
        reverted["meta"]["err"] = json!({ "InstructionError": [0, "Custom"] });
        let scanner = scanner(
            vec![
                result(json!([
                    { "signature": "flagged", "err": { "InstructionError": [0, "Custom"] } },
                    { "signature": "reverted" },
                    { "signature": "good", "err": null }
                ])),
                result(transfer_tx(Some(40), "0", "9000000")),
                result(reverted),
                result(transfer_tx(Some(30), "0", "1000000")),
            ],
            10,
        );
        let report = scanner.scan(WALLET).await;
        let hashes: Vec<&str> = report.records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, ["good"]);
        assert_eq!(report.summary.total_in, dec!(1));
    }

    #[tokio::test]
    async fn report_serializes_camel_case() {
        let report = ScanReport::from_records(vec![]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({ "records": [], "summary": { "totalIn": "0", "totalOut": "0", "netAmount": "0" } })
        );
    }
}
