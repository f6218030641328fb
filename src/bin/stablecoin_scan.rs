#![expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "command line output"
)]

use std::process::ExitCode;

use clap::Parser;
use stablecoin_transfer_tracker::logging::{self, LogLevel};
use stablecoin_transfer_tracker::{ScanReport, Scanner, ScannerConfig};

/// Scan a Solana wallet's recent USDC/USDT transfers.
#[derive(Debug, Parser)]
#[command(name = "stablecoin-scan", version, about)]
struct Args {
    /// Wallet address (base58).
    wallet: String,

    /// Number of recent signatures to inspect.
    #[arg(long)]
    limit: Option<usize>,

    /// JSON-RPC endpoint; overrides SOLANA_RPC_URL and ALCHEMY_API_KEY.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Detail requests per batch.
    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(&self, config: &mut ScannerConfig) {
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url.clone_from(url);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
    }
}

fn print_report(report: &ScanReport) {
    for record in &report.records {
        println!(
            "{} {:<3} {:>5} {:>14} {} -> {} {}",
            record.formatted_date,
            record.direction,
            record.coin,
            record.amount,
            record.from,
            record.to,
            record.hash,
        );
    }
    println!(
        "total in {} | total out {} | net {}",
        report.summary.total_in, report.summary.total_out, report.summary.net_amount
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match ScannerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    let dispatch = logging::dispatch(&config.log);
    tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!(rpc_url = %config.redacted_rpc_url(), limit = config.limit, "starting scan");
    });

    let scanner = match Scanner::from_config(&config) {
        Ok(scanner) => scanner,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let report = scanner.scan(&args.wallet).await;

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize report: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&report);
    }
    ExitCode::SUCCESS
}
