//! Command-line PayID server conformance checker.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use payid_validator::{CheckCode, CheckMessage, NetworkType, ValidationSession};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "payid-validate",
    about = "Check a PayID server's discovery response for protocol conformance",
    version
)]
struct Args {
    /// The PayID to validate, e.g. alice$example.com
    #[arg(required_unless_present = "list_networks")]
    pay_id: Option<String>,

    /// Network to request, by catalog id (see --list-networks)
    #[arg(short, long, default_value = "all")]
    network: String,

    /// HTTP status code the server is expected to answer with
    #[arg(long, default_value_t = 200)]
    expected_status: u16,

    /// Etherscan API key for ETH ledger lookups
    #[arg(long, env = "ETHERSCAN_API_KEY")]
    etherscan_api_key: Option<String>,

    /// blockchain.info API code for BTC ledger lookups
    #[arg(long, env = "BLOCKCHAIN_API_KEY")]
    blockchain_api_key: Option<String>,

    /// Print the supported network catalog and exit
    #[arg(long)]
    list_networks: bool,

    /// Log each check as it is recorded
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(if args.debug { "info" } else { "warn" })
            }),
        )
        .init();

    if args.list_networks {
        for network in NetworkType::ALL {
            println!("{:<14} {}", network.id(), network.label());
        }
        return Ok(());
    }

    let pay_id = args.pay_id.unwrap_or_default();
    let mut session = ValidationSession::new(&pay_id, &args.network, args.expected_status)
        .with_debug_mode(args.debug);
    if let Some(key) = args.etherscan_api_key {
        session = session.with_etherscan_api_key(key);
    }
    if let Some(key) = args.blockchain_api_key {
        session = session.with_blockchain_api_key(key);
    }

    if session.has_preflight_errors() {
        for error in session.preflight_errors() {
            eprintln!("{} {error}", "error:".red().bold());
        }
        std::process::exit(2);
    }

    println!(
        "Validating {} via {}\n",
        pay_id.bold(),
        session
            .request_url()
            .unwrap_or_default()
            .underline()
    );

    if let Err(error) = session.validate().await {
        eprintln!("{} {error}", "request failed:".red().bold());
        std::process::exit(1);
    }

    for check in session.checks() {
        let code = match check.code {
            CheckCode::Pass => "PASS".green().bold(),
            CheckCode::Warn => "WARN".yellow().bold(),
            CheckCode::Fail => "FAIL".red().bold(),
        };
        println!("[{code}] {}", check.label.bold());
        if !check.value.is_empty() {
            println!("       value: {}", check.value);
        }
        match &check.message {
            CheckMessage::None => {}
            CheckMessage::Text(line) => println!("       {line}"),
            CheckMessage::List(lines) => {
                for line in lines {
                    println!("       - {line}");
                }
            }
        }
    }

    let score = session.score();
    let rendered = format!("{score:.2}");
    let rendered = if score >= 100.0 {
        rendered.green().bold()
    } else if score >= 75.0 {
        rendered.yellow().bold()
    } else {
        rendered.red().bold()
    };
    println!("\nScore: {rendered} / 100");

    Ok(())
}
