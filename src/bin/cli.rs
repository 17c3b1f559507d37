use vault::{Amount,
    service::{Script, VaultConfig}};

use std::path::PathBuf;
use anyhow::Context;
use colored::Colorize;
use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
    /// Path to the vault configuration file
    #[clap(short, long, value_parser, default_value = "resources/vault.toml")]
    config: PathBuf,

    /// Action to perform
    #[clap(subcommand)]
    action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Show the configured starting wallets
    Wallets,
    /// Replay a script of operations against a fresh vault
    Run(RunScript)
}

#[derive(Args, Debug)]
struct RunScript {
    /// Path to a JSON list of operations
    #[clap(value_parser)]
    script: PathBuf,

    /// Print the event journal as JSON lines once the script is done
    #[clap(long, action)]
    json: bool
}

fn print_balances(balances: impl IntoIterator<Item = (String, Amount)>, symbol: &str) {
    for (account, balance) in balances {
        let fmt_balance = if balance > 0 {
            format!("{} {}", balance, symbol).green()
        } else {
            format!("{} {}", balance, symbol).normal()
        };
        println!("{}: {}", account, fmt_balance);
    }
}

impl RunScript {
    async fn run(&self, config: &VaultConfig) -> anyhow::Result<()> {
        let script = Script::read(&self.script)?;
        let service = config.build_service()?;
        let symbol = &config.asset.symbol;

        let mut events = service.subscribe();
        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(record) => log::info!("#{} {}", record.seq, record.event),
                    Err(RecvError::Lagged(missed)) => log::warn!("event listener skipped {} records", missed),
                    Err(RecvError::Closed) => break
                }
            }
        });

        let outcomes = script.run(&service).await;
        for (operation, outcome) in script.operations.iter().zip(&outcomes) {
            println!("{} {}: {}", "»".dimmed(), operation, outcome);
        }

        println!("{}", "Balances".bold());
        let board = service.leaderboard().await;
        print_balances(board.into_iter().map(|(account, balance)| (account.to_string(), balance)), symbol);
        let (total, custody) = service.inspect(|ledger| (ledger.total_balance(), ledger.asset().custody())).await;
        println!("{}: {} {} (custody {} {})", "Total".bold(), total, symbol, custody, symbol);

        if self.json {
            let journal = service.inspect(|ledger| ledger.events().to_vec()).await;
            for record in journal {
                println!("{}", serde_json::to_string(&record).context("failed to encode event")?);
            }
        }

        drop(service);
        listener.await.context("event listener crashed")?;
        return Ok(());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = VaultConfig::read(&args.config)?;
    log::debug!("loaded config {:?}", config);

    match args.action {
        Subcommands::Wallets => {
            let wallets = config.wallets.iter().map(|(id, amount)| (id.clone(), *amount));
            print_balances(wallets, &config.asset.symbol);
        },
        Subcommands::Run(run_script) => {
            run_script.run(&config).await?;
        }
    }
    return Ok(());
}
