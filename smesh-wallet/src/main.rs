//! Spacemesh Wallet CLI
//!
//! Opens (or creates) the wallet file, connects to a node and runs the
//! interactive command loop.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smesh_wallet::{
    config::{default_config_path, Config, Overrides},
    session, terminal, AccountManager, Dispatcher, KeyStore, RpcClient, WalletBackend,
};

#[derive(Parser)]
#[command(name = "smesh-wallet")]
#[command(about = "Spacemesh wallet - manage accounts and talk to a node")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Custom wallet file path
    #[arg(short, long)]
    wallet: Option<PathBuf>,

    /// Node host name or IP address
    #[arg(long)]
    server: Option<String>,

    /// Node RPC port
    #[arg(short, long)]
    port: Option<u16>,

    /// Connect over HTTPS
    #[arg(long)]
    secure: bool,
}

/// Read one trimmed line from stdin
fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(anyhow!("end of input"));
    }
    Ok(line.trim().to_string())
}

fn open_or_create(path: &Path) -> Result<KeyStore> {
    if KeyStore::exists(path) {
        return session::open_wallet(path, terminal::read_password)
            .with_context(|| format!("Failed to open wallet {}", path.display()));
    }

    println!("> No wallet found at {}. Creating a new one.", path.display());
    let name = read_line("Wallet name: ")?;
    let store = session::create_wallet(path, &name, terminal::read_password)
        .with_context(|| format!("Failed to create wallet {}", path.display()))?;

    println!();
    println!("> Your recovery phrase (24 words):");
    for row in session::recovery_phrase_rows(store.keys()?) {
        println!("> {}", row);
    }
    println!("> IMPORTANT: Write down your recovery phrase and store it safely!");
    println!();

    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout belongs to the prompt
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    terminal::install_interrupt_handler().context("Failed to install Ctrl-C handler")?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load_or_default(&config_path)?;
    config.apply(Overrides {
        wallet: cli.wallet,
        host: cli.server,
        port: cli.port,
        secure: cli.secure,
    });

    let wallet_path = config.wallet.wallet_path();
    let store = open_or_create(&wallet_path)?;
    let accounts = AccountManager::open(store)?;
    info!(
        "{} successfully opened with {} accounts",
        accounts.wallet_name(),
        accounts.len()
    );

    let mut client = RpcClient::from_config(&config.node);
    client
        .connect()
        .with_context(|| format!("Failed to connect to {}", config.node.endpoint()))?;

    let backend = WalletBackend::new(accounts, client, &config.wallet);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let mut dispatcher = Dispatcher::new(backend, io::stdin().lock(), io::stdout());
    runtime
        .block_on(dispatcher.run())
        .context("Wallet session failed")?;

    Ok(())
}
