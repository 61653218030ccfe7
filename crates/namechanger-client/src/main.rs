//! # namechanger
//!
//! Rename a wallet's avatar profile to one of the names it owns.
//!
//! The wallet is reached over JSON-RPC (`WALLET_RPC_URL`), names come from
//! the marketplace subgraph and the new profile is deployed to a peer.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use namechanger_client::flow::{deploy_selection, load_selection};
use namechanger_client::{ClientConfig, ClientError, Session};
use namechanger_shared::constants::APP_NAME;
use namechanger_shared::selection::SelectionState;

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(about = "Change your avatar name to one of your claimed names", long_about = None)]
struct Cli {
    /// Peer node URL (overrides PEER_URL)
    #[arg(long, global = true)]
    peer: Option<String>,

    /// Name index URL (overrides NAME_INDEX_URL)
    #[arg(long, global = true)]
    index: Option<String>,

    /// Wallet JSON-RPC URL (overrides WALLET_RPC_URL)
    #[arg(long, global = true)]
    wallet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List owned names, marking the current one
    Names,

    /// Show the connected address and its current name
    Status,

    /// Change the current name
    Rename {
        /// One of the names owned by the connected address
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,namechanger_client=debug")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(peer) = cli.peer.as_deref() {
        config = config.with_peer_url(peer);
    }
    if let Some(index) = cli.index {
        config.name_index_url = index;
    }
    if let Some(wallet) = cli.wallet {
        config.wallet_rpc_url = wallet;
    }
    info!(?config, "Loaded configuration");

    let session = Session::connect(&config)
        .await
        .context("connect to wallet")?;

    let mut controller = match load_selection(&session).await {
        Ok(controller) => controller,
        Err(ClientError::NoOwnedNames(address)) => {
            anyhow::bail!(
                "It seems that you don't have any claimed names for {address}. \
                 Please select a wallet that has claimed names."
            );
        }
        Err(e) => return Err(e).context("load names"),
    };

    match cli.command {
        Commands::Names => {
            for option in controller.options() {
                println!("{option}");
            }
        }
        Commands::Status => {
            println!("address: {}", session.address());
            println!("current: {}", controller.current());
            println!("owned: {}", controller.owned().len());
        }
        Commands::Rename { name } => {
            if controller.select(&name)? == SelectionState::Clean {
                println!("{} is already your current name", controller.current());
                return Ok(());
            }
            let receipt = deploy_selection(&session, &mut controller)
                .await
                .context("deploy profile")?;
            println!("Name changed to {}", controller.current());
            println!("entity: {}", receipt.entity_id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), APP_NAME);
    }

    #[test]
    fn test_rename_takes_global_overrides() {
        let cli = Cli::try_parse_from([APP_NAME, "rename", "alice2", "--peer", "http://peer"]).unwrap();
        assert_eq!(cli.peer.as_deref(), Some("http://peer"));
        assert!(matches!(cli.command, Commands::Rename { ref name } if name == "alice2"));
    }
}
