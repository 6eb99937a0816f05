mod peer;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use std::time::Duration;
use tether_client::{ClientConfig, ClientId, SessionCode};
use tether_server::ServerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Direct peer-to-peer links through a rendezvous relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rendezvous relay.
    Serve {
        #[arg(long, env = "TETHER_BIND")]
        bind: Option<SocketAddr>,

        /// Drop sessions older than this many seconds.
        #[arg(long)]
        session_ttl: Option<u64>,
    },
    /// Open a session and wait for a peer.
    Host {
        #[command(flatten)]
        peer: PeerArgs,
    },
    /// Join a session by its code.
    Join {
        code: Option<String>,

        #[command(flatten)]
        peer: PeerArgs,
    },
}

#[derive(clap::Args)]
struct PeerArgs {
    #[arg(long, env = "TETHER_RELAY_URL", default_value = "ws://localhost:3000/ws")]
    relay: String,

    /// Local identifier. The relay assigns the one peers actually see.
    #[arg(long)]
    id: Option<String>,

    /// STUN/TURN URLs; none means host candidates only.
    #[arg(long = "ice-server")]
    ice_servers: Vec<String>,

    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,
}

impl PeerArgs {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default()
            .with_relay_url(self.relay.clone())
            .with_connect_timeout(Duration::from_secs(self.connect_timeout));
        if !self.ice_servers.is_empty() {
            config = config.with_ice_servers(self.ice_servers.clone());
        }
        config
    }

    fn local_id(&self) -> ClientId {
        self.id
            .clone()
            .map(ClientId::from)
            .unwrap_or_else(ClientId::generate)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tether=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Serve { bind, session_ttl } => {
            let mut config = ServerConfig::from_env();
            if let Some(addr) = bind {
                config = config.with_bind_addr(addr);
            }
            if let Some(secs) = session_ttl {
                config = config.with_session_ttl(Duration::from_secs(secs));
            }
            info!(
                "Serving on {} (session ttl {:?}, sweep every {:?})",
                config.bind_addr, config.session_ttl, config.sweep_interval
            );

            println!(
                "{} {}",
                "Relay listening on".green().bold(),
                format!("ws://{}/ws", config.bind_addr).cyan()
            );
            tether_server::serve(config).await?;
        }
        Commands::Host { peer } => {
            peer::run_host(peer.config(), peer.local_id()).await?;
        }
        Commands::Join { code, peer } => {
            let code = match code {
                Some(code) => code,
                None => prompt_code().await?,
            };
            let code = SessionCode::from(code.trim().to_uppercase());
            peer::run_client(peer.config(), code, peer.local_id()).await?;
        }
    }

    Ok(())
}

async fn prompt_code() -> Result<String> {
    tokio::task::spawn_blocking(|| {
        dialoguer::Input::<String>::new()
            .with_prompt("Session code")
            .interact_text()
            .context("Failed to read session code")
    })
    .await
    .context("Prompt task panicked")?
}
