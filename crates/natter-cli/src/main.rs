//! Natter CLI - serve, chat, or join a multicast group from the terminal

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use natter_client::ChatClient;
use natter_group::{GroupConfig, GroupPeer};
use natter_proto::{DEFAULT_GROUP_PORT, DEFAULT_PORT, HEARTBEAT_INTERVAL_MS, MAX_USERS};
use natter_server::{ChatServer, ServerConfig};

mod terminal;

use terminal::{print_group_event, TerminalUi};

/// Natter - minimal multi-user chat broadcaster
#[derive(Parser)]
#[command(name = "natter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat server
    Serve {
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,

        /// Port number
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Maximum number of simultaneous users
        #[arg(long, default_value_t = MAX_USERS)]
        max_users: usize,
    },

    /// Connect to a chat server
    Chat {
        /// Display name to claim
        #[arg(short, long)]
        name: String,

        /// Server address
        #[arg(short, long, default_value = "127.0.0.1")]
        server: String,

        /// Server port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Join a serverless multicast group
    Group {
        /// Display name to announce
        #[arg(short, long)]
        name: String,

        /// Multicast group address
        #[arg(short, long, default_value = "230.0.0.0")]
        group: Ipv4Addr,

        /// Multicast port
        #[arg(short, long, default_value_t = DEFAULT_GROUP_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            bind,
            port,
            max_users,
        } => serve(&bind, port, max_users).await,
        Commands::Chat { name, server, port } => chat(&name, &server, port).await,
        Commands::Group { name, group, port } => group_chat(&name, group, port).await,
    }
}

async fn serve(bind: &str, port: u16, max_users: usize) -> Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let server = ChatServer::new(ServerConfig { max_users });

    tokio::select! {
        result = server.serve(listener) => result.context("server failed")?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}

async fn chat(name: &str, server: &str, port: u16) -> Result<()> {
    let addr = format!("{server}:{port}");
    let client = ChatClient::connect(&addr, name, Arc::new(TerminalUi))
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = stdin.next_line() => match line? {
                Some(line) if !line.trim().is_empty() => {
                    client.send_text(&line).await.context("session ended")?;
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    client.close();
    Ok(())
}

async fn group_chat(name: &str, group: Ipv4Addr, port: u16) -> Result<()> {
    let config = GroupConfig {
        group,
        port,
        heartbeat: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
    };
    let (peer, mut events) = GroupPeer::join(config, name)
        .await
        .context("failed to join group")?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_group_event(&event);
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = stdin.next_line() => match line? {
                Some(line) if !line.trim().is_empty() => peer.send_text(&line).await?,
                Some(_) => {}
                None => break,
            },
        }
    }

    peer.leave().await?;
    Ok(())
}
