//! Chainboard: command-line client for the shared on-chain link board

use chainboard_session_adapters::ClientConfig;
use chainboard_session_core::{ConnectedPhase, ConnectionStatus, Session, SessionError};

mod bridge;

use bridge::SessionBridge;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ClientConfig::from_env();
    tracing::info!(cluster = %config.cluster_url, profile = ?config.runtime_profile, "starting chainboard");
    let bridge = SessionBridge::new(&config);

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "status".to_owned());
    match command.as_str() {
        "status" => {
            let wallet = bridge.ensure_connected().await?;
            println!("connected as {wallet}");
            print_session(&bridge.session());
        }
        "list" => {
            bridge.ensure_connected().await?;
            if let Err(e) = bridge.refresh().await {
                report_fetch_failure(&bridge.session(), e)?;
            }
            print_items(&bridge.session());
        }
        "init" => {
            bridge.ensure_connected().await?;
            bridge.initialize().await?;
            println!("board account created");
        }
        "submit" => {
            let link = args
                .next()
                .ok_or_else(|| eyre::eyre!("usage: chainboard submit <link>"))?;
            bridge.ensure_connected().await?;
            let receipt = bridge.submit(&link).await?;
            println!("submitted {link} ({receipt})");
            print_items(&bridge.session());
        }
        other => {
            return Err(eyre::eyre!(
                "unknown command {other:?}; expected status, list, init, or submit <link>"
            ));
        }
    }

    bridge.disconnect();
    Ok(())
}

/// `AccountNotInitialized` on a fetch is a usable answer, not a fault; any
/// other failure aborts the command.
fn report_fetch_failure(session: &Session, e: SessionError) -> eyre::Result<()> {
    match e {
        SessionError::AccountNotInitialized => Ok(()),
        other => {
            if let Some(last) = session.last_refreshed_at {
                tracing::warn!(last_refreshed_at = last.0, "showing last known snapshot");
            }
            Err(other.into())
        }
    }
}

fn print_session(session: &Session) {
    match session.connection {
        ConnectionStatus::Connected(ConnectedPhase::Ready) => {
            let count = session.items.as_ref().map_or(0, Vec::len);
            println!("board ready, {count} links");
        }
        ConnectionStatus::Connected(ConnectedPhase::Uninitialized) => {
            println!("board account not initialized; run `chainboard init`");
        }
        ConnectionStatus::Connecting => println!("connecting"),
        ConnectionStatus::Disconnected => println!("disconnected"),
    }
    if let Some(error) = &session.load_error {
        println!("last load error: {error}");
    }
}

fn print_items(session: &Session) {
    match &session.items {
        Some(items) if items.is_empty() => println!("board is empty"),
        Some(items) => {
            for item in items {
                println!("{}  (submitted by {})", item.link, item.submitter);
            }
        }
        None => println!("board account not initialized; run `chainboard init`"),
    }
}
