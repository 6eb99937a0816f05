use anyhow::{Context, Result};
use colored::*;
use tether_client::{
    ClientConfig, ClientId, SessionCode, SessionCoordinator, SessionEvent, SessionHandle,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub async fn run_host(config: ClientConfig, local_id: ClientId) -> Result<()> {
    info!("Hosting through {} as {}", config.relay_url, local_id);
    let (handle, events) = SessionCoordinator::spawn_webrtc(config);
    handle
        .start_as_host(local_id)
        .await
        .context("Failed to start session")?;
    bridge(handle, events).await
}

pub async fn run_client(config: ClientConfig, code: SessionCode, local_id: ClientId) -> Result<()> {
    info!("Joining {} through {} as {}", code, config.relay_url, local_id);
    let (handle, events) = SessionCoordinator::spawn_webrtc(config);
    println!("{} {}", "Joining session".cyan(), code.as_str().bold());
    handle
        .start_as_client(code, local_id)
        .await
        .context("Failed to join session")?;
    bridge(handle, events).await
}

/// Pipe stdin lines to the peer and print what comes back until the
/// session ends or Ctrl-C.
async fn bridge(handle: SessionHandle, mut events: mpsc::UnboundedReceiver<SessionEvent>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => handle.send_data(line.into_bytes()).await,
                    None => {
                        debug!("stdin closed, receive only");
                        stdin_open = false;
                    }
                }
            }

            evt = events.recv() => {
                let Some(evt) = evt else { break };
                debug!("Session event: {:?}", evt);
                if !print_event(evt) {
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Disconnecting...".yellow());
                handle.disconnect().await;
                break;
            }
        }
    }

    Ok(())
}

/// Returns false once the session has ended.
fn print_event(evt: SessionEvent) -> bool {
    match evt {
        SessionEvent::SessionReady { code, role } => {
            println!(
                "{} {} {}",
                "Session".green().bold(),
                code.as_str().bold().cyan(),
                format!("({})", role).dimmed()
            );
        }
        SessionEvent::PeerJoined(id) => println!("{} {}", "Peer joined:".green(), id),
        SessionEvent::PeerLeft(id) => println!("{} {}", "Peer left:".yellow(), id),
        SessionEvent::Connected => println!("{}", "Direct link established".green().bold()),
        SessionEvent::ChannelOpen => println!("{}", "Channel open, type to send".dimmed()),
        SessionEvent::DataReceived(data) => {
            println!("{} {}", ">".cyan(), String::from_utf8_lossy(&data));
        }
        SessionEvent::Diagnostic(text) => eprintln!("{} {}", "!".yellow(), text.dimmed()),
        SessionEvent::Disconnected => {
            println!("{}", "Disconnected".yellow().bold());
            return false;
        }
        SessionEvent::Failed { reason } => {
            eprintln!("{} {}", "Session failed:".red().bold(), reason);
            return false;
        }
    }
    true
}
