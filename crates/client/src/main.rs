//! Arachne client binary.
//!
//! Usage:
//!   arachne-client
//!   arachne-client --url ws://127.0.0.1:8080/ws
//!   arachne-client --task "what's 3*6 divided by 2"

use std::collections::VecDeque;
use std::io::{self, Write};

use arachne_client::{Action, Bridge, RECONNECT_DELAY, ResolverChain, StdinPrompter};
use arachne_common::ServerFrame;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_URL: &str = "ws://127.0.0.1:8080/ws";

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments (simple for now)
    let args: Vec<String> = std::env::args().collect();
    let mut url = DEFAULT_URL.to_string();
    let mut first_task: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" | "-u" => {
                if i + 1 < args.len() {
                    url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--task" | "-t" => {
                if i + 1 < args.len() {
                    first_task = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Arachne Client");
                println!();
                println!("Usage: arachne-client [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --url <URL>    Gateway WebSocket URL (default: {DEFAULT_URL})");
                println!("  -t, --task <TASK>  Task to submit at the first prompt");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let resolvers = ResolverChain::standard(Box::new(StdinPrompter));
    let mut bridge = Bridge::new();

    loop {
        match connect_async(&url).await {
            Ok((mut ws, _)) => {
                if let Err(e) = pump(&mut ws, &mut bridge, &resolvers, &mut first_task).await {
                    warn!(error = %e, "Session ended");
                }
            }
            Err(e) => {
                warn!(error = %e, url = %url, "Connection failed");
            }
        }

        // Either way the connection is gone; schedule the single retry.
        let delay = handle_close(&mut bridge);
        tokio::time::sleep(delay).await;
    }
}

/// Drive one connection until it drops or a frame handler fails.
async fn pump(
    ws: &mut WsStream,
    bridge: &mut Bridge,
    resolvers: &ResolverChain,
    first_task: &mut Option<String>,
) -> anyhow::Result<()> {
    let actions = bridge.opened();
    run_actions(ws, bridge, first_task, actions).await?;

    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => {
                let frame: ServerFrame = match serde_json::from_str(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "Unrecognized frame");
                        continue;
                    }
                };

                let actions = bridge.handle_frame(frame, resolvers)?;
                run_actions(ws, bridge, first_task, actions).await?;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}

/// Perform bridge actions in order; a `Prompt` feeds the next task back
/// into the bridge and queues whatever that produces.
async fn run_actions(
    ws: &mut WsStream,
    bridge: &mut Bridge,
    first_task: &mut Option<String>,
    actions: Vec<Action>,
) -> anyhow::Result<()> {
    let mut queue: VecDeque<Action> = actions.into();

    while let Some(action) = queue.pop_front() {
        match action {
            Action::Display(text) => println!("{text}"),
            Action::Send(frame) => {
                ws.send(Message::Text(serde_json::to_string(&frame)?))
                    .await?;
            }
            Action::Prompt => {
                let task = match first_task.take() {
                    Some(task) => task,
                    None => read_task()?,
                };
                queue.extend(bridge.submit(&task));
            }
            // Reconnects are scheduled by the outer loop, never here.
            Action::Reconnect(_) => {}
        }
    }

    Ok(())
}

/// Surface the disconnect and return the retry delay.
fn handle_close(bridge: &mut Bridge) -> std::time::Duration {
    let mut delay = RECONNECT_DELAY;
    for action in bridge.closed() {
        match action {
            Action::Display(text) => println!("{text}"),
            Action::Reconnect(d) => delay = d,
            _ => {}
        }
    }
    delay
}

/// Blocking task prompt on stdin.
fn read_task() -> anyhow::Result<String> {
    print!("Enter your message: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
