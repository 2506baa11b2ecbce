use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{Sink, SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::json;
use territory_rust_server::config::ServerConfig;
use territory_rust_server::engine::{GameEngine, GameEngineOptions};
use territory_rust_server::server_protocol::{parse_client_message, ParsedClientMessage};
use territory_rust_server::session::{run_tick_loop, GameCommand, SessionHub};
use tokio::sync::mpsc;
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
struct AppState {
    commands: mpsc::Sender<GameCommand>,
    client_queue_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    let seed = config.seed.unwrap_or_else(rand::random::<u32>);

    let (command_tx, command_rx) = mpsc::channel::<GameCommand>(config.command_queue_capacity);
    let hub = SessionHub::new(
        GameEngine::new(seed, GameEngineOptions::default()),
        config.announce_eliminations,
    );
    tokio::spawn(run_tick_loop(hub, command_rx));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(AppState {
            commands: command_tx,
            client_queue_capacity: config.client_queue_capacity,
        });

    let app = if let Some(static_dir) = config.static_dir.clone() {
        let index_file = static_dir.join("index.html");
        info!("[server] static file root: {}", static_dir.to_string_lossy());
        app.fallback_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)))
    } else {
        warn!("[server] static file root not found. set STATIC_DIR to serve the client.");
        app
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("[server] listening on :{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let player_id = make_id("player");
    let (tx, rx) = mpsc::channel::<String>(state.client_queue_capacity);
    info!("[server] {player_id} connected");

    if state
        .commands
        .send(GameCommand::Join {
            player_id: player_id.clone(),
            outbound: tx,
        })
        .await
        .is_err()
    {
        warn!("[server] simulation is not running, dropping {player_id}");
        return;
    }

    let (ws_sender, mut ws_receiver) = socket.split();
    let mut writer = tokio::spawn(forward_outbound(rx, ws_sender));
    let mut writer_done = false;

    loop {
        tokio::select! {
            received = ws_receiver.next() => {
                let Some(Ok(message)) = received else {
                    break;
                };
                match message {
                    Message::Text(raw) => {
                        handle_client_message(&state, &player_id, raw.as_str()).await;
                    }
                    Message::Binary(raw) => {
                        if let Ok(text) = std::str::from_utf8(&raw) {
                            handle_client_message(&state, &player_id, text).await;
                        } else {
                            debug!("[server] {player_id} sent non-utf8 binary frame");
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            _ = &mut writer => {
                info!("[server] {player_id} dropped by the simulation");
                writer_done = true;
                break;
            }
        }
    }

    info!("[server] {player_id} disconnected");
    let _ = state
        .commands
        .send(GameCommand::Leave {
            player_id: player_id.clone(),
        })
        .await;
    if !writer_done {
        let _ = writer.await;
    }
}

/// Pumps queued payloads to the socket. Once the simulation drops the queue
/// the peer gets a close frame.
async fn forward_outbound<S>(mut rx: mpsc::Receiver<String>, mut sink: S)
where
    S: Sink<Message> + Unpin,
{
    while let Some(payload) = rx.recv().await {
        if sink.send(Message::Text(payload.into())).await.is_err() {
            return;
        }
    }
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: "disconnected by server".into(),
    };
    let _ = sink.send(Message::Close(Some(frame))).await;
}

async fn handle_client_message(state: &AppState, player_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        debug!("[server] {player_id} sent invalid message");
        return;
    };

    match message {
        ParsedClientMessage::Move { dir: Some(dir) } => {
            let _ = state
                .commands
                .send(GameCommand::Move {
                    player_id: player_id.to_string(),
                    dir,
                })
                .await;
        }
        ParsedClientMessage::Move { dir: None } => {
            debug!("[server] {player_id} sent unknown direction");
        }
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
