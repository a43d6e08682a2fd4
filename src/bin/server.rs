use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use ghost_ai::constants::TICK_MS;
use ghost_ai::levels::{builtin_level, Level, LevelError};
use ghost_ai::server_protocol::{parse_client_message, ParsedClientMessage};
use ghost_ai::session::{Session, SessionOptions};
use ghost_ai::structured_log::emit_log;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    run_id: String,
    seed: u64,
    clients: HashMap<String, ClientContext>,
    level_id: u32,
    session: Session,
}

impl ServerState {
    fn new(run_id: String, seed: u64, level_id: u32) -> Result<Self, LevelError> {
        let session = build_session(level_id, seed)?;
        Ok(Self {
            run_id,
            seed,
            clients: HashMap::new(),
            level_id,
            session,
        })
    }
}

fn build_session(level_id: u32, seed: u64) -> Result<Session, LevelError> {
    let level = Level::builtin(level_id)?;
    Ok(Session::new(
        level,
        SessionOptions {
            seed,
            ..SessionOptions::default()
        },
    ))
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let level_id = std::env::var("LEVEL")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|id| builtin_level(*id).is_some())
        .unwrap_or(1);
    let seed = std::env::var("SEED")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(rand::random);
    let run_id = make_run_id();

    let server_state = match ServerState::new(run_id.clone(), seed, level_id) {
        Ok(state) => state,
        Err(error) => {
            emit_log(
                "error",
                "level_load_failed",
                &run_id,
                None,
                Some(seed),
                None,
                json!({ "level": level_id, "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };
    let state = Arc::new(Mutex::new(server_state));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/level", get(level_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        emit_log(
            "info",
            "static_root",
            &run_id,
            None,
            None,
            None,
            json!({ "path": static_dir.to_string_lossy() }),
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            emit_log(
                "error",
                "bind_failed",
                &run_id,
                None,
                None,
                None,
                json!({ "addr": bind_addr, "error": error.to_string() }),
            );
            std::process::exit(1);
        }
    };

    emit_log(
        "info",
        "server_listening",
        &run_id,
        None,
        Some(seed),
        None,
        json!({ "port": port, "level": level_id }),
    );
    if let Err(error) = axum::serve(listener, app).await {
        emit_log(
            "error",
            "server_failed",
            &run_id,
            None,
            None,
            None,
            json!({ "error": error.to_string() }),
        );
        std::process::exit(1);
    }
}

fn resolve_static_dir() -> Option<PathBuf> {
    let raw = std::env::var("STATIC_DIR").ok()?;
    let path = PathBuf::from(raw);
    path.join("index.html").is_file().then_some(path)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn level_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "id": guard.level_id,
        "level": guard.session.level_init(),
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        emit_log(
            "info",
            "client_connected",
            &guard.run_id,
            None,
            None,
            Some(guard.session.tick()),
            json!({ "clientId": client_id, "clients": guard.clients.len() }),
        );
        let welcome = json!({
            "type": "welcome",
            "clientId": client_id,
            "levelId": guard.level_id,
            "level": guard.session.level_init(),
        });
        send_to_client(&mut guard, &client_id, &welcome, QueuePolicy::DisconnectOnFull);
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Input { dir } => guard.session.steer(dir),
        ParsedClientMessage::Power => guard.session.grant_power(),
        ParsedClientMessage::ResetGhosts => guard.session.reset_ghosts(),
        ParsedClientMessage::LoadLevel { id } => load_level(&mut guard, id),
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

/// A level change rebuilds the ghost system from the new level's spawns.
fn load_level(state: &mut ServerState, id: u32) {
    match build_session(id, state.seed) {
        Ok(session) => {
            state.session = session;
            state.level_id = id;
            emit_log(
                "info",
                "level_loaded",
                &state.run_id,
                None,
                Some(state.seed),
                None,
                json!({ "level": id }),
            );
            let message = json!({
                "type": "level",
                "levelId": id,
                "level": state.session.level_init(),
            });
            broadcast(state, &message, QueuePolicy::DisconnectOnFull);
        }
        Err(error) => {
            emit_log(
                "error",
                "level_load_failed",
                &state.run_id,
                None,
                Some(state.seed),
                None,
                json!({ "level": id, "error": error.to_string() }),
            );
        }
    }
}

async fn handle_disconnect(state: SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    disconnect_client_internal(&mut guard, client_id);
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    let _ = context.tx.try_send(OutboundMessage::Close {
        code: 1000,
        reason: "bye".to_string(),
    });
    emit_log(
        "info",
        "client_disconnected",
        &state.run_id,
        None,
        None,
        Some(state.session.tick()),
        json!({ "clientId": client_id, "clients": state.clients.len() }),
    );
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_session(&mut guard);
        }
    });
}

fn tick_session(state: &mut ServerState) {
    let hits_before = state.session.hits();
    let snapshot = state.session.step();
    if snapshot.hits > hits_before {
        emit_log(
            "info",
            "player_hit",
            &state.run_id,
            None,
            None,
            Some(snapshot.tick),
            json!({ "hits": snapshot.hits, "x": snapshot.player.x, "y": snapshot.player.y }),
        );
    }
    if state.clients.is_empty() {
        return;
    }
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client_internal(state, &client_id);
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn make_run_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("srv-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_id_is_sequential_per_prefix() {
        let first = make_id("client");
        let second = make_id("client");
        assert!(first.starts_with("client_"));
        assert_ne!(first, second);
    }

    #[test]
    fn run_id_has_prefix_and_random_suffix() {
        let id = make_run_id();
        assert!(id.starts_with("srv-"));
        assert_eq!(id.len(), "srv-".len() + 8);
    }

    #[test]
    fn level_change_rebuilds_the_session() {
        let mut state = ServerState::new("srv-test".to_string(), 4, 1).expect("level 1 loads");
        for _ in 0..10 {
            tick_session(&mut state);
        }
        load_level(&mut state, 2);
        assert_eq!(state.level_id, 2);
        assert_eq!(state.session.tick(), 0);
        assert_eq!(state.session.monsters().len(), 3);
    }

    #[test]
    fn unknown_level_is_rejected_at_startup() {
        assert!(ServerState::new("srv-test".to_string(), 4, 42).is_err());
    }
}
