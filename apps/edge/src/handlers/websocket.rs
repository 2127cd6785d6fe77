// [apps/edge/src/handlers/websocket.rs]
/*!
 * APARATO: ROOM UPLINK SOCKET (§4.5)
 * RESPONSABILIDAD: PUENTE FULL-DUPLEX ENTRE UNA SALA DEL BUS Y EL CLIENTE
 *
 * Generaliza el socket único del linaje original a una suscripción por
 * sala: cada cliente elige `alerts`, `livemap`, `telegram`, `dept_<x>`,
 * `hospital_<id>` o `patient_<id>` vía query string y recibe solo esa
 * sala. Dos tareas bastan aquí — no hay enrutador de comandos entrante,
 * el uplink es de solo lectura desde la perspectiva del cliente.
 */

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use pulsegrid_infra_bus::envelope::rooms;
use pulsegrid_infra_bus::{Broker, RoomRecv};
use serde::Deserialize;
use tokio::time::{interval, Duration};
use tracing::{debug, info, instrument, warn};

const KEEPALIVE_INTERVAL_SECONDS: u64 = 25;

#[derive(Debug, Deserialize)]
pub struct RoomUplinkQuery {
    pub room: Option<String>,
}

#[instrument(skip(websocket_upgrade, state))]
pub async fn establish_room_uplink(
    websocket_upgrade: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<RoomUplinkQuery>,
) -> impl IntoResponse {
    let room = query.room.unwrap_or_else(|| rooms::LIVEMAP.to_string());
    websocket_upgrade.on_upgrade(move |socket| handle_room_uplink(socket, state, room))
}

async fn handle_room_uplink(socket: WebSocket, state: AppState, room: String) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let mut subscription = state.broker.subscribe(&room);

    info!(room = %room, "⚡ [UPLINK_OPEN]: room socket established");

    let downstream_room = room.clone();
    let mut downstream_task = tokio::spawn(async move {
        let mut keepalive_timer = interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECONDS));
        loop {
            tokio::select! {
                _ = keepalive_timer.tick() => {
                    if socket_sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
                received = subscription.recv() => {
                    match received {
                        RoomRecv::Message(envelope) => {
                            let Ok(payload) = serde_json::to_string(&envelope) else { continue; };
                            if socket_sender.send(Message::Text(payload)).await.is_err() {
                                warn!(room = %downstream_room, "⚠️ [UPLINK_SEVERED]: client disconnected");
                                break;
                            }
                        }
                        RoomRecv::Lagged(missed) => {
                            warn!(room = %downstream_room, missed, "🐢 [UPLINK_LAG]: subscriber fell behind");
                            if subscription.should_drop() {
                                warn!(room = %downstream_room, "💀 [UPLINK_DROPPED]: too many consecutive lag events");
                                break;
                            }
                        }
                        RoomRecv::Closed => break,
                    }
                }
            }
        }
    });

    let upstream_room = room.clone();
    let mut upstream_task = tokio::spawn(async move {
        while let Some(received) = socket_receiver.next().await {
            match received {
                Ok(Message::Close(_)) => {
                    debug!(room = %upstream_room, "🔌 [SOCKET_CLOSE]: termination signal from client");
                    break;
                }
                Err(fault) => {
                    warn!(room = %upstream_room, "❌ [UPLINK_FAULT]: {}", fault);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut downstream_task => upstream_task.abort(),
        _ = &mut upstream_task => downstream_task.abort(),
    }

    info!(room = %room, "💀 [UPLINK_TERMINATED]: room socket closed");
}
