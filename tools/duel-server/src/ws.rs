//! WebSocket transport (§6): wire protocol plus the `ws_handler`/
//! `handle_socket` pair, grounded on the teacher's `ClientMessage`/
//! `ServerMessage` tagged-enum skeleton and per-socket task split, widened
//! from one session per socket to a multi-battle room registry.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use duel_service::TurnService;
use duel_types::{BattleId, BattleRecord, NotifierEvent, PlayerId, Ruleset};

use crate::notifier::RoomRegistry;

#[derive(Clone)]
pub struct WsState {
    pub store: Arc<dyn duel_store::StateStore>,
    pub turn_service: Arc<TurnService>,
    pub rooms: Arc<RoomRegistry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientMessage {
    JoinBattle {
        battle_id: BattleId,
        player_id: PlayerId,
    },
    SubmitTurnAction {
        battle_id: BattleId,
        player_id: PlayerId,
        turn_index: u64,
        #[serde(flatten)]
        action: serde_json::Value,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Snapshot(BattleSnapshot),
    Event(&'a NotifierEvent),
    Error { message: String },
}

/// The read model a client gets on join and can otherwise reconstruct from
/// the `NotifierEvent` stream (§6).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BattleSnapshot {
    battle_id: BattleId,
    player_a_id: PlayerId,
    player_b_id: PlayerId,
    ruleset: Ruleset,
    phase: duel_types::Phase,
    turn_index: u64,
    deadline_utc: i64,
    no_action_streak_both: u32,
    last_resolved_turn_index: u64,
    version: u64,
    hp_a: f64,
    hp_b: f64,
}

impl From<&BattleRecord> for BattleSnapshot {
    fn from(record: &BattleRecord) -> Self {
        Self {
            battle_id: record.battle_id,
            player_a_id: record.player_a.player_id,
            player_b_id: record.player_b.player_id,
            ruleset: record.ruleset.clone(),
            phase: record.phase,
            turn_index: record.turn_index,
            deadline_utc: record.deadline_utc_ms,
            no_action_streak_both: record.no_action_streak_both,
            last_resolved_turn_index: record.last_resolved_turn_index,
            version: record.version,
            hp_a: record.player_a.current_hp,
            hp_b: record.player_b.current_hp,
        }
    }
}

pub async fn ws_handler(
    State(state): State<WsState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: WsState) {
    let (battle_id, player_id) = match wait_for_join(&mut socket, &state).await {
        Some(joined) => joined,
        None => return,
    };

    let mut events = state.rooms.subscribe(battle_id);
    let (mut sink, mut stream) = socket.split();

    let mut forward_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let text = match serde_json::to_string(&ServerMessage::Event(&event)) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%err, "failed to serialize notifier event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let turn_service = state.turn_service.clone();
    let mut intake_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let Ok(ClientMessage::SubmitTurnAction {
                battle_id: msg_battle_id,
                player_id: msg_player_id,
                turn_index,
                action,
            }) = serde_json::from_str::<ClientMessage>(&text)
            else {
                continue;
            };
            if msg_battle_id != battle_id || msg_player_id != player_id {
                continue;
            }
            let raw_payload = action.to_string();
            if let Err(err) = turn_service
                .submit_action(battle_id, player_id, turn_index, &raw_payload)
                .await
            {
                warn!(%err, battle_id = %battle_id, player_id = %player_id, "submit_action failed");
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => intake_task.abort(),
        _ = &mut intake_task => forward_task.abort(),
    }

    info!(battle_id = %battle_id, player_id = %player_id, "websocket session closed");
}

/// Blocks on the first message, which must be a well-formed `JoinBattle` for
/// a battle the player actually participates in. Anything else closes the
/// socket with an error frame.
async fn wait_for_join(socket: &mut WebSocket, state: &WsState) -> Option<(BattleId, PlayerId)> {
    let message = socket.recv().await?.ok()?;
    let Message::Text(text) = message else {
        let _ = socket
            .send(Message::Text(error_frame("first message must be JoinBattle").into()))
            .await;
        return None;
    };
    let ClientMessage::JoinBattle {
        battle_id,
        player_id,
    } = serde_json::from_str::<ClientMessage>(&text).ok()?
    else {
        let _ = socket
            .send(Message::Text(error_frame("first message must be JoinBattle").into()))
            .await;
        return None;
    };

    let state_record = match state.store.get_state(battle_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            let _ = socket
                .send(Message::Text(error_frame("battle not found").into()))
                .await;
            return None;
        }
        Err(err) => {
            warn!(%err, "state lookup failed during join");
            let _ = socket
                .send(Message::Text(error_frame("internal error").into()))
                .await;
            return None;
        }
    };
    if !state_record.is_participant(player_id) {
        let _ = socket
            .send(Message::Text(error_frame("not a participant in this battle").into()))
            .await;
        return None;
    }

    let snapshot = ServerMessage::Snapshot(BattleSnapshot::from(&state_record));
    if let Ok(text) = serde_json::to_string(&snapshot) {
        let _ = socket.send(Message::Text(text.into())).await;
    }

    Some((battle_id, player_id))
}

fn error_frame(message: &str) -> String {
    serde_json::to_string(&ServerMessage::Error {
        message: message.to_string(),
    })
    .unwrap_or_else(|_| "{\"type\":\"error\"}".to_string())
}
