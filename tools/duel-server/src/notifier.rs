//! `Notifier` adapter (C8) fanning out into per-battle broadcast channels.
//! Grounded on the teacher's single in-process `GameSession` push path,
//! generalized from one socket to a room of subscribers per battle.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use duel_service::ports::Notifier;
use duel_types::{BattleId, NotifierEvent};

const ROOM_CAPACITY: usize = 256;

/// Registry of per-battle broadcast rooms. Channels are created lazily on
/// first subscribe or first push and are never explicitly torn down — an
/// idle room with no subscribers just drops events on the floor.
pub struct RoomRegistry {
    rooms: DashMap<BattleId, broadcast::Sender<NotifierEvent>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn subscribe(&self, battle_id: BattleId) -> broadcast::Receiver<NotifierEvent> {
        self.rooms
            .entry(battle_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WsNotifier {
    rooms: std::sync::Arc<RoomRegistry>,
}

impl WsNotifier {
    pub fn new(rooms: std::sync::Arc<RoomRegistry>) -> Self {
        Self { rooms }
    }
}

#[async_trait]
impl Notifier for WsNotifier {
    async fn push(&self, battle_id: BattleId, event: NotifierEvent) {
        let sender = self
            .rooms
            .rooms
            .entry(battle_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone();
        // No subscribers is not an error — a battle with nobody connected
        // still needs its state transitions pushed through.
        if sender.send(event).is_err() {
            trace!(battle_id = %battle_id, "no subscribers for notifier event");
        }
    }
}
