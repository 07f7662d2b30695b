//! Real-time transport for the duel battle engine.
//!
//! Protocol:
//! - Client sends JSON messages, server responds with a snapshot plus a
//!   stream of notifier events.
//! - Each WS connection joins exactly one battle.
//!
//! Client → Server messages:
//!   { "type": "joinBattle", "battleId": "...", "playerId": "..." }
//!   { "type": "submitTurnAction", "battleId": "...", "playerId": "...", "turnIndex": 3, "attackZone": "head" }
//!
//! Server → Client messages:
//!   { "type": "snapshot", ... }
//!   { "type": "event", ... }
//!   { "type": "error", "message": "..." }
//!
//! `POST /battles` is a stand-in for the out-of-scope `BattleCreated`
//! integration-bus consumer (§1, §4.4) so the server is runnable standalone
//! without a real event bus in front of it.

mod bus;
mod notifier;
mod profile;
mod ws;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use duel_service::ports::{StaticBalanceProvider, SystemClock};
use duel_service::{AppConfig, BattleCreatedEvent, LifecycleService, TurnService};
use duel_store::{RedisStateStore, StoreConfig};
use duel_types::{PlayerStats, RulesetDescriptor};

use bus::TracingEventPublisher;
use notifier::{RoomRegistry, WsNotifier};
use profile::ConfigProfileSource;
use ws::{ws_handler, WsState};

#[derive(Clone)]
struct AppState {
    lifecycle: Arc<LifecycleService>,
}

async fn health() -> &'static str {
    "duel-server ok"
}

async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html><head><title>Duel Server</title></head>
<body>
<h1>Duel battle server</h1>
<p>Connect via WebSocket at <code>/ws</code>; create a battle with <code>POST /battles</code>.</p>
<pre>
const ws = new WebSocket("ws://localhost:3030/ws");
ws.onmessage = (e) => console.log(JSON.parse(e.data));
ws.onopen = () => ws.send(JSON.stringify({ type: "joinBattle", battleId: "...", playerId: "..." }));
</pre>
</body></html>"#,
    )
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBattleRequest {
    battle_id: duel_types::BattleId,
    match_id: duel_types::MatchId,
    player_a_id: duel_types::PlayerId,
    player_b_id: duel_types::PlayerId,
    #[serde(default)]
    ruleset: RulesetDescriptor,
}

async fn create_battle(
    State(state): State<AppState>,
    Json(request): Json<CreateBattleRequest>,
) -> impl IntoResponse {
    let event = BattleCreatedEvent {
        battle_id: request.battle_id,
        match_id: request.match_id,
        player_a_id: request.player_a_id,
        player_b_id: request.player_b_id,
        ruleset: request.ruleset,
    };
    match state.lifecycle.handle_battle_created(event).await {
        Ok(()) => (axum::http::StatusCode::ACCEPTED, "accepted").into_response(),
        Err(err) => {
            tracing::error!(%err, "handle_battle_created failed");
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = std::env::var("DUEL_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("duel.toml"));
    let config = AppConfig::load(&config_path).unwrap_or_else(|err| {
        eprintln!("failed to load config at {}: {err}", config_path.display());
        std::process::exit(1);
    });

    let store_config = StoreConfig {
        action_ttl_secs: config.store.action_ttl_secs,
        deadline_skew_delay_ms: config.deadline_worker.deadline_skew_delay_ms,
    };
    let store: Arc<dyn duel_store::StateStore> = Arc::new(
        RedisStateStore::connect(&config.store.redis_url, store_config)
            .await
            .unwrap_or_else(|err| {
                eprintln!("failed to connect to redis at {}: {err}", config.store.redis_url);
                std::process::exit(1);
            }),
    );

    let rooms = Arc::new(RoomRegistry::new());
    let notifier: Arc<dyn duel_service::ports::Notifier> = Arc::new(WsNotifier::new(rooms.clone()));
    let publisher: Arc<dyn duel_service::ports::EventPublisher> = Arc::new(TracingEventPublisher);
    let clock: Arc<dyn duel_service::ports::Clock> = Arc::new(SystemClock);
    let balance_provider: Arc<dyn duel_service::ports::BalanceProvider> =
        Arc::new(StaticBalanceProvider::new(config.combat_balance));
    let profiles: Arc<dyn duel_service::ports::ProfileSource> = Arc::new(ConfigProfileSource::new(PlayerStats {
        strength: 10.0,
        stamina: 10.0,
        agility: 10.0,
        intellect: 10.0,
    }));

    let lifecycle = Arc::new(LifecycleService::new(
        store.clone(),
        notifier.clone(),
        profiles,
        clock.clone(),
        balance_provider,
    ));
    let turn_service = Arc::new(TurnService::new(
        store.clone(),
        notifier,
        publisher,
        clock.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let deadline_worker = duel_service::DeadlineWorker::new(
        store.clone(),
        turn_service.clone(),
        clock,
        config.deadline_worker,
    );
    tokio::spawn(async move {
        deadline_worker.run(shutdown_rx).await;
    });

    let ws_state = WsState {
        store,
        turn_service,
        rooms,
    };
    let app_state = AppState { lifecycle };

    let battles_router = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/battles", post(create_battle))
        .with_state(app_state);
    let ws_router = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(ws_state);

    let app = battles_router.merge(ws_router).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .unwrap_or_else(|err| {
            eprintln!("failed to bind to {}: {err}", config.server.bind_addr);
            std::process::exit(1);
        });
    tracing::info!(addr = %config.server.bind_addr, "duel-server listening");

    axum::serve(listener, app).await.unwrap();
    let _ = shutdown_tx.send(true);
}
