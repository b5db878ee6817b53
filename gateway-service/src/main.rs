use std::sync::Arc;

use gateway_service::admission::AdmissionController;
use gateway_service::capture::CaptureChannel;
use gateway_service::config::Config;
use gateway_service::dispatch::Dispatcher;
use gateway_service::error::AppError;
use gateway_service::guild_index::GuildIndex;
use gateway_service::hashing::hash_token;
use gateway_service::ingress::EventIngress;
use gateway_service::platform::null::{NullConnector, NullShardManager};
use gateway_service::platform::{SessionConnector, ShardManager};
use gateway_service::registry::IdentityRegistry;
use gateway_service::state::AppState;
use gateway_service::{logging, routes};
use kv_store::KvStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();
    let cfg = Arc::new(Config::from_env()?);

    let kv = if cfg.test_mode {
        KvStore::in_memory()
    } else {
        KvStore::connect(&cfg.redis_addr, &cfg.redis_user, &cfg.redis_pass)
            .await
            .map_err(|e| AppError::StartServer(format!("store: {e}")))?
    };

    // The platform SDK adapter plugs in here: implement SessionConnector and
    // ShardManager over the SDK and swap these two lines.
    let connector: Arc<dyn SessionConnector> = Arc::new(NullConnector);
    let shards: Arc<dyn ShardManager> = Arc::new(NullShardManager::new());

    let index = GuildIndex::new(kv.clone());
    let ingress = Arc::new(EventIngress::new(
        kv.clone(),
        index.clone(),
        hash_token(&cfg.bot_token),
        shards.user_id(),
    ));
    shards.add_handler(ingress);

    let registry = Arc::new(IdentityRegistry::new(
        kv.clone(),
        index.clone(),
        connector,
        shards.clone(),
    ));
    registry.load_worker_tokens(&cfg.worker_bot_tokens).await;

    let admission = AdmissionController::new(
        kv.clone(),
        cfg.max_requests_per_window,
        cfg.admission_window,
    );
    let capture = CaptureChannel::new(kv.clone());
    let dispatcher = Arc::new(Dispatcher::new(
        registry.clone(),
        index,
        admission,
        capture.clone(),
        shards.clone(),
        cfg.max_secondary_workers,
        cfg.capture_ack_timeout,
    ));

    let state = AppState {
        kv,
        dispatcher,
        capture,
        shards,
        config: cfg.clone(),
    };

    let app = routes::build_router().with_state(state);
    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::StartServer(format!("bind {bind_addr}: {e}")))?;
    tracing::info!(%bind_addr, "gateway is running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::StartServer(format!("serve: {e}")))?;

    tracing::info!("shutting down; closing sessions");
    registry.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
