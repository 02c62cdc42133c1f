//! Taskboard Server
//!
//! Task tracking API backed by SQLite, with a read-through task cache
//! (in-process or Redis) that is invalidated on every write.

mod cache;
mod config;
mod error;
mod extractors;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cache::{MemoryCache, RedisCache, TaskCache};
use crate::config::{CacheBackend, CacheConfig, Config};
use services::{AuthService, TaskService};
use storage::Database;

const CACHE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskService>,
    pub auth: Arc<AuthService>,
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // RUST_LOG wins; info otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Taskboard Server v{}", env!("CARGO_PKG_VERSION"));
    info!("PID: {}", std::process::id());

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    info!("Loading configuration...");
    let config = Config::load().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}, cache={}",
        config.server.bind_address, config.database.path, config.cache.backend
    );

    let db = Arc::new(
        Database::connect(&config.database)
            .await
            .context("Failed to initialize database")?,
    );

    let cache = build_cache(&config.cache).await?;

    info!("Initializing services...");
    let tasks = Arc::new(TaskService::new(db.clone(), cache, config.cache.timeout()));
    let auth = Arc::new(AuthService::new(
        db,
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl_hours,
    ));
    info!("Services initialized");

    let app = router(AppState { tasks, auth });

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server ready to accept connections");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build the configured cache backend.
///
/// A cache that cannot be reached leaves the server in store-only mode
/// unless `cache.required` is set.
async fn build_cache(config: &CacheConfig) -> Result<Option<Arc<dyn TaskCache>>> {
    info!("Initializing {} cache (ttl={:?})...", config.backend, config.ttl());

    let cache: Result<Arc<dyn TaskCache>, String> = match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new(config.ttl()))),
        CacheBackend::Redis => {
            match tokio::time::timeout(
                CACHE_CONNECT_TIMEOUT,
                RedisCache::connect(&config.redis_url, config.ttl()),
            )
            .await
            {
                Ok(Ok(redis)) => Ok(Arc::new(redis)),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!(
                    "connection timed out after {:?}",
                    CACHE_CONNECT_TIMEOUT
                )),
            }
        }
    };

    match cache {
        Ok(cache) => {
            info!("{} cache initialized", config.backend);
            Ok(Some(cache))
        }
        Err(e) if config.required => Err(anyhow::anyhow!(
            "{} cache unavailable and cache.required is set: {}",
            config.backend,
            e
        )),
        Err(e) => {
            warn!(
                "{} cache unavailable, serving from the database only: {}",
                config.backend, e
            );
            Ok(None)
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route(
            "/tasks",
            get(handlers::tasks::list).post(handlers::tasks::create),
        )
        .route(
            "/tasks/:id",
            get(handlers::tasks::get)
                .put(handlers::tasks::update)
                .delete(handlers::tasks::delete),
        )
        .route("/tasks/:id/comments", post(handlers::tasks::add_comment))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
