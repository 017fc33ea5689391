use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use aegis_auth::middleware::AuthState;
use aegis_storage::{InMemoryUserStore, UserCache, UserStore};

use crate::cache::{CacheBackend, UserProfileCache};
use crate::config::{AppConfig, StorageBackend};
use crate::state::AppState;
use crate::users::{UserService, handlers};

pub struct AegisServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route(
            "/users/me",
            get(handlers::me)
                .put(handlers::update_me)
                .delete(handlers::delete_me),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Builds the storage, cache, and token services described by the config
/// and assembles the application state.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn UserStore> = match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, data will not survive a restart");
            Arc::new(InMemoryUserStore::new())
        }
        StorageBackend::Postgres => {
            let pg = cfg
                .storage
                .postgres
                .clone()
                .unwrap_or_default();
            let store = aegis_postgres::PostgresUserStore::connect(&pg.connection_url()).await?;
            store.ensure_schema().await?;
            tracing::info!(host = %pg.host, database = %pg.database, "connected to PostgreSQL");
            Arc::new(store)
        }
    };

    let backend = if cfg.redis.enabled {
        let pool = deadpool_redis::Config::from_url(&cfg.redis.url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))?;
        tracing::info!(url = %cfg.redis.url, "redis cache tier enabled");
        CacheBackend::new_redis(pool)
    } else {
        CacheBackend::new_local()
    };
    let cache: Arc<dyn UserCache> = Arc::new(UserProfileCache::new(backend));

    let jwt_service = Arc::new(cfg.auth.build_service()?);
    if cfg.auth.private_key_path.is_none() {
        tracing::warn!("no signing key configured, tokens will not survive a restart");
    }

    let service = Arc::new(UserService::new(store, cache));
    Ok(AppState::new(service, AuthState::new(jwt_service)))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<AegisServer> {
        let state = build_state(&self.config).await?;
        let app = build_app(&self.config, state);

        Ok(AegisServer {
            addr: self.addr,
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AegisServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
