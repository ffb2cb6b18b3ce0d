use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, DatabaseConfig, ExploreConfig, ServerConfig};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::conversation::{ConversationStore, SeaOrmConversationStore};

use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Config from `config.toml` (or `CONFIG_PATH`); without one, fall back to
/// `SERVER_HOST`/`SERVER_PORT`/`DATABASE_URL` and default listing settings.
fn load_config() -> anyhow::Result<AppConfig> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(error = %e, "config file unavailable; using environment");
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8081);
            let cfg = AppConfig {
                server: ServerConfig { host, port, worker_threads: None },
                database: DatabaseConfig::from_env(),
                explore: ExploreConfig::default(),
            };
            cfg.database.validate()?;
            Ok(cfg)
        }
    }
}

fn bind_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", server.host, server.port).parse()?)
}

/// Public entry: connect, migrate, warm the snapshots and serve.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = load_config()?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None).await?;

    let store: Arc<dyn ConversationStore> = Arc::new(SeaOrmConversationStore::new(db));
    let state = AppState::new(store, &cfg.explore);

    // Requests still build inline if warming fails.
    if let Err(e) = state.snapshots.warm().await {
        warn!(error = %e, "initial snapshot build failed");
    }

    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg.server)?;
    info!(%addr, page_size = cfg.explore.page_size, revalidate_secs = cfg.explore.revalidate_secs, "starting explore server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
