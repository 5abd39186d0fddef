mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod models;
mod routes;
mod service;

use std::sync::Arc;

use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::{DBClient, RewardsStore};
use dotenv::dotenv;
use routes::create_router;
use service::{
    quest_checker::QuestCheckerRegistry, rewards_engine::RewardsEngine,
    telegram_checker::TelegramClient,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<RewardsEngine>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();
    tracing::debug!("Loaded configuration: {:?}", config);

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn RewardsStore> =
        Arc::new(DBClient::new(pool).with_query_timeout(config.query_timeout));

    let telegram = match TelegramClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            tracing::error!("🔥 Failed to build the telegram client: {:?}", err);
            std::process::exit(1);
        }
    };

    let registry = QuestCheckerRegistry::with_defaults(
        store.clone(),
        telegram,
        &config.telegram_group_chat_id,
        &config.self_attested_quests,
    );
    tracing::info!("Quest checkers: {:?}", registry);

    let engine = RewardsEngine::new(store, Arc::new(registry), &config.rewards);

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST]);

    let app_state = AppState {
        engine: Arc::new(engine),
    };

    let app = create_router(Arc::new(app_state)).layer(cors);

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("🔥 Server error: {:?}", err);
        std::process::exit(1);
    }
}
