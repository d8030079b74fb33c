use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use storefront_api::config::AppConfig;
use storefront_api::database::{connection::get_db_client, MongoAccountStore, MongoChallengeStore};
use storefront_api::services::{
    clock::SystemClock, housekeeping::spawn_purge_task, mail_service::channel_from_config,
    password::BcryptHasher,
};
use storefront_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    tracing::info!("🔧 Configuration: {}", config.get_config_info());

    let db = get_db_client(&config)
        .await
        .context("failed to connect to MongoDB")?;

    let app_state = AppState::new(
        Arc::new(MongoAccountStore::new(db.clone())),
        Arc::new(MongoChallengeStore::new(&db)),
        channel_from_config(&config.mail),
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        Arc::new(SystemClock),
        config.reset.clone(),
        config.jwt_secret.as_str(),
    );

    spawn_purge_task(
        app_state.password_reset.clone(),
        Duration::from_secs(config.purge_interval_secs),
    );

    let app = build_router(app_state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("🚀 Server starting on {}", addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
