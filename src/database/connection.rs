use mongodb::{bson::doc, options::IndexOptions, Client, Database, IndexModel};

use crate::config::AppConfig;
use crate::models::otp::OtpChallenge;
use crate::models::user::User;

pub async fn get_db_client(config: &AppConfig) -> mongodb::error::Result<Database> {
    let client = Client::with_uri_str(&config.database_url).await?;
    let db = client.database(&config.database_name);

    db.run_command(doc! { "ping": 1 }).await?;
    tracing::info!("✅ Connected to database: {}", config.database_name);

    ensure_indexes(&db).await?;
    Ok(db)
}

/// Unique keys back the one-challenge-per-identifier and one-account-per-email rules.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let unique = || IndexOptions::builder().unique(true).build();

    db.collection::<OtpChallenge>(crate::database::challenges::COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "identifier": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    db.collection::<User>(crate::database::accounts::COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    tracing::debug!("indexes ensured");
    Ok(())
}
