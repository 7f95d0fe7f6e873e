use mongodb::{
    bson::doc,
    options::IndexOptions,
    Client, Database, IndexModel,
};
use std::env;
use tracing::{info, warn};

use crate::models::{
    category::WasteCategory, impact::RecyclingImpact, transaction::Transaction, user::User,
};

pub async fn get_db_client() -> Database {
    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set as an environment variable");

    let client = Client::with_uri_str(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_name = env::var("DATABASE_NAME").unwrap_or_else(|_| "ecocycle".to_string());
    let db = client.database(&db_name);

    match db.list_collection_names().await {
        Ok(collections) => {
            info!("✅ Connected to database: {}", db_name);
            info!("📂 Collections found: {:?}", collections);
        }
        Err(e) => {
            warn!("❌ Database '{}' may not exist or is inaccessible: {}", db_name, e);
        }
    }

    db
}

/// Unique indexes backing the model's 1:1 and uniqueness constraints.
/// In particular transactions.pickup_id is what makes the completion-time
/// upsert safe against concurrent duplicates.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let unique = IndexOptions::builder().unique(true).build();

    db.collection::<User>("users")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    db.collection::<User>("users")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    db.collection::<WasteCategory>("waste_categories")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    db.collection::<Transaction>("transactions")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "pickup_id": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    db.collection::<RecyclingImpact>("recycling_impacts")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "user_id": 1 })
                .options(unique)
                .build(),
        )
        .await?;

    info!("✅ Unique indexes ensured");
    Ok(())
}
