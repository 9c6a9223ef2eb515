use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{Branch, Invitation, Tenant, User};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Tenants
    create_indexes(
        db,
        Tenant::COLLECTION,
        vec![
            index_unique(bson::doc! { "domain": 1 }),
            index(bson::doc! { "is_active": 1 }),
        ],
    )
    .await?;

    // Branches
    create_indexes(
        db,
        Branch::COLLECTION,
        vec![index(bson::doc! { "tenant_id": 1, "name": 1 })],
    )
    .await?;

    // Users: a missing tenant is stored as null, so tenant-less accounts share one bucket
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1, "tenant_id": 1 }),
            index(bson::doc! { "tenant_id": 1, "is_deleted": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Invitations
    create_indexes(
        db,
        Invitation::COLLECTION,
        vec![
            index_unique(bson::doc! { "token": 1 }),
            index(bson::doc! { "tenant_id": 1, "is_accepted": 1, "created_at": -1 }),
            index(bson::doc! { "invited_by": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
