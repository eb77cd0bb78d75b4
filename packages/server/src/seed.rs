use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{category, notification, registration};

/// Create the composite indexes that schema sync cannot express.
///
/// The two unique indexes back invariants the services rely on, so failing
/// to create them aborts startup. The others only speed up lookups.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One registration per user and event.
    create(
        db,
        "uq_registration_user_event",
        Index::create()
            .unique()
            .table(registration::Entity)
            .col(registration::Column::UserId)
            .col(registration::Column::EventId),
        true,
    )
    .await?;

    // Bib numbers are unique within an event. NULL bibs don't collide.
    create(
        db,
        "uq_registration_event_bib",
        Index::create()
            .unique()
            .table(registration::Entity)
            .col(registration::Column::EventId)
            .col(registration::Column::BibNumber),
        true,
    )
    .await?;

    create(
        db,
        "idx_category_event",
        Index::create()
            .table(category::Entity)
            .col(category::Column::EventId),
        false,
    )
    .await?;

    // Notification list: WHERE user_id = ? ORDER BY created_at DESC
    create(
        db,
        "idx_notification_user_created",
        Index::create()
            .table(notification::Entity)
            .col(notification::Column::UserId)
            .col(notification::Column::CreatedAt),
        false,
    )
    .await?;

    Ok(())
}

async fn create(
    db: &DatabaseConnection,
    name: &str,
    stmt: &mut IndexCreateStatement,
    required: bool,
) -> Result<(), DbErr> {
    let sql = stmt
        .if_not_exists()
        .name(name)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&sql).await {
        Ok(_) => {
            info!("Ensured index {} exists", name);
            Ok(())
        }
        Err(e) if required => Err(e),
        Err(e) => {
            tracing::warn!("Failed to create index {}: {}", name, e);
            Ok(())
        }
    }
}
