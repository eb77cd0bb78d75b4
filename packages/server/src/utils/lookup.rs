use sea_orm::{ConnectionTrait, EntityTrait};

use crate::entity::{event, registration};
use crate::error::AppError;

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up a registration by ID, returning 404 if not found.
pub async fn find_registration<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<registration::Model, AppError> {
    registration::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found".into()))
}
