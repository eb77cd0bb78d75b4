use common::{EventStatus, EventType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub event_type: EventType,
    pub status: EventStatus,

    pub city: String,
    pub state: String,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub banner_url: Option<String>,

    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub registration_start: DateTimeUtc,
    pub registration_end: DateTimeUtc,

    pub max_participants: Option<i32>,
    /// Confirmed registrations. Only the payment webhook increments it.
    pub current_participants: i32,

    pub organizer_id: i32,
    #[sea_orm(belongs_to, from = "organizer_id", to = "id")]
    pub organizer: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub categories: HasMany<super::category::Entity>,

    #[sea_orm(has_many)]
    pub registrations: HasMany<super::registration::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
