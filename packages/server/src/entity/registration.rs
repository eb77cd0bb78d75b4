use common::{RegistrationStatus, ShirtSize};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unique per (user_id, event_id) and per (event_id, bib_number); see `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registration")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub status: RegistrationStatus,
    /// Assigned when the payment is approved.
    pub bib_number: Option<String>,

    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub medical_info: Option<String>,
    pub shirt_size: Option<ShirtSize>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub event_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,

    pub category_id: i32,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    #[sea_orm(has_one)]
    pub payment: HasOne<super::payment::Entity>,

    #[sea_orm(has_one)]
    pub result: HasOne<super::race_result::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
