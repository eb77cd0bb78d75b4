use common::PaymentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Copied from the category price when the registration is created.
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,

    /// Processor payment intent id. Webhook events are keyed on it.
    #[sea_orm(unique)]
    pub payment_intent_id: Option<String>,
    pub external_customer_id: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTimeUtc>,

    #[sea_orm(unique)]
    pub registration_id: i32,
    #[sea_orm(belongs_to, from = "registration_id", to = "id")]
    pub registration: HasOne<super::registration::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
