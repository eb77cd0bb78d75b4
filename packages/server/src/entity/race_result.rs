use common::ResultStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "race_result")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub position: Option<i32>,
    pub category_position: Option<i32>,
    /// Elapsed time as written in the results file, e.g. `00:42:17`.
    pub time: Option<String>,
    pub pace: Option<String>,
    pub status: ResultStatus,

    #[sea_orm(unique)]
    pub registration_id: i32,
    #[sea_orm(belongs_to, from = "registration_id", to = "id")]
    pub registration: HasOne<super::registration::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
