use chrono::{DateTime, Utc};
use common::ResultStatus;
use serde::{Deserialize, Serialize};

/// Outcome of a results import.
#[derive(Serialize, utoipa::ToSchema, Debug)]
pub struct ImportSummary {
    #[schema(example = 10)]
    pub created: u64,
    #[schema(example = 0)]
    pub updated: u64,
    /// `created + updated`.
    #[schema(example = 10)]
    pub total: u64,
    /// One message per rejected row. Omitted when every row applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ResultResponse {
    pub id: i32,
    pub registration_id: i32,
    pub position: Option<i32>,
    pub category_position: Option<i32>,
    pub time: Option<String>,
    pub pace: Option<String>,
    pub status: ResultStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::race_result::Model> for ResultResponse {
    fn from(r: crate::entity::race_result::Model) -> Self {
        Self {
            id: r.id,
            registration_id: r.registration_id,
            position: r.position,
            category_position: r.category_position,
            time: r.time,
            pace: r.pace,
            status: r.status,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultsQuery {
    /// Restrict to one category.
    #[serde(alias = "categoryId")]
    pub category_id: Option<i32>,
}

/// Public leaderboard row.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResultItem {
    pub position: Option<i32>,
    pub category_position: Option<i32>,
    pub time: Option<String>,
    pub pace: Option<String>,
    pub status: ResultStatus,
    pub bib_number: Option<String>,
    pub participant_name: String,
    pub category_id: i32,
    pub category_name: String,
}
