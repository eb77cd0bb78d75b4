use common::Role;
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_text};
use crate::error::AppError;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminUserQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Substring of name or email.
    pub search: Option<String>,
    pub role: Option<Role>,
}

/// Account edit by an administrator. `null` clears `phone` or `cpf`.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cpf: Option<Option<String>>,
}

pub fn validate_admin_update(payload: &AdminUpdateUserRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_text(name, "Name", 2, 100).map_err(AppError::Validation)?;
    }
    if let Some(Some(phone)) = &payload.phone {
        validate_text(phone, "Phone", 8, 20).map_err(AppError::Validation)?;
    }
    Ok(())
}

/// Dashboard counters.
#[derive(Serialize, utoipa::ToSchema, Debug, PartialEq, Eq)]
pub struct StatsResponse {
    pub total_users: u64,
    pub total_organizers: u64,
    pub total_events: u64,
    pub published_events: u64,
    pub total_registrations: u64,
    pub confirmed_registrations: u64,
    pub pending_registrations: u64,
    /// Sum of approved payments, minor units.
    pub approved_revenue_cents: i64,
}
