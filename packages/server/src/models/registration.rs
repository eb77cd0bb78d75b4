use chrono::{DateTime, Utc};
use common::{PaymentStatus, RegistrationStatus, ShirtSize};
use serde::{Deserialize, Serialize};

use super::event::{CategoryResponse, EventSummary};
use super::payment::PaymentResponse;
use super::results::ResultResponse;
use super::shared::validate_text;
use crate::error::AppError;

/// Request body for registering to an event. camelCase keys are accepted too.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRegistrationRequest {
    #[serde(alias = "eventId")]
    #[schema(example = 3)]
    pub event_id: i32,
    #[serde(alias = "categoryId")]
    #[schema(example = 7)]
    pub category_id: i32,
    #[serde(default, alias = "emergencyContact")]
    pub emergency_contact: Option<String>,
    #[serde(default, alias = "emergencyPhone")]
    pub emergency_phone: Option<String>,
    #[serde(default, alias = "medicalInfo")]
    pub medical_info: Option<String>,
    #[serde(default, alias = "shirtSize")]
    pub shirt_size: Option<ShirtSize>,
}

pub fn validate_create_registration(payload: &CreateRegistrationRequest) -> Result<(), AppError> {
    if let Some(contact) = &payload.emergency_contact {
        validate_text(contact, "Emergency contact", 0, 100).map_err(AppError::Validation)?;
    }
    if let Some(phone) = &payload.emergency_phone {
        validate_text(phone, "Emergency phone", 0, 20).map_err(AppError::Validation)?;
    }
    if let Some(info) = &payload.medical_info {
        validate_text(info, "Medical info", 0, 2000).map_err(AppError::Validation)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegistrationResponse {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub category_id: i32,
    pub status: RegistrationStatus,
    pub bib_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_info: Option<String>,
    pub shirt_size: Option<ShirtSize>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::registration::Model> for RegistrationResponse {
    fn from(r: crate::entity::registration::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            event_id: r.event_id,
            category_id: r.category_id,
            status: r.status,
            bib_number: r.bib_number,
            emergency_contact: r.emergency_contact,
            emergency_phone: r.emergency_phone,
            medical_info: r.medical_info,
            shirt_size: r.shirt_size,
            created_at: r.created_at,
        }
    }
}

/// A new registration and its pending payment.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateRegistrationResponse {
    pub registration: RegistrationResponse,
    pub payment: PaymentResponse,
}

/// A registration joined with everything a participant needs to see.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegistrationDetail {
    #[serde(flatten)]
    pub registration: RegistrationResponse,
    pub event: EventSummary,
    pub category: CategoryResponse,
    pub payment: Option<PaymentResponse>,
    pub result: Option<ResultResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipantSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Query parameters for the caller's registration list.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistrationListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// One row of an organizer's registration list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventRegistrationItem {
    pub id: i32,
    pub status: RegistrationStatus,
    pub bib_number: Option<String>,
    pub shirt_size: Option<ShirtSize>,
    pub participant: ParticipantSummary,
    pub category_id: i32,
    pub category_name: String,
    pub payment_status: Option<PaymentStatus>,
    pub created_at: DateTime<Utc>,
}
