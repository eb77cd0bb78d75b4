use chrono::{DateTime, Utc};
use common::{EventStatus, EventType};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_text};
use crate::entity::{category, event};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "10K Open")]
    pub name: String,
    pub description: Option<String>,
    /// Price in minor currency units.
    #[schema(example = 12990)]
    pub price_cents: i64,
    /// Omit for unlimited slots.
    #[schema(example = 300)]
    pub max_slots: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    #[schema(example = "Recife Night Run")]
    pub title: String,
    pub description: String,
    #[serde(alias = "type")]
    pub event_type: EventType,
    /// Defaults to `DRAFT`.
    pub status: Option<EventStatus>,
    pub city: String,
    pub state: String,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub banner_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub categories: Vec<CreateCategoryRequest>,
}

fn check_dates(
    errors: &mut Vec<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    registration_start: DateTime<Utc>,
    registration_end: DateTime<Utc>,
) {
    if end_date < start_date {
        errors.push("end_date must not be before start_date".into());
    }
    if registration_start >= registration_end {
        errors.push("registration_start must be before registration_end".into());
    }
}

fn check_category(errors: &mut Vec<String>, index: usize, c: &CreateCategoryRequest) {
    if let Err(e) = validate_text(&c.name, "name", 1, 100) {
        errors.push(format!("categories[{index}].{e}"));
    }
    if c.price_cents < 0 {
        errors.push(format!("categories[{index}].price_cents must be >= 0"));
    }
    if let Some(slots) = c.max_slots
        && slots <= 0
    {
        errors.push(format!("categories[{index}].max_slots must be > 0"));
    }
}

/// Validate a new event, reporting every failing field at once.
pub fn validate_create_event(payload: &CreateEventRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    for (value, field, max) in [
        (&payload.title, "title", 200),
        (&payload.city, "city", 100),
        (&payload.state, "state", 50),
    ] {
        if let Err(e) = validate_text(value, field, 1, max) {
            errors.push(e);
        }
    }
    if payload.description.trim().is_empty() {
        errors.push("description must not be empty".into());
    }
    check_dates(
        &mut errors,
        payload.start_date,
        payload.end_date,
        payload.registration_start,
        payload.registration_end,
    );
    if let Some(max) = payload.max_participants
        && max <= 0
    {
        errors.push("max_participants must be > 0".into());
    }
    if payload.categories.is_empty() {
        errors.push("at least one category is required".into());
    }
    for (i, c) in payload.categories.iter().enumerate() {
        check_category(&mut errors, i, c);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationDetails("Invalid event".into(), errors))
    }
}

/// Partial event update. Any field may change at any status.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "type")]
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub venue: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub banner_url: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_participants: Option<Option<i32>>,
}

/// Validate an update against the stored event, so date checks see the merged values.
pub fn validate_update_event(
    payload: &UpdateEventRequest,
    current: &event::Model,
) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if let Some(title) = &payload.title
        && let Err(e) = validate_text(title, "title", 1, 200)
    {
        errors.push(e);
    }
    if let Some(city) = &payload.city
        && let Err(e) = validate_text(city, "city", 1, 100)
    {
        errors.push(e);
    }
    if let Some(state) = &payload.state
        && let Err(e) = validate_text(state, "state", 1, 50)
    {
        errors.push(e);
    }
    if let Some(Some(max)) = payload.max_participants
        && max <= 0
    {
        errors.push("max_participants must be > 0".into());
    }
    check_dates(
        &mut errors,
        payload.start_date.unwrap_or(current.start_date),
        payload.end_date.unwrap_or(current.end_date),
        payload.registration_start.unwrap_or(current.registration_start),
        payload.registration_end.unwrap_or(current.registration_end),
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationDetails("Invalid event".into(), errors))
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// Filter by sport.
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    /// Case-insensitive substring of the city.
    pub city: Option<String>,
    /// Defaults to `PUBLISHED`.
    pub status: Option<EventStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub max_slots: Option<i32>,
    pub available_slots: i32,
}

impl From<category::Model> for CategoryResponse {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            event_id: c.event_id,
            name: c.name,
            description: c.description,
            price_cents: c.price_cents,
            max_slots: c.max_slots,
            available_slots: c.available_slots,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub event_type: EventType,
    pub status: EventStatus,
    pub city: String,
    pub state: String,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub banner_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub organizer_id: i32,
    pub categories: Vec<CategoryResponse>,
    /// Registrations of any status.
    pub registration_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(e: event::Model, categories: Vec<category::Model>, registration_count: u64) -> Self {
        Self {
            id: e.id,
            title: e.title,
            slug: e.slug,
            description: e.description,
            event_type: e.event_type,
            status: e.status,
            city: e.city,
            state: e.state,
            venue: e.venue,
            address: e.address,
            banner_url: e.banner_url,
            start_date: e.start_date,
            end_date: e.end_date,
            registration_start: e.registration_start,
            registration_end: e.registration_end,
            max_participants: e.max_participants,
            current_participants: e.current_participants,
            organizer_id: e.organizer_id,
            categories: categories.into_iter().map(Into::into).collect(),
            registration_count,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Compact event view embedded in registration responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub status: EventStatus,
    pub start_date: DateTime<Utc>,
    pub city: String,
    pub state: String,
}

impl From<event::Model> for EventSummary {
    fn from(e: event::Model) -> Self {
        Self {
            id: e.id,
            title: e.title,
            slug: e.slug,
            status: e.status,
            start_date: e.start_date,
            city: e.city,
            state: e.state,
        }
    }
}
