use chrono::Utc;
use common::{PaymentStatus, RegistrationStatus};
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entity::{category, payment, registration};
use crate::error::AppError;
use crate::models::registration::CreateRegistrationRequest;
use crate::utils::lookup::find_event;

/// Creates registrations. Callers run it inside a transaction so that the
/// slot decrement and both inserts commit or roll back together.
pub struct RegistrationService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> RegistrationService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Register `user_id` for an event category.
    ///
    /// Checks run in a fixed order: event exists, event is published, now is
    /// inside the registration window, category belongs to the event, a slot
    /// is free, the user has no registration for the event yet. The slot is
    /// then taken with a conditional decrement, so two requests racing for
    /// the last slot cannot both succeed.
    pub async fn create(
        &self,
        user_id: i32,
        payload: &CreateRegistrationRequest,
        currency: &str,
    ) -> Result<(registration::Model, payment::Model), AppError> {
        let event = find_event(self.conn, payload.event_id).await?;

        if !event.status.accepts_registrations() {
            return Err(AppError::InvalidState(
                "Event is not open for registration".into(),
            ));
        }
        let now = Utc::now();
        if now < event.registration_start || now > event.registration_end {
            return Err(AppError::InvalidState(
                "Registration is closed for this event".into(),
            ));
        }

        let category = category::Entity::find_by_id(payload.category_id)
            .filter(category::Column::EventId.eq(event.id))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

        let limited = category.max_slots.is_some();
        if limited && category.available_slots <= 0 {
            return Err(AppError::Conflict("No slots left in this category".into()));
        }

        let existing = registration::Entity::find()
            .filter(registration::Column::UserId.eq(user_id))
            .filter(registration::Column::EventId.eq(event.id))
            .one(self.conn)
            .await?;
        if existing.is_some() {
            return Err(already_registered());
        }

        if limited {
            let taken = category::Entity::update_many()
                .col_expr(
                    category::Column::AvailableSlots,
                    Expr::cust("available_slots - 1"),
                )
                .filter(category::Column::Id.eq(category.id))
                .filter(category::Column::AvailableSlots.gt(0))
                .exec(self.conn)
                .await?;
            if taken.rows_affected == 0 {
                return Err(AppError::Conflict("No slots left in this category".into()));
            }
        }

        let now = Utc::now();
        let new_registration = registration::ActiveModel {
            user_id: Set(user_id),
            event_id: Set(event.id),
            category_id: Set(category.id),
            status: Set(RegistrationStatus::Pending),
            bib_number: Set(None),
            emergency_contact: Set(trimmed(&payload.emergency_contact)),
            emergency_phone: Set(trimmed(&payload.emergency_phone)),
            medical_info: Set(trimmed(&payload.medical_info)),
            shirt_size: Set(payload.shirt_size),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let registration = new_registration
            .insert(self.conn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => already_registered(),
                _ => AppError::from(e),
            })?;

        let payment = payment::ActiveModel {
            registration_id: Set(registration.id),
            amount_cents: Set(category.price_cents),
            currency: Set(currency.to_string()),
            status: Set(PaymentStatus::Pending),
            payment_intent_id: Set(None),
            external_customer_id: Set(None),
            payment_method: Set(None),
            paid_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        tracing::info!(
            registration_id = registration.id,
            event_id = event.id,
            category_id = category.id,
            user_id,
            "Registration created"
        );

        Ok((registration, payment))
    }
}

fn already_registered() -> AppError {
    AppError::Conflict("You are already registered for this event".into())
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
