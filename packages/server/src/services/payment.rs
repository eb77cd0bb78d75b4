use chrono::Utc;
use common::{NotificationStatus, NotificationType, PaymentStatus, RegistrationStatus};
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};

use crate::entity::{category, event, notification, payment, registration, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::payment::PaymentIntentResponse;
use crate::payments::gateway::{NewCustomer, NewPaymentIntent, PaymentGateway};
use crate::policy::Action;
use crate::utils::lookup::find_registration;

/// Everything the confirmation email needs, captured inside the transaction
/// that confirmed the registration.
#[derive(Debug)]
pub struct Confirmed {
    pub user: user::Model,
    pub event: event::Model,
    pub category: category::Model,
    pub payment: payment::Model,
    pub registration: registration::Model,
}

/// Result of applying a payment-succeeded event.
#[derive(Debug)]
pub enum Approval {
    /// This call moved the payment to `APPROVED`.
    Applied(Box<Confirmed>),
    /// The payment was already approved; nothing changed.
    AlreadyApproved,
    /// No local payment carries this intent id.
    UnknownIntent,
}

pub struct PaymentService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PaymentService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Create (or re-create) the processor payment intent for a registration.
    ///
    /// The processor customer is created once per user and reused afterwards.
    pub async fn start_checkout(
        &self,
        gateway: &dyn PaymentGateway,
        auth_user: &AuthUser,
        registration_id: i32,
    ) -> Result<PaymentIntentResponse, AppError> {
        let registration = find_registration(self.conn, registration_id).await?;
        auth_user.authorize(Action::PayRegistration {
            owner_id: registration.user_id,
        })?;

        let payment = payment::Entity::find()
            .filter(payment::Column::RegistrationId.eq(registration.id))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;
        if payment.status.is_final() {
            return Err(AppError::Conflict("Registration is already paid".into()));
        }

        let user = user::Entity::find_by_id(registration.user_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        let event = event::Entity::find_by_id(registration.event_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

        let customer_id = self.ensure_customer(gateway, &user).await?;

        let intent = gateway
            .create_payment_intent(&NewPaymentIntent {
                amount_cents: payment.amount_cents,
                currency: payment.currency.clone(),
                customer_id: customer_id.clone(),
                registration_id: registration.id,
                event_id: event.id,
                user_id: user.id,
                description: format!("Registration #{} - {}", registration.id, event.title),
            })
            .await?;

        let mut active: payment::ActiveModel = payment.into();
        active.payment_intent_id = Set(Some(intent.id.clone()));
        active.external_customer_id = Set(Some(customer_id));
        active.updated_at = Set(Utc::now());
        active.update(self.conn).await?;

        tracing::info!(
            registration_id = registration.id,
            payment_intent_id = %intent.id,
            "Payment intent created"
        );

        Ok(PaymentIntentResponse {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
        })
    }

    /// Return the user's processor customer id, creating it on first use.
    async fn ensure_customer(
        &self,
        gateway: &dyn PaymentGateway,
        user: &user::Model,
    ) -> Result<String, AppError> {
        if let Some(id) = &user.external_customer_id {
            return Ok(id.clone());
        }

        let created = gateway
            .create_customer(&NewCustomer {
                user_id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
            })
            .await?;

        // Only the first concurrent checkout stores its customer.
        let stored = user::Entity::update_many()
            .col_expr(user::Column::ExternalCustomerId, Expr::value(created.clone()))
            .filter(user::Column::Id.eq(user.id))
            .filter(user::Column::ExternalCustomerId.is_null())
            .exec(self.conn)
            .await?;
        if stored.rows_affected == 1 {
            return Ok(created);
        }

        user::Entity::find_by_id(user.id)
            .one(self.conn)
            .await?
            .and_then(|u| u.external_customer_id)
            .ok_or_else(|| AppError::Internal("customer id vanished after update".into()))
    }

    /// Apply a payment-succeeded event for `intent_id`.
    ///
    /// Must run inside a transaction. The payment is found by intent id, or
    /// by the `registration_id` from the intent metadata when checkout was
    /// restarted and a superseded intent got paid. It is then flipped with a
    /// conditional update, so only the first delivery of an event confirms
    /// the registration, bumps the participant counter, assigns the bib and
    /// records the notification. Replays return [`Approval::AlreadyApproved`].
    pub async fn approve(
        &self,
        intent_id: &str,
        registration_id: Option<i32>,
        payment_method: Option<String>,
    ) -> Result<Approval, AppError> {
        let Some(payment) = self.find_for_intent(intent_id, registration_id).await? else {
            return Ok(Approval::UnknownIntent);
        };

        let now = Utc::now();
        let flipped = payment::Entity::update_many()
            .col_expr(payment::Column::Status, Expr::value(PaymentStatus::Approved.as_str()))
            .col_expr(payment::Column::PaymentIntentId, Expr::value(intent_id))
            .col_expr(payment::Column::PaidAt, Expr::value(now))
            .col_expr(payment::Column::PaymentMethod, Expr::value(payment_method))
            .col_expr(payment::Column::UpdatedAt, Expr::value(now))
            .filter(payment::Column::Id.eq(payment.id))
            .filter(payment::Column::Status.ne(PaymentStatus::Approved))
            .exec(self.conn)
            .await?;
        if flipped.rows_affected == 0 {
            return Ok(Approval::AlreadyApproved);
        }
        let payment = payment::Entity::find_by_id(payment.id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("approved payment missing".into()))?;

        let registration = find_registration(self.conn, payment.registration_id).await?;

        event::Entity::update_many()
            .col_expr(
                event::Column::CurrentParticipants,
                Expr::cust("current_participants + 1"),
            )
            .col_expr(event::Column::UpdatedAt, Expr::value(now))
            .filter(event::Column::Id.eq(registration.event_id))
            .exec(self.conn)
            .await?;
        // The row stays locked by the update above until commit, so the
        // counter read here is the value this transaction produced.
        let event = event::Entity::find_by_id(registration.event_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("event of registration missing".into()))?;

        let mut active: registration::ActiveModel = registration.into();
        active.status = Set(RegistrationStatus::Confirmed);
        active.bib_number = Set(Some(event.current_participants.to_string()));
        active.updated_at = Set(now);
        let registration = active.update(self.conn).await?;

        notification::ActiveModel {
            user_id: Set(registration.user_id),
            kind: Set(NotificationType::InApp),
            title: Set("Registration confirmed!".to_string()),
            message: Set(format!(
                "Your registration for {} is confirmed.",
                event.title
            )),
            status: Set(NotificationStatus::Sent),
            metadata: Set(Some(serde_json::json!({
                "registration_id": registration.id,
                "event_id": event.id,
            }))),
            sent_at: Set(Some(now)),
            read_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        let user = user::Entity::find_by_id(registration.user_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("owner of registration missing".into()))?;
        let category = category::Entity::find_by_id(registration.category_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::Internal("category of registration missing".into()))?;

        tracing::info!(
            payment_id = payment.id,
            registration_id = registration.id,
            bib_number = ?registration.bib_number,
            "Payment approved"
        );

        Ok(Approval::Applied(Box::new(Confirmed {
            user,
            event,
            category,
            payment,
            registration,
        })))
    }

    async fn find_for_intent(
        &self,
        intent_id: &str,
        registration_id: Option<i32>,
    ) -> Result<Option<payment::Model>, AppError> {
        let by_intent = payment::Entity::find()
            .filter(payment::Column::PaymentIntentId.eq(intent_id))
            .one(self.conn)
            .await?;
        if by_intent.is_some() {
            return Ok(by_intent);
        }
        let Some(registration_id) = registration_id else {
            return Ok(None);
        };

        let by_registration = payment::Entity::find()
            .filter(payment::Column::RegistrationId.eq(registration_id))
            .one(self.conn)
            .await?;
        if let Some(payment) = &by_registration {
            tracing::info!(
                payment_id = payment.id,
                registration_id,
                intent_id,
                stored_intent_id = ?payment.payment_intent_id,
                "Matched payment through intent metadata"
            );
        }
        Ok(by_registration)
    }

    /// Apply a payment-failed event. Only pending payments move to `REJECTED`.
    ///
    /// Returns whether a payment changed.
    pub async fn reject(&self, intent_id: &str) -> Result<bool, AppError> {
        let res = payment::Entity::update_many()
            .col_expr(payment::Column::Status, Expr::value(PaymentStatus::Rejected.as_str()))
            .col_expr(payment::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(payment::Column::PaymentIntentId.eq(intent_id))
            .filter(payment::Column::Status.eq(PaymentStatus::Pending))
            .exec(self.conn)
            .await?;
        if res.rows_affected > 0 {
            tracing::info!(payment_intent_id = intent_id, "Payment rejected");
        }
        Ok(res.rows_affected > 0)
    }
}
