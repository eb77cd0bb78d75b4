use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::mailer::templates::{self, Confirmation};
use crate::models::payment::{CreatePaymentIntentRequest, PaymentIntentResponse, WebhookAck};
use crate::models::shared::ApiResponse;
use crate::payments::event::{PaymentEvent, WebhookEvent};
use crate::payments::signature::{self, SignatureError};
use crate::services::payment::{Approval, Confirmed, PaymentService};
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[utoipa::path(
    post,
    path = "/create-payment-intent",
    tag = "Payments",
    operation_id = "createPaymentIntent",
    summary = "Start checkout for a registration",
    description = "Only the registration owner may pay. The processor customer is created on first checkout and reused afterwards.",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = ApiResponse<PaymentIntentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the registration owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already paid (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Payment processor failure (EXTERNAL_SERVICE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, registration_id = payload.registration_id))]
pub async fn create_payment_intent(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePaymentIntentRequest>,
) -> Result<Json<ApiResponse<PaymentIntentResponse>>, AppError> {
    let intent = PaymentService::new(&state.db)
        .start_checkout(state.gateway.as_ref(), &auth_user, payload.registration_id)
        .await?;
    Ok(ApiResponse::ok(intent))
}

#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Payments",
    operation_id = "paymentWebhook",
    summary = "Payment processor webhook",
    description = "Verifies the `Stripe-Signature` header over the raw body before touching any state. \
        `payment_intent.succeeded` approves the payment and confirms the registration exactly once; \
        `payment_intent.payment_failed` rejects a pending payment. Other event types are acknowledged and ignored.",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Bad signature or payload (INVALID_SIGNATURE, VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::Missing)?;
    let payment = &state.config.payment;
    signature::verify(
        &body,
        header,
        &payment.webhook_secret,
        payment.webhook_tolerance_secs,
        Utc::now().timestamp(),
    )?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {e}")))?;
    let event_id = event.id.clone();
    let classified = event
        .classify()
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {e}")))?;

    match classified {
        PaymentEvent::Succeeded {
            intent_id,
            registration_id,
            payment_method,
        } => {
            let txn = state.db.begin().await?;
            let outcome = PaymentService::new(&txn)
                .approve(&intent_id, registration_id, payment_method)
                .await?;
            txn.commit().await?;

            match outcome {
                Approval::Applied(confirmed) => send_confirmation(&state, &confirmed).await,
                Approval::AlreadyApproved => {
                    tracing::info!(
                        event_id = %event_id,
                        intent_id = %intent_id,
                        "Payment already approved, replay ignored"
                    );
                }
                Approval::UnknownIntent => {
                    tracing::warn!(event_id = %event_id, intent_id = %intent_id, "No payment for intent");
                }
            }
        }
        PaymentEvent::Failed { intent_id } => {
            let txn = state.db.begin().await?;
            let rejected = PaymentService::new(&txn).reject(&intent_id).await?;
            txn.commit().await?;
            tracing::info!(event_id = %event_id, intent_id = %intent_id, rejected, "Payment failed");
        }
        PaymentEvent::Ignored(kind) => {
            tracing::debug!(event_id = %event_id, kind = %kind, "Ignoring webhook event");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

/// Best effort: the registration is already confirmed when this runs.
async fn send_confirmation(state: &AppState, c: &Confirmed) {
    let email = templates::registration_confirmed(&Confirmation {
        to: &c.user.email,
        participant_name: &c.user.name,
        event_title: &c.event.title,
        category_name: &c.category.name,
        start_date: c.event.start_date,
        city: &c.event.city,
        state: &c.event.state,
        amount_cents: c.payment.amount_cents,
        currency: &c.payment.currency,
        bib_number: c.registration.bib_number.as_deref(),
    });
    if let Err(e) = state.mailer.send(email).await {
        tracing::error!(
            registration_id = c.registration.id,
            error = %e,
            "Failed to send confirmation email"
        );
    }
}
