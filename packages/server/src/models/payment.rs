use chrono::{DateTime, Utc};
use common::PaymentStatus;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePaymentIntentRequest {
    #[serde(alias = "registrationId")]
    #[schema(example = 12)]
    pub registration_id: i32,
}

/// Secret the client hands to the processor's payment UI.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PaymentIntentResponse {
    #[schema(example = "pi_3Nx_secret_abc")]
    pub client_secret: String,
    #[schema(example = "pi_3Nx")]
    pub payment_intent_id: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub registration_id: i32,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<crate::entity::payment::Model> for PaymentResponse {
    fn from(p: crate::entity::payment::Model) -> Self {
        Self {
            id: p.id,
            registration_id: p.registration_id,
            amount_cents: p.amount_cents,
            currency: p.currency,
            status: p.status,
            payment_intent_id: p.payment_intent_id,
            payment_method: p.payment_method,
            paid_at: p.paid_at,
        }
    }
}

/// Acknowledgement returned to the processor.
#[derive(Serialize, utoipa::ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}
