use serde::Deserialize;

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// Envelope of a processor webhook delivery. Only trusted after signature verification.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    #[serde(default)]
    payment_method_types: Vec<String>,
    #[serde(default)]
    metadata: IntentMetadata,
}

/// Metadata attached at intent creation. The processor echoes values back as strings.
#[derive(Debug, Default, Deserialize)]
struct IntentMetadata {
    #[serde(default)]
    registration_id: Option<String>,
}

/// What a webhook event means for local payment state.
#[derive(Debug, PartialEq, Eq)]
pub enum PaymentEvent {
    Succeeded {
        intent_id: String,
        /// Registration named in the intent metadata, when present and numeric.
        registration_id: Option<i32>,
        payment_method: Option<String>,
    },
    Failed {
        intent_id: String,
    },
    Ignored(String),
}

impl WebhookEvent {
    pub fn classify(self) -> Result<PaymentEvent, serde_json::Error> {
        match self.kind.as_str() {
            PAYMENT_SUCCEEDED => {
                let intent: PaymentIntentObject = serde_json::from_value(self.data.object)?;
                Ok(PaymentEvent::Succeeded {
                    registration_id: intent
                        .metadata
                        .registration_id
                        .and_then(|id| id.trim().parse().ok()),
                    intent_id: intent.id,
                    payment_method: intent.payment_method_types.into_iter().next(),
                })
            }
            PAYMENT_FAILED => {
                let intent: PaymentIntentObject = serde_json::from_value(self.data.object)?;
                Ok(PaymentEvent::Failed {
                    intent_id: intent.id,
                })
            }
            _ => Ok(PaymentEvent::Ignored(self.kind)),
        }
    }
}
