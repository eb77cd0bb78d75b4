use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

use super::gateway::{GatewayError, NewCustomer, NewPaymentIntent, PaymentGateway, PaymentIntent};

/// Stripe REST client. Requests are form encoded and authenticated with the secret key.
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Deserialize)]
struct PaymentIntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let res = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;
        decode(res).await
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(res: Response) -> Result<T, GatewayError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json::<T>().await?);
    }
    let message = match res.json::<ErrorEnvelope>().await {
        Ok(ErrorEnvelope { error }) => match (error.kind, error.message) {
            (Some(kind), Some(message)) => format!("{kind}: {message}"),
            (_, Some(message)) => message,
            (Some(kind), None) => kind,
            (None, None) => "unknown error".to_string(),
        },
        Err(_) => "unreadable error body".to_string(),
    };
    Err(GatewayError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String, GatewayError> {
        let form = [
            ("email", customer.email.clone()),
            ("name", customer.name.clone()),
            ("metadata[user_id]", customer.user_id.to_string()),
        ];
        let created: CustomerResponse = self.post_form("/v1/customers", &form).await?;
        tracing::info!(user_id = customer.user_id, customer_id = %created.id, "Created processor customer");
        Ok(created.id)
    }

    async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> Result<PaymentIntent, GatewayError> {
        let form = [
            ("amount", intent.amount_cents.to_string()),
            ("currency", intent.currency.clone()),
            ("customer", intent.customer_id.clone()),
            ("description", intent.description.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[registration_id]", intent.registration_id.to_string()),
            ("metadata[event_id]", intent.event_id.to_string()),
            ("metadata[user_id]", intent.user_id.to_string()),
        ];
        let created: PaymentIntentResponse = self.post_form("/v1/payment_intents", &form).await?;
        Ok(PaymentIntent {
            id: created.id,
            client_secret: created.client_secret,
        })
    }
}
