use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payments are not configured")]
    Disabled,
    #[error("payment processor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment processor answered {status}: {message}")]
    Api { status: u16, message: String },
}

/// Customer record to create at the processor.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub user_id: i32,
    pub email: String,
    pub name: String,
}

/// Payment intent to create at the processor.
#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    /// Smallest currency unit.
    pub amount_cents: i64,
    pub currency: String,
    pub customer_id: String,
    pub registration_id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub description: String,
}

/// A created payment intent. The secret lets the client confirm the charge
/// directly with the processor.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Hosted payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a customer and return its processor id.
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String, GatewayError>;

    async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> Result<PaymentIntent, GatewayError>;
}

/// Gateway used when no processor key is configured. Every call fails.
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_customer(&self, _customer: &NewCustomer) -> Result<String, GatewayError> {
        Err(GatewayError::Disabled)
    }

    async fn create_payment_intent(
        &self,
        _intent: &NewPaymentIntent,
    ) -> Result<PaymentIntent, GatewayError> {
        Err(GatewayError::Disabled)
    }
}
