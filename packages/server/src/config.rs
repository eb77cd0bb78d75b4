use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued session tokens.
    pub token_ttl_hours: i64,
    /// When set, `POST /api/setup/admin` must present this key.
    #[serde(default)]
    pub admin_setup_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// Processor API key. Payments are disabled when absent.
    #[serde(default)]
    pub secret_key: Option<String>,
    pub webhook_secret: String,
    pub api_base: String,
    /// ISO 4217 code, lower case.
    pub currency: String,
    pub webhook_tolerance_secs: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    Log,
    Smtp,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub transport: EmailTransport,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResultsConfig {
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
    pub email: EmailConfig,
    pub results: ResultsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 168)?
            .set_default("payment.api_base", "https://api.stripe.com")?
            .set_default("payment.currency", "brl")?
            .set_default("payment.webhook_tolerance_secs", 300)?
            .set_default("email.transport", "log")?
            .set_default("email.smtp_host", "smtp.resend.com")?
            .set_default("email.smtp_port", 587)?
            .set_default("email.smtp_username", "resend")?
            .set_default("email.from", "Podium <no-reply@podium.local>")?
            .set_default("results.max_upload_bytes", 10 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PODIUM__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("PODIUM")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
