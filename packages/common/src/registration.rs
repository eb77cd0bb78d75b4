#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Lifecycle of a registration. Moves forward only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    /// Created, waiting for payment.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING"))]
    Pending,
    /// Payment approved by the processor.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CONFIRMED"))]
    Confirmed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CANCELLED"))]
    Cancelled,
}

wire_values!(RegistrationStatus, "registration status", {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Cancelled => "CANCELLED",
});

/// T-shirt size picked at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShirtSize {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "XS"))]
    Xs,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "S"))]
    S,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "M"))]
    M,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "L"))]
    L,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "XL"))]
    Xl,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "XXL"))]
    Xxl,
}

wire_values!(ShirtSize, "shirt size", {
    Xs => "XS",
    S => "S",
    M => "M",
    L => "L",
    Xl => "XL",
    Xxl => "XXL",
});
