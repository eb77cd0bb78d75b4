#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Delivery channel of a notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "IN_APP"))]
    InApp,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "EMAIL"))]
    Email,
}

wire_values!(NotificationType, "notification type", {
    InApp => "IN_APP",
    Email => "EMAIL",
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SENT"))]
    Sent,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "READ"))]
    Read,
}

wire_values!(NotificationStatus, "notification status", {
    Pending => "PENDING",
    Sent => "SENT",
    Read => "READ",
});

impl NotificationStatus {
    /// Statuses counted as unread.
    pub const UNREAD: &'static [NotificationStatus] = &[Self::Pending, Self::Sent];
}
