#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Sport discipline of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "RUNNING"))]
    Running,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CYCLING"))]
    Cycling,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SWIMMING"))]
    Swimming,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TRIATHLON"))]
    Triathlon,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MTB"))]
    Mtb,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TRAIL_RUNNING"))]
    TrailRunning,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "WALKING"))]
    Walking,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "OTHER"))]
    Other,
}

wire_values!(EventType, "event type", {
    Running => "RUNNING",
    Cycling => "CYCLING",
    Swimming => "SWIMMING",
    Triathlon => "TRIATHLON",
    Mtb => "MTB",
    TrailRunning => "TRAIL_RUNNING",
    Walking => "WALKING",
    Other => "OTHER",
});

/// Publication status of an event.
///
/// Organizers may move an event between any two statuses; only
/// registration and results import look at the value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Not visible in public listings.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DRAFT"))]
    Draft,
    /// Open for registration within its registration window.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PUBLISHED"))]
    Published,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ONGOING"))]
    Ongoing,
    /// Results have been imported.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPLETED"))]
    Completed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CANCELLED"))]
    Cancelled,
}

wire_values!(EventStatus, "event status", {
    Draft => "DRAFT",
    Published => "PUBLISHED",
    Ongoing => "ONGOING",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

impl EventStatus {
    pub fn accepts_registrations(&self) -> bool {
        matches!(self, Self::Published)
    }
}
