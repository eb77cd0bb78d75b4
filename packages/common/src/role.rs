#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Account role. Decides which management surfaces a user may reach.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Registers for events and pays for them.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PARTICIPANT"))]
    Participant,
    /// Creates and manages their own events.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ORGANIZER"))]
    Organizer,
    /// Manages every user and event.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ADMIN"))]
    Admin,
}

wire_values!(Role, "role", {
    Participant => "PARTICIPANT",
    Organizer => "ORGANIZER",
    Admin => "ADMIN",
});

impl Role {
    /// Roles a user may pick for themselves at signup.
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, Self::Participant | Self::Organizer)
    }
}
