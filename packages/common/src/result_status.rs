#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Outcome of a participant in a race.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    /// Crossed the finish line.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPLETED"))]
    Completed,
    /// Did not finish.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DNF"))]
    Dnf,
    /// Did not start.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DNS"))]
    Dns,
    /// Disqualified.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DSQ"))]
    Dsq,
}

wire_values!(ResultStatus, "result status", {
    Completed => "COMPLETED",
    Dnf => "DNF",
    Dns => "DNS",
    Dsq => "DSQ",
});
