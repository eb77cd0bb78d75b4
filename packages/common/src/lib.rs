#[macro_use]
mod macros;

pub mod event;
pub mod notification;
pub mod payment;
pub mod registration;
pub mod result_status;
pub mod role;

pub use event::{EventStatus, EventType};
pub use notification::{NotificationStatus, NotificationType};
pub use payment::PaymentStatus;
pub use registration::{RegistrationStatus, ShirtSize};
pub use result_status::ResultStatus;
pub use role::Role;

use std::fmt;

/// Error when parsing a string that is not one of an enum's wire values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    valid: &'static [&'static str],
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, invalid: &str, valid: &'static [&'static str]) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            valid,
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Valid values: {}",
            self.kind,
            self.invalid,
            self.valid.join(", ")
        )
    }
}

impl std::error::Error for ParseEnumError {}
