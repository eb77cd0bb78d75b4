pub mod category;
pub mod event;
pub mod notification;
pub mod payment;
pub mod race_result;
pub mod registration;
pub mod user;
