pub mod admin;
pub mod auth;
pub mod event;
pub mod notification;
pub mod payment;
pub mod registration;
pub mod results;
pub mod shared;
