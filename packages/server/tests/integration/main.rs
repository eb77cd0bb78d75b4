
mod auth;
mod payment;
mod registration;
mod results;
mod setup;
mod webhook;
