//! Authorization policy.
//!
//! Every role and ownership decision in the service goes through [`is_allowed`].

use common::Role;

/// An operation together with the ownership facts needed to decide on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// List, edit and delete user accounts.
    ManageUsers,
    /// Read the admin dashboard counters.
    ViewStats,
    CreateEvent,
    /// Update or delete an event, list its registrations, import its results.
    ManageEvent { organizer_id: i32 },
    /// Read a registration with its payment and result.
    ViewRegistration { owner_id: i32, organizer_id: i32 },
    /// Start a checkout for a registration.
    PayRegistration { owner_id: i32 },
}

/// Decide whether `user_id` acting with `role` may perform `action`.
pub fn is_allowed(role: Role, user_id: i32, action: &Action) -> bool {
    match *action {
        Action::ManageUsers | Action::ViewStats => role == Role::Admin,
        Action::CreateEvent => matches!(role, Role::Organizer | Role::Admin),
        Action::ManageEvent { organizer_id } => {
            role == Role::Admin || (role == Role::Organizer && organizer_id == user_id)
        }
        Action::ViewRegistration {
            owner_id,
            organizer_id,
        } => role == Role::Admin || owner_id == user_id || organizer_id == user_id,
        Action::PayRegistration { owner_id } => owner_id == user_id,
    }
}
