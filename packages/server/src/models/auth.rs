use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_text};
use crate::entity::user;
use crate::error::AppError;

/// Request body for account signup.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name (2-100 characters).
    #[schema(example = "Ana Souza")]
    pub name: String,
    /// Login email, unique across accounts.
    #[schema(example = "ana@example.com")]
    pub email: String,
    /// 8-128 characters with upper-case, lower-case and a digit.
    #[schema(example = "Corrida2024")]
    pub password: String,
    /// `PARTICIPANT` (default) or `ORGANIZER`.
    pub role: Option<Role>,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_text(&payload.name, "Name", 2, 100).map_err(AppError::Validation)?;
    if let Some(role) = payload.role
        && !role.is_self_assignable()
    {
        return Err(AppError::Validation(
            "Role must be PARTICIPANT or ORGANIZER".into(),
        ));
    }
    super::shared::validate_password(&payload.password)
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(example = "Corrida2024")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Public view of an account.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(example = "Ana Souza")]
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    /// Eleven digits.
    pub cpf: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            phone: u.phone,
            cpf: u.cpf,
            created_at: u.created_at,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// Identity carried by the caller's token.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ana@example.com")]
    pub email: String,
    pub role: Role,
}

/// Profile update. Absent fields are left unchanged; `null` clears `phone` or `cpf`.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    /// Formatted (`529.982.247-25`) or bare digits.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cpf: Option<Option<String>>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_text(name, "Name", 2, 100).map_err(AppError::Validation)?;
    }
    if let Some(Some(phone)) = &payload.phone {
        validate_text(phone, "Phone", 8, 20).map_err(AppError::Validation)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(alias = "currentPassword")]
    pub current_password: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

/// Whether the platform already has an administrator.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SetupStatusResponse {
    pub has_admin: bool,
    pub admin_count: u64,
}

/// First administrator bootstrap.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetupAdminRequest {
    /// Required when the server is configured with a setup key.
    #[serde(default, alias = "setupKey")]
    pub setup_key: Option<String>,
    pub name: String,
    pub email: String,
    pub password: String,
}
