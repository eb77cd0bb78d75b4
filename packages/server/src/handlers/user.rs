use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    ChangePasswordRequest, UpdateProfileRequest, UserResponse, validate_update_profile,
};
use crate::models::shared::{ApiResponse, MessageResponse, normalize_cpf, validate_password};
use crate::state::AppState;
use crate::utils::hash;

pub(crate) async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Map a unique violation on update to the CPF conflict message.
pub(crate) fn cpf_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("CPF is already registered to another account".into())
        }
        _ => AppError::from(e),
    }
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "Account",
    operation_id = "updateProfile",
    summary = "Update own profile",
    description = "Updates name, phone and CPF. The CPF is validated and stored as eleven digits.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "CPF already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    validate_update_profile(&payload)?;
    let current = find_user(&state.db, auth_user.user_id).await?;

    let mut active: user::ActiveModel = current.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone.map(|p| p.trim().to_string()));
    }
    if let Some(cpf) = payload.cpf {
        active.cpf = Set(cpf.as_deref().map(normalize_cpf).transpose()?);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(&state.db).await.map_err(cpf_conflict)?;
    Ok(ApiResponse::ok(updated.into()))
}

#[utoipa::path(
    put,
    path = "/password",
    tag = "Account",
    operation_id = "changePassword",
    summary = "Change own password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or weak new password (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let current = find_user(&state.db, auth_user.user_id).await?;

    let matches = hash::verify_password(&payload.current_password, &current.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !matches {
        return Err(AppError::Validation("Current password is incorrect".into()));
    }
    validate_password(&payload.new_password)?;

    let hash = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
    let mut active: user::ActiveModel = current.into();
    active.password = Set(hash);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    Ok(MessageResponse::ok("Password updated"))
}
