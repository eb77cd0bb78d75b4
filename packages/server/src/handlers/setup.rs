use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use common::Role;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{SetupAdminRequest, SetupStatusResponse, UserResponse};
use crate::models::shared::{ApiResponse, normalize_email, validate_password, validate_text};
use crate::state::AppState;
use crate::utils::hash;

async fn count_admins<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    user::Entity::find()
        .filter(user::Column::Role.eq(Role::Admin))
        .count(db)
        .await
}

#[utoipa::path(
    get,
    path = "/admin",
    tag = "Setup",
    operation_id = "setupStatus",
    summary = "Check whether an administrator exists",
    responses(
        (status = 200, description = "Administrator status", body = ApiResponse<SetupStatusResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn setup_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SetupStatusResponse>>, AppError> {
    let admin_count = count_admins(&state.db).await?;
    Ok(ApiResponse::ok(SetupStatusResponse {
        has_admin: admin_count > 0,
        admin_count,
    }))
}

#[utoipa::path(
    post,
    path = "/admin",
    tag = "Setup",
    operation_id = "setupAdmin",
    summary = "Create the first administrator",
    description = "Creates the first ADMIN account, or promotes an existing account after checking its password. Refused once any administrator exists. When the server has a setup key configured, `setup_key` must match it.",
    request_body = SetupAdminRequest,
    responses(
        (status = 201, description = "Administrator created or promoted", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong setup key or password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 409, description = "An administrator already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn setup_admin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetupAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(expected) = state.config.auth.admin_setup_key.as_deref()
        && payload.setup_key.as_deref() != Some(expected)
    {
        tracing::warn!("Admin setup attempted with a wrong setup key");
        return Err(AppError::InvalidCredentials);
    }

    let email = normalize_email(&payload.email)?;

    let txn = state.db.begin().await?;
    if count_admins(&txn).await? > 0 {
        return Err(AppError::Conflict("An administrator already exists".into()));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .lock(sea_query::LockType::Update)
        .one(&txn)
        .await?;

    let admin = match existing {
        Some(account) => {
            let matches = hash::verify_password(&payload.password, &account.password)
                .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
            if !matches {
                return Err(AppError::InvalidCredentials);
            }
            let mut active: user::ActiveModel = account.into();
            active.role = Set(Role::Admin);
            active.updated_at = Set(chrono::Utc::now());
            active.update(&txn).await?
        }
        None => {
            validate_text(&payload.name, "Name", 2, 100).map_err(AppError::Validation)?;
            validate_password(&payload.password)?;
            let hash = hash::hash_password(&payload.password)
                .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
            let now = chrono::Utc::now();
            user::ActiveModel {
                email: Set(email),
                name: Set(payload.name.trim().to_string()),
                password: Set(hash),
                role: Set(Role::Admin),
                phone: Set(None),
                cpf: Set(None),
                external_customer_id: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;

    tracing::info!(user_id = admin.id, "Administrator set up");
    Ok((StatusCode::CREATED, ApiResponse::ok(UserResponse::from(admin))))
}
