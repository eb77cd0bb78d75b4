use axum::{
    Json,
    extract::{Path, Query, State},
};
use common::{EventStatus, PaymentStatus, RegistrationStatus, Role};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use super::user::{cpf_conflict, find_user};
use crate::entity::{event, notification, payment, registration, user};
use crate::error::{AppError, ErrorBody, still_referenced};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::admin::*;
use crate::models::auth::UserResponse;
use crate::models::shared::{
    ApiResponse, MessageResponse, Paged, Pagination, escape_like, normalize_cpf, page_params,
};
use crate::policy::Action;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List user accounts",
    description = "Newest first. `search` matches a substring of name or email. Requires ADMIN.",
    params(AdminUserQuery),
    responses(
        (status = 200, description = "Page of users", body = ApiResponse<Paged<UserResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AdminUserQuery>,
) -> Result<Json<ApiResponse<Paged<UserResponse>>>, AppError> {
    auth_user.authorize(Action::ManageUsers)?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = user::Entity::find();
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim()).to_lowercase();
        if !term.is_empty() {
            let pattern = format!("%{term}%");
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Name)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::col(user::Column::Email)
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let total = select.clone().count(&state.db).await?;
    let users = select
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(Paged {
        items: users.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "updateUser",
    summary = "Edit a user account",
    description = "Changes name, role, phone or CPF. Requires ADMIN.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "CPF already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AdminUpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    auth_user.authorize(Action::ManageUsers)?;
    validate_admin_update(&payload)?;
    let current = find_user(&state.db, id).await?;

    let mut active: user::ActiveModel = current.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone.map(|p| p.trim().to_string()));
    }
    if let Some(cpf) = payload.cpf {
        active.cpf = Set(cpf.as_deref().map(normalize_cpf).transpose()?);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(&state.db).await.map_err(cpf_conflict)?;
    tracing::info!(user_id = id, role = %updated.role, "User updated by admin");
    Ok(ApiResponse::ok(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "deleteUser",
    summary = "Delete a user account",
    description = "Refused for the caller's own account and for users that own events or registrations. Requires ADMIN.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Own account (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "User owns events or registrations (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.authorize(Action::ManageUsers)?;
    if id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot delete your own account".into(),
        ));
    }

    let txn = state.db.begin().await?;
    find_user(&txn, id).await?;

    let events = event::Entity::find()
        .filter(event::Column::OrganizerId.eq(id))
        .count(&txn)
        .await?;
    let registrations = registration::Entity::find()
        .filter(registration::Column::UserId.eq(id))
        .count(&txn)
        .await?;
    if events > 0 || registrations > 0 {
        return Err(AppError::Conflict(format!(
            "User owns {events} event(s) and {registrations} registration(s)"
        )));
    }

    notification::Entity::delete_many()
        .filter(notification::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(|e| still_referenced(e, "User is still referenced and cannot be deleted"))?;
    txn.commit().await?;

    tracing::info!(user_id = id, "User deleted by admin");
    Ok(MessageResponse::ok("User deleted"))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "getStats",
    summary = "Dashboard counters",
    description = "User, event and registration counts plus approved revenue. Requires ADMIN.",
    responses(
        (status = 200, description = "Counters", body = ApiResponse<StatsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatsResponse>>, AppError> {
    auth_user.authorize(Action::ViewStats)?;
    let db = &state.db;

    let registrations_with = |status: RegistrationStatus| {
        registration::Entity::find()
            .filter(registration::Column::Status.eq(status))
            .count(db)
    };

    let (
        total_users,
        total_organizers,
        total_events,
        published_events,
        total_registrations,
        confirmed_registrations,
        pending_registrations,
        revenue,
    ) = tokio::try_join!(
        user::Entity::find().count(db),
        user::Entity::find()
            .filter(user::Column::Role.eq(Role::Organizer))
            .count(db),
        event::Entity::find().count(db),
        event::Entity::find()
            .filter(event::Column::Status.eq(EventStatus::Published))
            .count(db),
        registration::Entity::find().count(db),
        registrations_with(RegistrationStatus::Confirmed),
        registrations_with(RegistrationStatus::Pending),
        payment::Entity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(amount_cents), 0)::BIGINT"), "revenue")
            .filter(payment::Column::Status.eq(PaymentStatus::Approved))
            .into_tuple::<i64>()
            .one(db),
    )?;

    Ok(ApiResponse::ok(StatsResponse {
        total_users,
        total_organizers,
        total_events,
        published_events,
        total_registrations,
        confirmed_registrations,
        pending_registrations,
        approved_revenue_cents: revenue.unwrap_or(0),
    }))
}
