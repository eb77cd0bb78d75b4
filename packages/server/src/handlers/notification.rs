use axum::Json;
use axum::extract::{Query, State};
use common::NotificationStatus;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::notification;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::notification::*;
use crate::models::shared::{ApiResponse, MessageResponse};
use crate::state::AppState;

const LIST_LIMIT: u64 = 50;

fn unread(user_id: i32) -> Condition {
    Condition::all()
        .add(notification::Column::UserId.eq(user_id))
        .add(notification::Column::Status.is_in(NotificationStatus::UNREAD.iter().copied()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "The caller's notifications",
    description = "Latest 50, newest first, plus the total unread count.",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications", body = ApiResponse<NotificationList>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<NotificationList>>, AppError> {
    let filter = if query.unread_only {
        unread(auth_user.user_id)
    } else {
        Condition::all().add(notification::Column::UserId.eq(auth_user.user_id))
    };

    let items = notification::Entity::find()
        .filter(filter)
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .limit(LIST_LIMIT)
        .all(&state.db)
        .await?;
    let unread_count = notification::Entity::find()
        .filter(unread(auth_user.user_id))
        .count(&state.db)
        .await?;

    Ok(ApiResponse::ok(NotificationList {
        items: items.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

#[utoipa::path(
    post,
    path = "/read",
    tag = "Notifications",
    operation_id = "markNotificationsRead",
    summary = "Mark notifications as read",
    description = "Pass `notification_id` for one notification or `mark_all: true` for every unread one.",
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Marked as read", body = MessageResponse),
        (status = 400, description = "Neither field given (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<MarkReadRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let now = chrono::Utc::now();
    let update = notification::Entity::update_many()
        .col_expr(
            notification::Column::Status,
            Expr::value(NotificationStatus::Read.as_str()),
        )
        .col_expr(notification::Column::ReadAt, Expr::value(now));

    if payload.mark_all {
        let res = update.filter(unread(auth_user.user_id)).exec(&state.db).await?;
        return Ok(MessageResponse::ok(format!(
            "{} notification(s) marked as read",
            res.rows_affected
        )));
    }

    let id = payload.notification_id.ok_or_else(|| {
        AppError::Validation("Provide notification_id or mark_all".into())
    })?;
    let owned = notification::Entity::find_by_id(id)
        .filter(notification::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;

    if owned.read_at.is_none() {
        update
            .filter(notification::Column::Id.eq(owned.id))
            .exec(&state.db)
            .await?;
    }
    Ok(MessageResponse::ok("Notification marked as read"))
}
