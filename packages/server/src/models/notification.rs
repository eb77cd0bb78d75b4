use chrono::{DateTime, Utc};
use common::{NotificationStatus, NotificationType};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    /// Only notifications that were not read yet.
    #[serde(default, alias = "unreadOnly")]
    pub unread_only: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub status: NotificationStatus,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::notification::Model> for NotificationResponse {
    fn from(n: crate::entity::notification::Model) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            status: n.status,
            metadata: n.metadata,
            sent_at: n.sent_at,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationList {
    /// Latest 50, newest first.
    pub items: Vec<NotificationResponse>,
    pub unread_count: u64,
}

/// Mark one notification, or all of them, as read.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct MarkReadRequest {
    #[serde(default, alias = "notificationId")]
    pub notification_id: Option<i32>,
    #[serde(default, alias = "markAllAsRead")]
    pub mark_all: bool,
}
