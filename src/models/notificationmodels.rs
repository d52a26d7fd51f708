use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
pub enum NotificationType {
    JobAlert,
    ApplicationUpdate,
    Payment,
    System,
}

impl NotificationType {
    pub fn to_str(&self) -> &'static str {
        match self {
            NotificationType::JobAlert => "job_alert",
            NotificationType::ApplicationUpdate => "application_update",
            NotificationType::Payment => "payment",
            NotificationType::System => "system",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
pub enum NotificationStatus {
    Unread,
    Read,
}

impl NotificationStatus {
    pub const ALL: [NotificationStatus; 2] = [NotificationStatus::Unread, NotificationStatus::Read];

    pub fn to_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "unread",
            NotificationStatus::Read => "read",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub kind: NotificationType,
    pub status: NotificationStatus,
    pub date_sent: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, message: &str, kind: NotificationType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            message: message.to_string(),
            kind,
            status: NotificationStatus::Unread,
            date_sent: Utc::now(),
        }
    }

    pub fn with_status(&self, status: NotificationStatus) -> Self {
        Self { status, ..self.clone() }
    }
}
