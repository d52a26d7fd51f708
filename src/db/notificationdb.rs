// db/notificationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use super::error::DbError;
use crate::models::notificationmodels::Notification;

#[async_trait]
pub trait NotificationExt: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<Notification, DbError>;

    async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>, DbError>;

    async fn notifications_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, DbError>;

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, DbError>;

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification, DbError>;

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, DbError>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn insert_notification(&self, notification: &Notification) -> Result<Notification, DbError> {
        let saved = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, message, kind, status, date_sent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.status)
        .bind(notification.date_sent)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>, DbError> {
        let notification = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(notification_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(notification)
    }

    async fn notifications_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, DbError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR status = 'unread'::notification_status)
            ORDER BY date_sent DESC
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND status = 'unread'::notification_status",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification, DbError> {
        let updated = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET status = 'read'::notification_status
            WHERE id = $1 AND status = 'unread'::notification_status
            RETURNING *
            "#,
        )
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(notification) => Ok(notification),
            None => Err(DBClient::missing_or_stale(
                &self.pool,
                "notifications",
                "notification",
                notification_id,
                "unread",
            )
            .await),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET status = 'read'::notification_status
            WHERE user_id = $1 AND status = 'unread'::notification_status
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
