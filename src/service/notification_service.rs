// service/notification_service.rs
use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        notificationmodels::{Notification, NotificationStatus, NotificationType},
        usermodel::Permission,
    },
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<dyn MarketStore>,
}

impl NotificationService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    /// Stores an in-app notification for `user_id`. Delivery over email or
    /// push is not handled here.
    pub async fn send(
        &self,
        user_id: Uuid,
        message: &str,
        kind: NotificationType,
    ) -> Result<Notification, ServiceError> {
        if message.trim().is_empty() {
            return Err(ServiceError::validation("Notification message is required"));
        }

        let notification = self
            .db_client
            .insert_notification(&Notification::new(user_id, message, kind))
            .await?;

        tracing::info!(
            "Notification {} ({}) sent to user {}",
            notification.id,
            kind.to_str(),
            user_id
        );
        Ok(notification)
    }

    /// Best-effort `send`: failures are logged and never reach the caller.
    pub async fn dispatch(&self, user_id: Uuid, message: &str, kind: NotificationType) -> bool {
        match self.send(user_id, message, kind).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to notify user {}: {}", user_id, e);
                false
            }
        }
    }

    /// Sends a System notification to every admin holding `permission`.
    /// Returns how many were delivered.
    pub async fn notify_admins(&self, permission: Permission, message: &str) -> usize {
        let admins = match self.db_client.admins_with_permission(permission).await {
            Ok(admins) => admins,
            Err(e) => {
                tracing::warn!("Failed to load admins with {}: {}", permission.to_str(), e);
                return 0;
            }
        };

        if admins.is_empty() {
            tracing::warn!("No admin holds {}; notification dropped", permission.to_str());
            return 0;
        }

        let deliveries = admins
            .iter()
            .map(|admin| self.dispatch(admin.user_id, message, NotificationType::System));
        join_all(deliveries).await.into_iter().filter(|ok| *ok).count()
    }

    pub async fn mark_as_read(&self, notification_id: Uuid) -> Result<Notification, ServiceError> {
        let notification = self
            .db_client
            .get_notification(notification_id)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "notification",
                id: notification_id,
            })?;

        if notification.status == NotificationStatus::Read {
            return Ok(notification);
        }

        Ok(self.db_client.mark_notification_read(notification_id).await?)
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let updated = self.db_client.mark_all_notifications_read(user_id).await?;
        tracing::debug!("Marked {} notifications read for user {}", updated, user_id);
        Ok(updated)
    }

    pub async fn notifications_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, ServiceError> {
        Ok(self.db_client.notifications_for_user(user_id, unread_only).await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        Ok(self.db_client.unread_count(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, UserExt};
    use crate::models::usermodel::Admin;

    fn service() -> (Arc<MemoryStore>, NotificationService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), NotificationService::new(store))
    }

    #[tokio::test]
    async fn send_rejects_blank_message() {
        let (_, notifications) = service();
        let err = notifications
            .send(Uuid::new_v4(), "   ", NotificationType::System)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn read_tracking() {
        let (_, notifications) = service();
        let user = Uuid::new_v4();
        let first = notifications
            .send(user, "New application received", NotificationType::ApplicationUpdate)
            .await
            .unwrap();
        notifications
            .send(user, "Payment moved to escrow", NotificationType::Payment)
            .await
            .unwrap();
        assert_eq!(notifications.unread_count(user).await.unwrap(), 2);

        let read = notifications.mark_as_read(first.id).await.unwrap();
        assert_eq!(read.status, NotificationStatus::Read);
        // marking twice is harmless
        notifications.mark_as_read(first.id).await.unwrap();
        assert_eq!(notifications.unread_count(user).await.unwrap(), 1);

        assert_eq!(notifications.mark_all_as_read(user).await.unwrap(), 1);
        assert!(notifications.notifications_for_user(user, true).await.unwrap().is_empty());
        assert_eq!(notifications.notifications_for_user(user, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn admin_fan_out_reaches_only_permission_holders() {
        let (store, notifications) = service();
        let resolver = Admin::new(Uuid::new_v4(), vec![Permission::ResolveDisputes], "created");
        let verifier = Admin::new(Uuid::new_v4(), vec![Permission::VerifySkills], "created");
        store.insert_admin(&resolver).await.unwrap();
        store.insert_admin(&verifier).await.unwrap();

        let delivered = notifications
            .notify_admins(Permission::ResolveDisputes, "Dispute opened")
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(notifications.unread_count(resolver.user_id).await.unwrap(), 1);
        assert_eq!(notifications.unread_count(verifier.user_id).await.unwrap(), 0);
    }
}
