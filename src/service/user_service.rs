// service/user_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        lifecycle::USER_STATUS,
        notificationmodels::NotificationType,
        usermodel::{Mode, Role, User, UserStatus},
    },
    service::{ensure_transition, error::ServiceError, found, notification_service::NotificationService},
    utils::validation,
};

#[derive(Debug, Clone)]
pub struct UserService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
}

impl UserService {
    pub fn new(db_client: Arc<dyn MarketStore>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn register_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: Option<&str>,
        roles: Vec<Role>,
        current_mode: Mode,
    ) -> Result<User, ServiceError> {
        validation::validate_user(first_name, last_name, email, phone_number, &roles, current_mode)
            .into_result()
            .map_err(ServiceError::Validation)?;

        if self.db_client.get_user_by_email(email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already exists".to_string()));
        }

        let user = User::new(first_name, last_name, email, phone_number, roles, current_mode);
        let user = self.db_client.insert_user(&user).await?;
        tracing::info!("Registered user {} as {}", user.id, user.current_mode.to_str());

        self.notification_service
            .dispatch(
                user.id,
                &format!("Welcome, {}! Your account is ready.", user.first_name),
                NotificationType::System,
            )
            .await;

        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        found(self.db_client.get_user(user_id).await?, "user", user_id)
    }

    pub async fn users_by_status(&self, status: UserStatus) -> Result<Vec<User>, ServiceError> {
        Ok(self.db_client.users_by_status(status).await?)
    }

    pub async fn switch_mode(&self, user_id: Uuid, mode: Mode) -> Result<User, ServiceError> {
        let user = self.get_user(user_id).await?;
        if !user.can_use_mode(mode) {
            return Err(ServiceError::validation(format!(
                "User doesn't have permission for {} mode",
                mode.to_str()
            )));
        }
        if user.current_mode == mode {
            return Ok(user);
        }

        let user = self.db_client.update_user_mode(user_id, mode).await?;
        tracing::info!("User {} switched to {} mode", user_id, mode.to_str());
        Ok(user)
    }

    pub async fn suspend_user(&self, user_id: Uuid, reason: &str) -> Result<User, ServiceError> {
        let user = self.change_status(user_id, UserStatus::Suspended).await?;
        self.notification_service
            .dispatch(
                user_id,
                &format!("Your account has been suspended. Reason: {}", reason.trim()),
                NotificationType::System,
            )
            .await;
        Ok(user)
    }

    pub async fn activate_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let user = self.change_status(user_id, UserStatus::Active).await?;
        self.notification_service
            .dispatch(user_id, "Your account is active again.", NotificationType::System)
            .await;
        Ok(user)
    }

    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.change_status(user_id, UserStatus::Deactivated).await
    }

    async fn change_status(&self, user_id: Uuid, next: UserStatus) -> Result<User, ServiceError> {
        let user = self.get_user(user_id).await?;
        ensure_transition(&USER_STATUS, user_id, user.status, next)?;

        let user = self
            .db_client
            .transition_user_status(user_id, user.status, next)
            .await?;
        tracing::info!("User {} is now {}", user_id, next.to_str());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::app;

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (_, state) = app();
        state
            .user_service
            .register_user("Naledi", "Khumalo", "naledi@example.com", None, vec![Role::Client], Mode::Client)
            .await
            .unwrap();

        let err = state
            .user_service
            .register_user("Naledi", "Other", "NALEDI@example.com", None, vec![Role::Worker], Mode::Worker)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_registration_lists_problems() {
        let (_, state) = app();
        let err = state
            .user_service
            .register_user("N4led1", "Khumalo", "not-an-email", Some("12345"), vec![], Mode::Client)
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(message) => {
                assert!(message.contains("First name"));
                assert!(message.contains("email"));
                assert!(message.contains("phone"));
                assert!(message.contains("role"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn switch_mode_requires_role() {
        let (_, state) = app();
        let user = state
            .user_service
            .register_user("Pieter", "Botha", "pieter@example.com", None, vec![Role::Client], Mode::Client)
            .await
            .unwrap();
        let err = state.user_service.switch_mode(user.id, Mode::Worker).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let both = state
            .user_service
            .register_user("Anele", "Zulu", "anele@example.com", None, vec![Role::Both], Mode::Client)
            .await
            .unwrap();
        let switched = state.user_service.switch_mode(both.id, Mode::Worker).await.unwrap();
        assert_eq!(switched.current_mode, Mode::Worker);
    }

    #[tokio::test]
    async fn status_follows_table() {
        let (_, state) = app();
        let user = state
            .user_service
            .register_user("Bongani", "Ndlovu", "bongani@example.com", None, vec![Role::Worker], Mode::Worker)
            .await
            .unwrap();

        let suspended = state.user_service.suspend_user(user.id, "spam").await.unwrap();
        assert_eq!(suspended.status, UserStatus::Suspended);
        let err = state.user_service.suspend_user(user.id, "again").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));

        state.user_service.deactivate_user(user.id).await.unwrap();
        let active = state.user_service.activate_user(user.id).await.unwrap();
        assert_eq!(active.status, UserStatus::Active);
        assert_eq!(state.user_service.users_by_status(UserStatus::Active).await.unwrap().len(), 1);
    }
}
