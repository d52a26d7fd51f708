// service/admin_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::usermodel::{log_entry, Admin, Permission},
    service::{error::ServiceError, found},
};

#[derive(Debug, Clone)]
pub struct AdminService {
    db_client: Arc<dyn MarketStore>,
}

impl AdminService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    pub async fn create_super_admin(&self, user_id: Uuid) -> Result<Admin, ServiceError> {
        self.create(user_id, Permission::ALL.to_vec(), "Super admin created").await
    }

    pub async fn create_skill_verifier(&self, user_id: Uuid) -> Result<Admin, ServiceError> {
        self.create(user_id, vec![Permission::VerifySkills], "Skill verifier created")
            .await
    }

    pub async fn create_custom_admin(
        &self,
        user_id: Uuid,
        permissions: Vec<Permission>,
    ) -> Result<Admin, ServiceError> {
        if permissions.is_empty() {
            return Err(ServiceError::validation("Admin must have at least one permission"));
        }
        self.create(user_id, permissions, "Custom admin created").await
    }

    pub async fn add_permission(&self, admin_id: Uuid, permission: Permission) -> Result<Admin, ServiceError> {
        let admin = self.get_admin(admin_id).await?;
        if admin.has_permission(permission) {
            return Ok(admin);
        }
        self.db_client.add_admin_permission(admin_id, permission).await?;
        tracing::info!("Admin {} granted {}", admin_id, permission.to_str());
        self.log_action(admin_id, &format!("Granted {}", permission.to_str())).await
    }

    pub async fn remove_permission(&self, admin_id: Uuid, permission: Permission) -> Result<Admin, ServiceError> {
        let admin = self.get_admin(admin_id).await?;
        if !admin.has_permission(permission) {
            return Ok(admin);
        }
        self.db_client.remove_admin_permission(admin_id, permission).await?;
        tracing::info!("Admin {} lost {}", admin_id, permission.to_str());
        self.log_action(admin_id, &format!("Revoked {}", permission.to_str())).await
    }

    /// Appends a timestamped entry. Earlier entries are never rewritten.
    pub async fn log_action(&self, admin_id: Uuid, action: &str) -> Result<Admin, ServiceError> {
        if action.trim().is_empty() {
            return Err(ServiceError::validation("Action description is required"));
        }
        let entry = log_entry(Utc::now(), action);
        Ok(self.db_client.append_admin_log(admin_id, &entry).await?)
    }

    pub async fn get_admin(&self, admin_id: Uuid) -> Result<Admin, ServiceError> {
        found(self.db_client.get_admin(admin_id).await?, "admin", admin_id)
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Admin>, ServiceError> {
        Ok(self.db_client.get_admin_by_user(user_id).await?)
    }

    pub async fn is_user_admin(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.find_by_user(user_id).await?.is_some())
    }

    pub async fn has_permission(&self, user_id: Uuid, permission: Permission) -> Result<bool, ServiceError> {
        Ok(self
            .find_by_user(user_id)
            .await?
            .map_or(false, |admin| admin.has_permission(permission)))
    }

    pub async fn admins_with_permission(&self, permission: Permission) -> Result<Vec<Admin>, ServiceError> {
        Ok(self.db_client.admins_with_permission(permission).await?)
    }

    async fn create(
        &self,
        user_id: Uuid,
        permissions: Vec<Permission>,
        initial_entry: &str,
    ) -> Result<Admin, ServiceError> {
        found(self.db_client.get_user(user_id).await?, "user", user_id)?;
        if self.is_user_admin(user_id).await? {
            return Err(ServiceError::Conflict("User is already an admin".to_string()));
        }

        let admin = self
            .db_client
            .insert_admin(&Admin::new(user_id, permissions, initial_entry))
            .await?;
        tracing::info!(
            "Admin {} created for user {} with {} permissions",
            admin.id,
            user_id,
            admin.permissions.len()
        );
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{app, client};

    #[tokio::test]
    async fn super_admin_has_everything_once() {
        let (_, state) = app();
        let user = client(&state).await;
        let admin = state.admin_service.create_super_admin(user.id).await.unwrap();
        assert_eq!(admin.permissions.len(), Permission::ALL.len());
        assert!(state.admin_service.is_user_admin(user.id).await.unwrap());

        let err = state.admin_service.create_skill_verifier(user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn custom_admin_needs_permissions() {
        let (_, state) = app();
        let user = client(&state).await;
        let err = state
            .admin_service
            .create_custom_admin(user.id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = state
            .admin_service
            .create_custom_admin(Uuid::new_v4(), vec![Permission::ViewReports])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn permissions_toggle_and_log_grows() {
        let (_, state) = app();
        let user = client(&state).await;
        let admin = state.admin_service.create_skill_verifier(user.id).await.unwrap();

        let admin = state
            .admin_service
            .add_permission(admin.id, Permission::ResolveDisputes)
            .await
            .unwrap();
        assert!(admin.has_permission(Permission::ResolveDisputes));
        let again = state
            .admin_service
            .add_permission(admin.id, Permission::ResolveDisputes)
            .await
            .unwrap();
        assert_eq!(again, admin);
        assert!(state
            .admin_service
            .has_permission(user.id, Permission::ResolveDisputes)
            .await
            .unwrap());
        assert_eq!(
            state
                .admin_service
                .admins_with_permission(Permission::ResolveDisputes)
                .await
                .unwrap()
                .len(),
            1
        );

        let admin = state
            .admin_service
            .remove_permission(admin.id, Permission::VerifySkills)
            .await
            .unwrap();
        assert!(!admin.has_permission(Permission::VerifySkills));

        let admin = state
            .admin_service
            .log_action(admin.id, "Suspended a spam account")
            .await
            .unwrap();
        let entries: Vec<&str> = admin.log_entries().collect();
        assert_eq!(entries.len(), 4);
        assert!(entries[0].ends_with(": Skill verifier created"));
        assert!(entries[3].ends_with(": Suspended a spam account"));
    }
}
