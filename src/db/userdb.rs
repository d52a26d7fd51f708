// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use super::error::DbError;
use crate::models::usermodel::{Admin, Mode, Permission, User, UserStatus};

#[async_trait]
pub trait UserExt: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<User, DbError>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DbError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    async fn users_by_status(&self, status: UserStatus) -> Result<Vec<User>, DbError>;

    async fn transition_user_status(
        &self,
        user_id: Uuid,
        expected: UserStatus,
        next: UserStatus,
    ) -> Result<User, DbError>;

    async fn update_user_mode(&self, user_id: Uuid, mode: Mode) -> Result<User, DbError>;

    // Admins
    async fn insert_admin(&self, admin: &Admin) -> Result<Admin, DbError>;

    async fn get_admin(&self, admin_id: Uuid) -> Result<Option<Admin>, DbError>;

    async fn get_admin_by_user(&self, user_id: Uuid) -> Result<Option<Admin>, DbError>;

    async fn admins_with_permission(&self, permission: Permission) -> Result<Vec<Admin>, DbError>;

    async fn add_admin_permission(
        &self,
        admin_id: Uuid,
        permission: Permission,
    ) -> Result<Admin, DbError>;

    async fn remove_admin_permission(
        &self,
        admin_id: Uuid,
        permission: Permission,
    ) -> Result<Admin, DbError>;

    /// Appends one line to the action log without rewriting earlier lines.
    async fn append_admin_log(&self, admin_id: Uuid, entry: &str) -> Result<Admin, DbError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn insert_user(&self, user: &User) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, first_name, last_name, email, phone_number, roles, current_mode, status, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.roles)
        .bind(user.current_mode)
        .bind(user.status)
        .bind(user.date_joined)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "email"))
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn users_by_status(&self, status: UserStatus) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE status = $1 ORDER BY date_joined DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn transition_user_status(
        &self,
        user_id: Uuid,
        expected: UserStatus,
        next: UserStatus,
    ) -> Result<User, DbError> {
        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(user) => Ok(user),
            None => Err(DBClient::missing_or_stale(&self.pool, "users", "user", user_id, expected.to_str()).await),
        }
    }

    async fn update_user_mode(&self, user_id: Uuid, mode: Mode) -> Result<User, DbError> {
        sqlx::query_as::<_, User>("UPDATE users SET current_mode = $2 WHERE id = $1 RETURNING *")
            .bind(user_id)
            .bind(mode)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound { entity: "user", id: user_id })
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<Admin, DbError> {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, user_id, permissions, actions_log, date_created)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(admin.id)
        .bind(admin.user_id)
        .bind(&admin.permissions)
        .bind(&admin.actions_log)
        .bind(admin.date_created)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "admin for user"))
    }

    async fn get_admin(&self, admin_id: Uuid) -> Result<Option<Admin>, DbError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn get_admin_by_user(&self, user_id: Uuid) -> Result<Option<Admin>, DbError> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn admins_with_permission(&self, permission: Permission) -> Result<Vec<Admin>, DbError> {
        let admins = sqlx::query_as::<_, Admin>(
            "SELECT * FROM admins WHERE $1 = ANY(permissions) ORDER BY date_created",
        )
        .bind(permission)
        .fetch_all(&self.pool)
        .await?;
        Ok(admins)
    }

    async fn add_admin_permission(
        &self,
        admin_id: Uuid,
        permission: Permission,
    ) -> Result<Admin, DbError> {
        sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins
            SET permissions = CASE
                WHEN $2 = ANY(permissions) THEN permissions
                ELSE array_append(permissions, $2)
            END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(admin_id)
        .bind(permission)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound { entity: "admin", id: admin_id })
    }

    async fn remove_admin_permission(
        &self,
        admin_id: Uuid,
        permission: Permission,
    ) -> Result<Admin, DbError> {
        sqlx::query_as::<_, Admin>(
            "UPDATE admins SET permissions = array_remove(permissions, $2) WHERE id = $1 RETURNING *",
        )
        .bind(admin_id)
        .bind(permission)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound { entity: "admin", id: admin_id })
    }

    async fn append_admin_log(&self, admin_id: Uuid, entry: &str) -> Result<Admin, DbError> {
        sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins
            SET actions_log = CASE
                WHEN actions_log = '' THEN $2
                ELSE actions_log || E'\n' || $2
            END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(admin_id)
        .bind(entry)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound { entity: "admin", id: admin_id })
    }
}
