// models/usermodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    Client,
    Worker,
    Both,
}

impl Role {
    pub fn to_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Worker => "worker",
            Role::Both => "both",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_mode", rename_all = "snake_case")]
pub enum Mode {
    Client,
    Worker,
}

impl Mode {
    pub fn to_str(&self) -> &'static str {
        match self {
            Mode::Client => "client",
            Mode::Worker => "worker",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Suspended,
    Deactivated,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [UserStatus::Active, UserStatus::Suspended, UserStatus::Deactivated];

    pub fn to_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Deactivated => "deactivated",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub roles: Vec<Role>,
    pub current_mode: Mode,
    pub status: UserStatus,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn new(
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: Option<&str>,
        roles: Vec<Role>,
        current_mode: Mode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_lowercase(),
            phone_number: phone_number.map(|p| p.trim().to_string()),
            roles,
            current_mode,
            status: UserStatus::Active,
            date_joined: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// A `Both` role grants either mode.
    pub fn can_use_mode(&self, mode: Mode) -> bool {
        self.roles.iter().any(|role| match (role, mode) {
            (Role::Both, _) => true,
            (Role::Client, Mode::Client) => true,
            (Role::Worker, Mode::Worker) => true,
            _ => false,
        })
    }

    pub fn is_worker(&self) -> bool {
        self.can_use_mode(Mode::Worker)
    }

    pub fn with_status(&self, status: UserStatus) -> Self {
        Self { status, ..self.clone() }
    }

    pub fn with_mode(&self, current_mode: Mode) -> Self {
        Self { current_mode, ..self.clone() }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "admin_permission", rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    VerifySkills,
    ResolveDisputes,
    ManagePayments,
    ViewReports,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::ManageUsers,
        Permission::VerifySkills,
        Permission::ResolveDisputes,
        Permission::ManagePayments,
        Permission::ViewReports,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::VerifySkills => "verify_skills",
            Permission::ResolveDisputes => "resolve_disputes",
            Permission::ManagePayments => "manage_payments",
            Permission::ViewReports => "view_reports",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Admin {
    pub id: Uuid,
    pub user_id: Uuid,
    pub permissions: Vec<Permission>,
    /// Newline separated `<timestamp>: <action>` entries, oldest first.
    pub actions_log: String,
    pub date_created: DateTime<Utc>,
}

impl Admin {
    pub fn new(user_id: Uuid, permissions: Vec<Permission>, initial_entry: &str) -> Self {
        let now = Utc::now();
        let mut unique = Vec::with_capacity(permissions.len());
        for permission in permissions {
            if !unique.contains(&permission) {
                unique.push(permission);
            }
        }

        Self {
            id: Uuid::new_v4(),
            user_id,
            permissions: unique,
            actions_log: log_entry(now, initial_entry),
            date_created: now,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn log_entries(&self) -> impl Iterator<Item = &str> {
        self.actions_log.lines().filter(|line| !line.is_empty())
    }
}

pub fn log_entry(at: DateTime<Utc>, action: &str) -> String {
    format!("{}: {}", at.to_rfc3339(), action.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_role_allows_either_mode() {
        let user = User::new("Thandi", "Mokoena", "T@Example.com", None, vec![Role::Both], Mode::Client);
        assert!(user.can_use_mode(Mode::Client));
        assert!(user.can_use_mode(Mode::Worker));
        assert_eq!(user.email, "t@example.com");
    }

    #[test]
    fn client_role_cannot_work() {
        let user = User::new("Sipho", "Dlamini", "sipho@example.com", None, vec![Role::Client], Mode::Client);
        assert!(!user.is_worker());
    }

    #[test]
    fn admin_deduplicates_permissions() {
        let admin = Admin::new(
            Uuid::new_v4(),
            vec![Permission::VerifySkills, Permission::VerifySkills],
            "Skill verifier created",
        );
        assert_eq!(admin.permissions, vec![Permission::VerifySkills]);
        assert_eq!(admin.log_entries().count(), 1);
    }
}
