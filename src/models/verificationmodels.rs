// models/verificationmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared by skills, worker profiles and identity documents.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 3] = [
        VerificationStatus::Pending,
        VerificationStatus::Verified,
        VerificationStatus::Rejected,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "document_type", rename_all = "snake_case")]
pub enum DocumentType {
    Id,
    Certificate,
    License,
}

impl DocumentType {
    pub fn to_str(&self) -> &'static str {
        match self {
            DocumentType::Id => "id",
            DocumentType::Certificate => "certificate",
            DocumentType::License => "license",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Verification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_type: DocumentType,
    pub document_url: String,
    pub verification_code: Option<String>,
    pub status: VerificationStatus,
    pub date_submitted: DateTime<Utc>,
    pub date_verified: Option<DateTime<Utc>>,
}

impl Verification {
    pub fn new(
        user_id: Uuid,
        document_type: DocumentType,
        document_url: &str,
        verification_code: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            document_type,
            document_url: document_url.trim().to_string(),
            verification_code: verification_code.map(|c| c.trim().to_string()),
            status: VerificationStatus::Pending,
            date_submitted: Utc::now(),
            date_verified: None,
        }
    }

    pub fn with_status(&self, status: VerificationStatus, date_verified: DateTime<Utc>) -> Self {
        Self {
            status,
            date_verified: Some(date_verified),
            ..self.clone()
        }
    }
}
