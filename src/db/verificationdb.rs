// db/verificationdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use super::error::DbError;
use crate::models::verificationmodels::{Verification, VerificationStatus};

#[async_trait]
pub trait VerificationExt: Send + Sync {
    async fn insert_verification(&self, verification: &Verification) -> Result<Verification, DbError>;

    async fn get_verification(&self, verification_id: Uuid) -> Result<Option<Verification>, DbError>;

    async fn verifications_for_user(&self, user_id: Uuid) -> Result<Vec<Verification>, DbError>;

    async fn transition_verification(
        &self,
        verification_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
        date_verified: DateTime<Utc>,
    ) -> Result<Verification, DbError>;
}

#[async_trait]
impl VerificationExt for DBClient {
    async fn insert_verification(&self, verification: &Verification) -> Result<Verification, DbError> {
        let saved = sqlx::query_as::<_, Verification>(
            r#"
            INSERT INTO verifications (id, user_id, document_type, document_url, verification_code, status, date_submitted, date_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(verification.id)
        .bind(verification.user_id)
        .bind(verification.document_type)
        .bind(&verification.document_url)
        .bind(&verification.verification_code)
        .bind(verification.status)
        .bind(verification.date_submitted)
        .bind(verification.date_verified)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn get_verification(&self, verification_id: Uuid) -> Result<Option<Verification>, DbError> {
        let verification = sqlx::query_as::<_, Verification>("SELECT * FROM verifications WHERE id = $1")
            .bind(verification_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(verification)
    }

    async fn verifications_for_user(&self, user_id: Uuid) -> Result<Vec<Verification>, DbError> {
        let verifications = sqlx::query_as::<_, Verification>(
            "SELECT * FROM verifications WHERE user_id = $1 ORDER BY date_submitted DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(verifications)
    }

    async fn transition_verification(
        &self,
        verification_id: Uuid,
        expected: VerificationStatus,
        next: VerificationStatus,
        date_verified: DateTime<Utc>,
    ) -> Result<Verification, DbError> {
        let updated = sqlx::query_as::<_, Verification>(
            r#"
            UPDATE verifications SET status = $3, date_verified = $4
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(verification_id)
        .bind(expected)
        .bind(next)
        .bind(date_verified)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(verification) => Ok(verification),
            None => Err(DBClient::missing_or_stale(
                &self.pool,
                "verifications",
                "verification",
                verification_id,
                expected.to_str(),
            )
            .await),
        }
    }
}
