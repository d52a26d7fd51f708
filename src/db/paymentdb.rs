// db/paymentdb.rs
use async_trait::async_trait;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::DBClient;
use super::error::DbError;
use crate::models::paymentmodels::{Payment, PaymentStatus};

#[async_trait]
pub trait PaymentExt: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, DbError>;

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, DbError>;

    async fn payments_for_contract(&self, contract_id: Uuid) -> Result<Vec<Payment>, DbError>;

    async fn payments_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, DbError>;

    /// Payments on contracts where `client_id` is the client.
    async fn payments_for_client(&self, client_id: Uuid) -> Result<Vec<Payment>, DbError>;

    /// Payments on contracts where `worker_id` is the worker.
    async fn payments_for_worker(&self, worker_id: Uuid) -> Result<Vec<Payment>, DbError>;

    async fn total_amount_by_status(&self, status: PaymentStatus) -> Result<BigDecimal, DbError>;

    async fn transition_payment(
        &self,
        payment_id: Uuid,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Payment, DbError>;

    /// Deletes the payment unless it has been released.
    async fn delete_payment(&self, payment_id: Uuid) -> Result<(), DbError>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, DbError> {
        let saved = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, contract_id, amount, method, status, date_processed)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.contract_id)
        .bind(&payment.amount)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.date_processed)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, DbError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    async fn payments_for_contract(&self, contract_id: Uuid) -> Result<Vec<Payment>, DbError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE contract_id = $1 ORDER BY date_processed DESC",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn payments_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, DbError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE status = $1 ORDER BY date_processed DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn payments_for_client(&self, client_id: Uuid) -> Result<Vec<Payment>, DbError> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN contracts c ON c.id = p.contract_id
            WHERE c.client_id = $1
            ORDER BY p.date_processed DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn payments_for_worker(&self, worker_id: Uuid) -> Result<Vec<Payment>, DbError> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN contracts c ON c.id = p.contract_id
            WHERE c.worker_id = $1
            ORDER BY p.date_processed DESC
            "#,
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn total_amount_by_status(&self, status: PaymentStatus) -> Result<BigDecimal, DbError> {
        let total = sqlx::query_scalar::<_, BigDecimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = $1",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn transition_payment(
        &self,
        payment_id: Uuid,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Payment, DbError> {
        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET status = $3, date_processed = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(payment) => Ok(payment),
            None => Err(DBClient::missing_or_stale(
                &self.pool,
                "payments",
                "payment",
                payment_id,
                expected.to_str(),
            )
            .await),
        }
    }

    async fn delete_payment(&self, payment_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1 AND status <> 'released'::payment_status")
            .bind(payment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM payments WHERE id = $1)")
            .bind(payment_id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Err(DbError::StaleStatus {
                entity: "payment",
                id: payment_id,
                expected: "not released",
            })
        } else {
            Err(DbError::NotFound { entity: "payment", id: payment_id })
        }
    }
}
