// db/db.rs
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::error::DbError;
use super::labourdb::LaborExt;
use super::notificationdb::NotificationExt;
use super::paymentdb::PaymentExt;
use super::userdb::UserExt;
use super::verificationdb::VerificationExt;

/// Everything the services need from persistence.
pub trait MarketStore:
    UserExt + LaborExt + PaymentExt + NotificationExt + VerificationExt + Send + Sync + std::fmt::Debug
{
}

impl<T> MarketStore for T where
    T: UserExt + LaborExt + PaymentExt + NotificationExt + VerificationExt + Send + Sync + std::fmt::Debug
{
}

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    /// Explains why a conditional update matched no row.
    pub(crate) async fn missing_or_stale<'e, E>(
        executor: E,
        table: &'static str,
        entity: &'static str,
        id: Uuid,
        expected: &'static str,
    ) -> DbError
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let query = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", table);
        match sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(executor)
            .await
        {
            Ok(true) => DbError::StaleStatus { entity, id, expected },
            Ok(false) => DbError::NotFound { entity, id },
            Err(e) => DbError::Sqlx(e),
        }
    }
}
