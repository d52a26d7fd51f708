pub mod db;
pub mod error;
pub mod labourdb;
pub mod memory;
pub mod notificationdb;
pub mod paymentdb;
pub mod userdb;
pub mod verificationdb;

pub use db::{DBClient, MarketStore};
pub use error::DbError;
pub use labourdb::LaborExt;
pub use memory::MemoryStore;
pub use notificationdb::NotificationExt;
pub use paymentdb::PaymentExt;
pub use userdb::UserExt;
pub use verificationdb::VerificationExt;
