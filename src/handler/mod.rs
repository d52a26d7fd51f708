pub mod admin;
pub mod labour;
pub mod notification_handler;
pub mod payment;
pub mod users;
pub mod verification;
pub mod workers;
