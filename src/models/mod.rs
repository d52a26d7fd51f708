pub mod labourmodel;
pub mod lifecycle;
pub mod notificationmodels;
pub mod paymentmodels;
pub mod usermodel;
pub mod verificationmodels;
