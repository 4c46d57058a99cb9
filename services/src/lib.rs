pub mod admin_service;
pub mod attendance_service;
pub mod device_service;
pub mod error;
pub mod expiry;
pub mod qr;
pub mod session_service;

pub use error::{AppError, AppResult};
