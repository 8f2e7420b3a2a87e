//! API route handlers

pub mod error;
pub mod ssh;
pub mod system;
pub mod ws;

pub use error::{ApiError, AppError};
