//! Promptify Runner Core Library
//!
//! Foundational pieces shared by every crate in the workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - First-wins `Claims`

pub mod claim;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use claim::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult, GENERIC_FAILURE};
