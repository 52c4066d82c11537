//! Configuration module for Monthwise
//!
//! - Path resolution (`MONTHWISE_DATA_DIR` or the platform config dir)
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::MonthwisePaths;
pub use settings::{RateLimitSettings, Settings};
