pub mod config;
pub mod error;
pub mod types;

pub use config::HawkConfig;
pub use error::{HawkError, Result};
pub use types::*;
