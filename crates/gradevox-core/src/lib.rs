pub mod config;
pub mod error;
pub mod types;

pub use config::GradevoxConfig;
pub use error::{GradevoxError, Result};
pub use types::*;
