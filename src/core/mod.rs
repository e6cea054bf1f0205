pub mod config;
pub mod error;
pub mod shutdown;
pub mod types;

pub use config::ControllerConfig;
pub use error::{ReachError, Result};
pub use shutdown::Shutdown;
