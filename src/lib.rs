pub mod cli;
pub mod config;
pub mod database;
pub mod models;
pub mod services;

pub mod env;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{Result, StoreError};
pub use logging::{init_logging, LoggingConfig};
