//! Domain types and configuration for the storefront backend.
//!
//! This crate holds everything with no I/O of its own: the application
//! config loader, the order-status state machine, password hashing and
//! JWT issuance, and the seed-catalog file format.

use thiserror::Error;

pub mod app_config;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod order_status;

pub use app_config::{AppConfig, Environment};
pub use auth::{
    decode_access_token, hash_password, issue_token_pair, verify_password, AuthError, Claims,
    TokenPair,
};
pub use catalog::{load_seed_catalog, SeedCatalog};
pub use config::{load_app_config, load_app_config_from_env};
pub use order_status::OrderStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read seed catalog file {path}: {source}")]
    SeedFileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse seed catalog file")]
    SeedFileParse(#[from] serde_yaml::Error),
    #[error("seed catalog validation failed: {0}")]
    Validation(String),
}
