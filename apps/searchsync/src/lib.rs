//! # searchsync
//!
//! Command-line front end for `searchsync-core`: argument parsing, config
//! file location, the on-disk store, and the GitHub GraphQL transport.

pub mod cli;
pub mod client;
pub mod error;
pub mod paths;
pub mod store;

pub use client::{ClientError, Credentials, GraphQlClient};
pub use error::AppError;
pub use paths::resolve_config_path;
pub use store::FileStore;
