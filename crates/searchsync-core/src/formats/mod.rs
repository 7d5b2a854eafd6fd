//! # Formats Module
//!
//! Text encodings of the configuration document.
//!
//! This module provides pure transformations only. File I/O is performed
//! by the app layer.

pub mod persistence;

pub use persistence::{ConfigFormat, config_from_str, config_to_string};
