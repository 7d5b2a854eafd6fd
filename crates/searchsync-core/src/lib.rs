//! # searchsync-core
//!
//! The saved-search reconciliation engine - THE LOGIC.
//!
//! This crate turns a declarative list of saved-search definitions into
//! create/update/delete calls against a remote shortcut service, and keeps
//! the identifiers the service assigns.
//!
//! ## Components
//!
//! - `template`: expands `default(...)`/`join(...)` query templates
//! - `reconcile`: walks the definitions in order and applies them remotely
//! - `formats`: YAML/TOML encodings of the configuration document
//!
//! ## Architectural Constraints
//!
//! - The remote service and the configuration file are capabilities
//!   supplied by the caller (`RemoteOperations`, `ConfigStore`)
//! - Has NO async, NO network dependencies (pure Rust)
//! - Processing is sequential and order-preserving

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod primitives;
pub mod reconcile;
pub mod template;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Catalog, Definition, ErrorKind, RemoteOp, ResolveError, SavedSearchInput, SearchConfig,
    SyncError, TemplateDefinition, VarValue,
};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use reconcile::{
    Action, ConfigStore, Outcome, Reconciler, RemoteOperations, SyncMode, SyncReport,
};
pub use template::{Resolver, resolve};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{ConfigFormat, config_from_str, config_to_string};
