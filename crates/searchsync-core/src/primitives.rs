//! # Fixed Constants
//!
//! Hardcoded constants shared by the resolver, the reconciler and the
//! persistence formats. They are compiled into the binary and never change
//! at runtime.

use std::time::Duration;

/// Delay inserted after each definition that touched the remote service.
///
/// The shortcut service has no published rate limit.
pub const DEFAULT_OPERATION_DELAY: Duration = Duration::from_secs(1);

/// Prefix placed before a section label when synthesizing a header name.
pub const SECTION_HEADER_PREFIX: &str = "== ";

/// Suffix placed after a section label when synthesizing a header name.
pub const SECTION_HEADER_SUFFIX: &str = " ==";

/// Name of the custom fallback call accepted in templates.
pub const DEFAULT_CALL: &str = "default";

/// Name of the custom list-join call accepted in templates.
pub const JOIN_CALL: &str = "join";

/// Marker that turns a bare identifier into a context field path.
pub const FIELD_PATH_MARKER: &str = "this.";

/// Words inside a substitution marker that are never treated as variables.
///
/// Covers the custom calls plus the block keywords and literals of the
/// substitution engine.
pub const RESERVED_WORDS: &[&str] = &[
    "default", "join", "range", "end", "if", "else", "with", "each", "unless", "lookup", "this",
    "true", "false", "null",
];

/// Maximum size of a definitions file accepted by the loaders (10 MB).
pub const MAX_CONFIG_SIZE: usize = 10 * 1024 * 1024;

/// Build the display name of a section header.
#[must_use]
pub fn section_header_name(label: &str) -> String {
    format!("{SECTION_HEADER_PREFIX}{label}{SECTION_HEADER_SUFFIX}")
}

/// Check whether a word is reserved by the template language.
#[must_use]
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}
