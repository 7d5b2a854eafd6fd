//! # Query Template Resolver
//!
//! Turns a [`Definition`] into the final search query.
//!
//! Templates are written with two friendly call forms:
//!
//! ```text
//! assignee:{{ default(user, "none") }} repo:({{ join(repos, "OR") }})
//! ```
//!
//! The resolver rewrites them into native helper calls of the substitution
//! engine (`{{default this.user "none"}}`, `{{join this.repos "OR"}}`) and
//! hands the result to handlebars together with a binding table built from
//! the definition's variables. Identifiers the template mentions but the
//! definition does not bind are bound to null, so optional variables can be
//! left out of the configuration entirely.

use crate::primitives::{self, DEFAULT_CALL, FIELD_PATH_MARKER, JOIN_CALL};
use crate::types::{Catalog, Definition, ResolveError};
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use regex::Regex;
use serde_json::{Map, Value as Json};
use std::collections::BTreeSet;
use std::sync::LazyLock;

// =============================================================================
// SYNTAX PATTERNS
// =============================================================================

static DEFAULT_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*default\(\s*([^,]+?)\s*,\s*"(.*?)"\s*\)\s*\}\}"#)
        .expect("DEFAULT_CALL_PATTERN is a valid regex pattern")
});

static JOIN_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*join\(\s*([^,]+?)\s*,\s*"(.*?)"\s*\)\s*\}\}"#)
        .expect("JOIN_CALL_PATTERN is a valid regex pattern")
});

static BARE_REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(~?)\s*([A-Za-z_][A-Za-z0-9_]*)\s*(~?)\}\}")
        .expect("BARE_REFERENCE_PATTERN is a valid regex pattern")
});

static ACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[^}]+\}\}").expect("ACTION_PATTERN is a valid regex pattern")
});

static STRING_LITERAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"\\]|\\.)*""#).expect("STRING_LITERAL_PATTERN is a valid regex pattern")
});

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("IDENTIFIER_PATTERN is a valid regex pattern")
});

// =============================================================================
// RESOLVER
// =============================================================================

/// Renders definition queries.
///
/// Holds a handlebars registry with the `default` and `join` helpers and
/// HTML escaping turned off. Rendering never mutates the registry, so one
/// resolver serves any number of definitions.
pub struct Resolver {
    registry: Handlebars<'static>,
}

impl Resolver {
    /// Create a resolver with the query helpers registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper(DEFAULT_CALL, Box::new(default_helper));
        registry.register_helper(JOIN_CALL, Box::new(join_helper));
        Self { registry }
    }

    /// Produce the query for a definition.
    ///
    /// 1. A literal query wins; the catalog is not consulted.
    /// 2. A section header yields the empty string.
    /// 3. Otherwise the template reference is looked up and rendered.
    pub fn resolve(&self, definition: &Definition, catalog: &Catalog) -> Result<String, ResolveError> {
        if let Some(query) = definition.literal_query() {
            return Ok(query.to_string());
        }

        if definition.is_section_header() {
            return Ok(String::new());
        }

        let name = definition.template_ref().ok_or(ResolveError::MissingQuery)?;
        let template = catalog
            .get(name)
            .ok_or_else(|| ResolveError::TemplateNotFound(name.to_string()))?;

        let normalized = normalize(&template.query);
        let bindings = bindings(definition, &template.query, &normalized);

        self.registry
            .render_template(&normalized, &bindings)
            .map_err(|e| ResolveError::Syntax {
                template: name.to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a single definition with a fresh resolver.
pub fn resolve(definition: &Definition, catalog: &Catalog) -> Result<String, ResolveError> {
    Resolver::new().resolve(definition, catalog)
}

// =============================================================================
// REWRITE PASSES
// =============================================================================

/// Rewrite `default(...)` and `join(...)` calls into native helper calls,
/// and bare `{{ name }}` references into field paths.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let out = rewrite_call(&DEFAULT_CALL_PATTERN, DEFAULT_CALL, raw);
    let out = rewrite_call(&JOIN_CALL_PATTERN, JOIN_CALL, &out);
    rewrite_bare_references(&out)
}

/// `{{ len }}` would call the built-in `len` helper; a field path makes it a
/// variable lookup again. `else`, `this` and literals are left alone.
fn rewrite_bare_references(input: &str) -> String {
    BARE_REFERENCE_PATTERN
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[2];
            if KEPT_BARE_WORDS.contains(&name) {
                return caps[0].to_string();
            }
            format!("{{{{{}{FIELD_PATH_MARKER}{name}{}}}}}", &caps[1], &caps[3])
        })
        .into_owned()
}

const KEPT_BARE_WORDS: &[&str] = &["else", "this", "true", "false", "null"];

fn rewrite_call(pattern: &Regex, helper: &str, input: &str) -> String {
    pattern
        .replace_all(input, |caps: &regex::Captures<'_>| {
            format!(
                "{{{{{helper} {} \"{}\"}}}}",
                field_path(caps[1].trim()),
                &caps[2]
            )
        })
        .into_owned()
}

/// Turn a bare identifier into a context field path.
///
/// A leading `.` is replaced by `this.`. Expressions starting with `this.`
/// or `@`, or containing spaces or parentheses, are returned unchanged.
fn field_path(expr: &str) -> String {
    let passthrough = expr.starts_with('@')
        || expr.starts_with(FIELD_PATH_MARKER)
        || expr.contains([' ', '(', ')']);
    if passthrough {
        return expr.to_string();
    }
    format!("{FIELD_PATH_MARKER}{}", expr.trim_start_matches('.'))
}

// =============================================================================
// BINDINGS
// =============================================================================

/// Identifiers referenced inside substitution markers, in first-seen order.
///
/// The first argument of every `default(...)` call in the raw template is
/// collected as well, since it may appear nowhere else.
#[must_use]
pub fn referenced_identifiers(raw: &str, normalized: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut ids = Vec::new();

    for action in ACTION_PATTERN.find_iter(normalized) {
        let stripped = STRING_LITERAL_PATTERN.replace_all(action.as_str(), "\"\"");
        for m in IDENTIFIER_PATTERN.find_iter(&stripped) {
            let preceding = stripped[..m.start()].chars().next_back();
            if matches!(preceding, Some(c) if c.is_ascii_alphanumeric() || c == '@' || c == '_') {
                continue;
            }
            let name = m.as_str();
            if primitives::is_reserved_word(name) || !seen.insert(name.to_string()) {
                continue;
            }
            ids.push(name.to_string());
        }
    }

    for caps in DEFAULT_CALL_PATTERN.captures_iter(raw) {
        let arg = caps[1].trim();
        let name = arg
            .strip_prefix(FIELD_PATH_MARKER)
            .unwrap_or(arg)
            .trim_start_matches('.');
        if name.is_empty() || !is_identifier(name) || !seen.insert(name.to_string()) {
            continue;
        }
        ids.push(name.to_string());
    }

    ids
}

fn is_identifier(s: &str) -> bool {
    IDENTIFIER_PATTERN
        .find(s)
        .is_some_and(|m| m.start() == 0 && m.end() == s.len())
}

/// Build the binding table for one render.
///
/// Every variable of the definition keeps its value; every other referenced
/// identifier is bound to null.
fn bindings(definition: &Definition, raw: &str, normalized: &str) -> Map<String, Json> {
    let mut table: Map<String, Json> = definition
        .vars
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();

    for name in referenced_identifiers(raw, normalized) {
        table.entry(name).or_insert(Json::Null);
    }

    table
}

// =============================================================================
// HELPERS
// =============================================================================

/// `{{default value "fallback"}}`: the value when present and non-empty.
fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let fallback = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .unwrap_or_default();
    let rendered = h
        .param(0)
        .and_then(|p| present_text(p.value()))
        .unwrap_or_else(|| fallback.to_string());
    out.write(&rendered)?;
    Ok(())
}

/// `{{join value "sep"}}`: list elements joined by the padded separator.
fn join_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let separator = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .unwrap_or_default();
    let rendered = match h.param(0).map(|p| p.value()) {
        Some(Json::Array(items)) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(&format!(" {separator} ")),
        Some(other) => scalar_text(other),
        None => String::new(),
    };
    out.write(&rendered)?;
    Ok(())
}

/// Text of a value, or `None` when it counts as missing.
fn present_text(value: &Json) -> Option<String> {
    match value {
        Json::Null => None,
        Json::String(s) if s.is_empty() => None,
        Json::Array(items) if items.is_empty() => None,
        Json::Array(items) => Some(items.iter().map(scalar_text).collect::<Vec<_>>().join(" ")),
        other => Some(scalar_text(other)),
    }
}

fn scalar_text(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
