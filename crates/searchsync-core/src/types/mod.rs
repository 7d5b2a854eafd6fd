//! # Core Type Definitions
//!
//! This module contains the data model shared by the resolver and the reconciler:
//! - Saved-search declarations (`Definition`, `VarValue`)
//! - Reusable query templates (`TemplateDefinition`, `Catalog`)
//! - The configuration document (`SearchConfig`)
//! - The payload handed to the remote service (`SavedSearchInput`)
//! - Error types (`ResolveError`, `SyncError`, `ErrorKind`)
//!
//! ## Field Presence
//!
//! Every optional field is an `Option` that is skipped when serializing.
//! An empty string is treated exactly like an absent field, so a document
//! survives a load/save cycle without gaining explicit empty values.

use crate::primitives;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// VARIABLES
// =============================================================================

/// Value bound to a template variable.
///
/// Numbers and booleans in the source document are held as their string
/// form; lists keep their element order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VarValue {
    /// Explicit null in the source document.
    #[default]
    Null,
    /// A scalar value.
    Text(String),
    /// An ordered list of scalar values.
    List(Vec<String>),
}

impl VarValue {
    /// Create a scalar value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create a list value.
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Convert into the JSON value the substitution engine renders.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| serde_json::Value::String(item.clone()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<&str>> for VarValue {
    fn from(items: Vec<&str>) -> Self {
        Self::list(items)
    }
}

impl Serialize for VarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for VarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VarValueVisitor)
    }
}

struct VarValueVisitor;

impl<'de> Visitor<'de> for VarValueVisitor {
    type Value = VarValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, a number, a boolean, null or a list of scalars")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<VarValue, E> {
        Ok(VarValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<VarValue, E> {
        Ok(VarValue::Text(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<VarValue, E> {
        Ok(VarValue::Text(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<VarValue, E> {
        Ok(VarValue::Text(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<VarValue, E> {
        Ok(VarValue::Text(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<VarValue, E> {
        Ok(VarValue::Text(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<VarValue, E> {
        Ok(VarValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<VarValue, E> {
        Ok(VarValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<VarValue, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<VarValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(ListItem(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(VarValue::List(items))
    }
}

/// A single list element: any scalar, held as a string.
struct ListItem(String);

impl<'de> Deserialize<'de> for ListItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListItemVisitor;

        impl Visitor<'_> for ListItemVisitor {
            type Value = ListItem;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scalar list element")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ListItem, E> {
                Ok(ListItem(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<ListItem, E> {
                Ok(ListItem(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ListItem, E> {
                Ok(ListItem(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ListItem, E> {
                Ok(ListItem(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ListItem, E> {
                Ok(ListItem(v.to_string()))
            }
        }

        deserializer.deserialize_any(ListItemVisitor)
    }
}

// =============================================================================
// DEFINITION
// =============================================================================

/// One saved-search declaration.
///
/// Exactly one of `query`, `section` or `template` decides how the query is
/// produced. The reconciler only ever touches `id` and `remove`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Identifier assigned by the remote service on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name of the shortcut.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-text description forwarded to the remote service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Literal query text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Section label; marks a visual header when no query is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Name of a template in the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Variables bound when rendering the template.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, VarValue>,
    /// Delete the remote shortcut on the next sync.
    #[serde(default, skip_serializing_if = "is_false")]
    pub remove: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl Definition {
    /// Create a definition with a literal query.
    #[must_use]
    pub fn with_query(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Create a section header.
    #[must_use]
    pub fn section(label: impl Into<String>) -> Self {
        Self {
            section: Some(label.into()),
            ..Self::default()
        }
    }

    /// Create a definition rendered from a catalog template.
    #[must_use]
    pub fn from_template(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            template: Some(template.into()),
            ..Self::default()
        }
    }

    /// Set the remote identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Bind a template variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Mark the definition for removal.
    #[must_use]
    pub fn marked_for_removal(mut self) -> Self {
        self.remove = true;
        self
    }

    /// Remote identifier, if one is held.
    #[must_use]
    pub fn remote_id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    /// Literal query text, if set.
    #[must_use]
    pub fn literal_query(&self) -> Option<&str> {
        non_empty(&self.query)
    }

    /// Section label, if set.
    #[must_use]
    pub fn section_label(&self) -> Option<&str> {
        non_empty(&self.section)
    }

    /// Template reference, if set.
    #[must_use]
    pub fn template_ref(&self) -> Option<&str> {
        non_empty(&self.template)
    }

    /// True for a section label with neither query nor template.
    #[must_use]
    pub fn is_section_header(&self) -> bool {
        self.section_label().is_some()
            && self.literal_query().is_none()
            && self.template_ref().is_none()
    }

    /// Name sent to the remote service.
    ///
    /// Falls back to the synthesized header name for section labels.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        non_empty(&self.name)
            .map(str::to_string)
            .or_else(|| self.section_label().map(primitives::section_header_name))
    }

    /// Label used in error messages, empty when nothing names the entry.
    #[must_use]
    pub fn label(&self) -> String {
        self.display_name().unwrap_or_default()
    }

    /// Drop the remote identifier.
    pub fn clear_id(&mut self) {
        self.id = None;
    }
}

// =============================================================================
// TEMPLATES & DOCUMENT
// =============================================================================

/// A reusable query template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// Raw query text containing substitution markers.
    pub query: String,
}

impl TemplateDefinition {
    /// Create a template from its raw text.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Named templates, keyed by the name definitions refer to.
pub type Catalog = BTreeMap<String, TemplateDefinition>;

/// The configuration document: ordered definitions plus the template catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub searches: Vec<Definition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: Catalog,
}

/// Name, query and description handed to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSearchInput {
    pub name: String,
    pub query: String,
    pub description: Option<String>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Failures while producing the query of a single definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Neither literal query nor template reference is set.
    #[error("search must have either query or template")]
    MissingQuery,

    /// The template reference is not in the catalog.
    #[error("template {0:?} not found")]
    TemplateNotFound(String),

    /// The normalized template could not be parsed or rendered.
    #[error("render template {template:?}: {message}")]
    Syntax { template: String, message: String },
}

/// Operation being attempted against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Create,
    Update,
    /// Delete requested by the `remove` flag.
    Delete,
    /// Delete issued by reset mode.
    ResetDelete,
    /// Delete issued by recreate mode before the fresh create.
    RecreateDelete,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ResetDelete => "reset delete",
            Self::RecreateDelete => "recreate delete",
        })
    }
}

/// Errors that abort a sync run.
///
/// Every variant is fatal; the first one ends the run and nothing is
/// persisted.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The query of a definition could not be produced.
    #[error("{name}: {source}")]
    Resolve {
        name: String,
        #[source]
        source: ResolveError,
    },

    /// Neither a name nor a section label is set.
    #[error("search entry missing name")]
    MissingName,

    /// The remote service rejected an operation.
    #[error("{op} {name}: {source}")]
    Remote {
        op: RemoteOp,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The definitions could not be loaded, parsed, serialized or written.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Coarse classification of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    TemplateSyntax,
    RemoteOperation,
    Persistence,
}

impl SyncError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolve {
                source: ResolveError::Syntax { .. },
                ..
            } => ErrorKind::TemplateSyntax,
            Self::Resolve { .. } | Self::MissingName => ErrorKind::Configuration,
            Self::Remote { .. } => ErrorKind::RemoteOperation,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
