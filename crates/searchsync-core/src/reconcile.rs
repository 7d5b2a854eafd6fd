//! # Reconciliation Engine
//!
//! Brings the remote shortcut service in line with the local definitions.
//!
//! Definitions are processed strictly in list order, one remote operation at
//! a time, with a fixed pause after every definition that was created,
//! updated or recreated. The list itself is never reordered, grown or
//! shrunk; only the `id` and `remove` fields of its entries change.
//!
//! ## Failure Semantics
//!
//! The first error aborts the run. Operations already applied remotely are
//! not rolled back, and the identifiers they produced are not persisted:
//! persistence happens once, after the whole list succeeded.

use crate::primitives::DEFAULT_OPERATION_DELAY;
use crate::template::Resolver;
use crate::types::{Catalog, Definition, RemoteOp, SavedSearchInput, SearchConfig, SyncError};
use std::path::Path;
use std::time::Duration;

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Create, update and delete shortcuts on the remote service.
///
/// No idempotency key is passed: calling `create` twice creates two records.
pub trait RemoteOperations {
    /// Transport-specific failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a shortcut and return its new identifier.
    fn create(&mut self, input: &SavedSearchInput) -> Result<String, Self::Error>;

    /// Overwrite name and query of an existing shortcut.
    fn update(&mut self, id: &str, input: &SavedSearchInput) -> Result<(), Self::Error>;

    /// Delete a shortcut.
    fn delete(&mut self, id: &str) -> Result<(), Self::Error>;
}

/// Load and save the configuration document.
///
/// Implementations must keep list order and field presence across a
/// load/save cycle.
pub trait ConfigStore {
    fn load(&self, location: &Path) -> Result<SearchConfig, SyncError>;

    fn save(&self, location: &Path, config: &SearchConfig) -> Result<(), SyncError>;
}

// =============================================================================
// MODE & REPORT
// =============================================================================

/// How identified definitions are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Create missing shortcuts, update existing ones.
    #[default]
    Normal,
    /// Delete and create every identified shortcut.
    Recreate,
    /// Delete every identified shortcut, create nothing.
    Reset,
}

/// What happened to a single definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A new shortcut was created.
    Created { id: String },
    /// An existing shortcut was updated in place.
    Updated { id: String },
    /// An existing shortcut was deleted and created again.
    Recreated { previous: String, id: String },
    /// A shortcut was deleted (removal flag or reset mode).
    Deleted { id: String },
    /// No remote call was needed.
    Skipped,
}

impl Action {
    /// True when the pause between remote operations follows this action.
    ///
    /// Deletions end the definition's processing without pacing.
    #[must_use]
    pub fn paced(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Updated { .. } | Self::Recreated { .. }
        )
    }

    /// True when the definition's `id` or `remove` field changed.
    #[must_use]
    pub fn mutated(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Recreated { .. } | Self::Deleted { .. }
        )
    }
}

/// Per-definition outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Effective display name.
    pub name: String,
    pub action: Action,
}

/// Result of a full pass over the definition list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// One entry per definition, in list order.
    pub outcomes: Vec<Outcome>,
    /// True when any definition's `id` or `remove` field changed.
    pub changed: bool,
    /// True when the document was handed to the store.
    pub saved: bool,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, Action::Created { .. }))
    }

    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, Action::Updated { .. }))
    }

    #[must_use]
    pub fn recreated(&self) -> usize {
        self.count(|a| matches!(a, Action::Recreated { .. }))
    }

    #[must_use]
    pub fn deleted(&self) -> usize {
        self.count(|a| matches!(a, Action::Deleted { .. }))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|a| matches!(a, Action::Skipped))
    }
}

// =============================================================================
// RECONCILER
// =============================================================================

/// Applies definitions to a [`RemoteOperations`] implementation.
pub struct Reconciler<R> {
    remote: R,
    mode: SyncMode,
    pacing: Duration,
    resolver: Resolver,
}

impl<R: RemoteOperations> Reconciler<R> {
    /// Create a reconciler with the default pacing delay.
    #[must_use]
    pub fn new(remote: R, mode: SyncMode) -> Self {
        Self {
            remote,
            mode,
            pacing: DEFAULT_OPERATION_DELAY,
            resolver: Resolver::new(),
        }
    }

    /// Override the pause inserted after each created, updated or recreated definition.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Borrow the remote capability.
    #[must_use]
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Give back the remote capability.
    #[must_use]
    pub fn into_remote(self) -> R {
        self.remote
    }

    /// Load the document, reconcile it, and save it back if anything changed.
    pub fn sync<S: ConfigStore>(
        &mut self,
        store: &S,
        location: &Path,
    ) -> Result<SyncReport, SyncError> {
        let mut config = store.load(location)?;
        let mut report = self.reconcile(&mut config.searches, &config.templates)?;

        if report.changed {
            store.save(location, &config)?;
            report.saved = true;
        }

        Ok(report)
    }

    /// Reconcile every definition in place, in list order.
    pub fn reconcile(
        &mut self,
        definitions: &mut [Definition],
        catalog: &Catalog,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        for definition in definitions.iter_mut() {
            let outcome = self.apply(definition, catalog)?;

            report.changed |= outcome.action.mutated();
            let paced = outcome.action.paced();
            report.outcomes.push(outcome);

            if paced && !self.pacing.is_zero() {
                std::thread::sleep(self.pacing);
            }
        }

        Ok(report)
    }

    /// Reconcile a single definition.
    fn apply(
        &mut self,
        definition: &mut Definition,
        catalog: &Catalog,
    ) -> Result<Outcome, SyncError> {
        let query = self
            .resolver
            .resolve(definition, catalog)
            .map_err(|source| SyncError::Resolve {
                name: definition.label(),
                source,
            })?;

        let name = definition.display_name().ok_or(SyncError::MissingName)?;
        let input = SavedSearchInput {
            name: name.clone(),
            query,
            description: definition.description.clone().filter(|d| !d.is_empty()),
        };

        let held = definition.remote_id().map(str::to_string);

        if definition.remove {
            let action = match held {
                Some(id) => {
                    self.delete(&id, &name, RemoteOp::Delete)?;
                    definition.clear_id();
                    definition.remove = false;
                    Action::Deleted { id }
                }
                None => Action::Skipped,
            };
            return Ok(Outcome { name, action });
        }

        let action = match (self.mode, held) {
            (SyncMode::Reset, Some(id)) => {
                self.delete(&id, &name, RemoteOp::ResetDelete)?;
                definition.clear_id();
                Action::Deleted { id }
            }
            (SyncMode::Reset, None) => Action::Skipped,
            (SyncMode::Recreate, Some(previous)) => {
                self.delete(&previous, &name, RemoteOp::RecreateDelete)?;
                definition.clear_id();
                let id = self.create(&input)?;
                definition.id = Some(id.clone());
                Action::Recreated { previous, id }
            }
            (_, None) => {
                let id = self.create(&input)?;
                definition.id = Some(id.clone());
                Action::Created { id }
            }
            (SyncMode::Normal, Some(id)) => {
                self.remote
                    .update(&id, &input)
                    .map_err(|e| remote_error(RemoteOp::Update, &name, e))?;
                Action::Updated { id }
            }
        };

        Ok(Outcome { name, action })
    }

    fn create(&mut self, input: &SavedSearchInput) -> Result<String, SyncError> {
        self.remote
            .create(input)
            .map_err(|e| remote_error(RemoteOp::Create, &input.name, e))
    }

    fn delete(&mut self, id: &str, name: &str, op: RemoteOp) -> Result<(), SyncError> {
        self.remote
            .delete(id)
            .map_err(|e| remote_error(op, name, e))
    }
}

fn remote_error<E>(op: RemoteOp, name: &str, source: E) -> SyncError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SyncError::Remote {
        op,
        name: name.to_string(),
        source: Box::new(source),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;
    use std::fmt;

    #[derive(Debug)]
    struct StubError;

    impl fmt::Display for StubError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("stub failure")
        }
    }

    impl std::error::Error for StubError {}

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Create(String),
        Update(String, String),
        Delete(String),
    }

    #[derive(Default)]
    struct StubRemote {
        calls: Vec<Call>,
        next_id: u32,
        fail_on: Option<usize>,
    }

    impl StubRemote {
        fn record(&mut self, call: Call) -> Result<(), StubError> {
            if self.fail_on == Some(self.calls.len()) {
                return Err(StubError);
            }
            self.calls.push(call);
            Ok(())
        }
    }

    impl RemoteOperations for StubRemote {
        type Error = StubError;

        fn create(&mut self, input: &SavedSearchInput) -> Result<String, StubError> {
            self.record(Call::Create(input.name.clone()))?;
            self.next_id += 1;
            Ok(format!("SSC_{}", self.next_id))
        }

        fn update(&mut self, id: &str, input: &SavedSearchInput) -> Result<(), StubError> {
            self.record(Call::Update(id.to_string(), input.name.clone()))
        }

        fn delete(&mut self, id: &str) -> Result<(), StubError> {
            self.record(Call::Delete(id.to_string()))
        }
    }

    fn reconciler(mode: SyncMode) -> Reconciler<StubRemote> {
        Reconciler::new(StubRemote::default(), mode).with_pacing(Duration::ZERO)
    }

    #[test]
    fn create_then_update() {
        let mut defs = vec![Definition::with_query("Mine", "is:open")];
        let mut r = reconciler(SyncMode::Normal);

        let first = r.reconcile(&mut defs, &Catalog::new()).expect("first pass");
        assert!(first.changed);
        assert_eq!(defs[0].remote_id(), Some("SSC_1"));

        let second = r.reconcile(&mut defs, &Catalog::new()).expect("second pass");
        assert!(!second.changed);
        assert_eq!(
            r.remote().calls,
            vec![
                Call::Create("Mine".to_string()),
                Call::Update("SSC_1".to_string(), "Mine".to_string()),
            ]
        );
    }

    #[test]
    fn recreate_deletes_then_creates() {
        let mut defs = vec![Definition::with_query("Mine", "is:open").with_id("X")];
        let mut r = reconciler(SyncMode::Recreate);

        let report = r.reconcile(&mut defs, &Catalog::new()).expect("recreate");

        assert_eq!(
            r.remote().calls,
            vec![Call::Delete("X".to_string()), Call::Create("Mine".to_string())]
        );
        assert_eq!(defs[0].remote_id(), Some("SSC_1"));
        assert_eq!(
            report.outcomes[0].action,
            Action::Recreated {
                previous: "X".to_string(),
                id: "SSC_1".to_string()
            }
        );
    }

    #[test]
    fn recreate_without_id_just_creates() {
        let mut defs = vec![Definition::with_query("Mine", "is:open")];
        let mut r = reconciler(SyncMode::Recreate);

        r.reconcile(&mut defs, &Catalog::new()).expect("recreate");
        assert_eq!(r.remote().calls, vec![Call::Create("Mine".to_string())]);
    }

    #[test]
    fn reset_only_deletes() {
        let mut defs = vec![
            Definition::with_query("Existing", "is:open").with_id("SSC_keep"),
            Definition::with_query("NoID", "is:open"),
        ];
        let mut r = reconciler(SyncMode::Reset);

        let report = r.reconcile(&mut defs, &Catalog::new()).expect("reset");

        assert_eq!(r.remote().calls, vec![Call::Delete("SSC_keep".to_string())]);
        assert_eq!(defs[0].id, None);
        assert_eq!(report.deleted(), 1);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn removal_clears_and_stops() {
        let mut defs = vec![
            Definition::with_query("Gone", "is:open")
                .with_id("Y")
                .marked_for_removal(),
        ];
        let mut r = reconciler(SyncMode::Recreate);

        let report = r.reconcile(&mut defs, &Catalog::new()).expect("remove");

        assert_eq!(r.remote().calls, vec![Call::Delete("Y".to_string())]);
        assert_eq!(defs[0].id, None);
        assert!(!defs[0].remove);
        assert!(report.changed);
    }

    #[test]
    fn only_creates_and_updates_are_paced() {
        let id = || "SSC_1".to_string();

        assert!(Action::Created { id: id() }.paced());
        assert!(Action::Updated { id: id() }.paced());
        assert!(
            Action::Recreated {
                previous: "X".to_string(),
                id: id()
            }
            .paced()
        );
        assert!(!Action::Deleted { id: id() }.paced());
        assert!(!Action::Skipped.paced());
    }

    #[test]
    fn removal_without_id_is_noop() {
        let mut defs = vec![Definition::with_query("Gone", "is:open").marked_for_removal()];
        let mut r = reconciler(SyncMode::Normal);

        let report = r.reconcile(&mut defs, &Catalog::new()).expect("remove");

        assert!(r.remote().calls.is_empty());
        assert!(!report.changed);
        assert!(defs[0].remove);
    }

    #[test]
    fn headers_are_synced_with_synthesized_name() {
        let mut defs = vec![Definition::section("Team")];
        let mut r = reconciler(SyncMode::Normal);

        r.reconcile(&mut defs, &Catalog::new()).expect("header");
        assert_eq!(r.remote().calls, vec![Call::Create("== Team ==".to_string())]);
    }

    #[test]
    fn missing_name_is_fatal() {
        let mut defs = vec![Definition {
            query: Some("is:open".to_string()),
            ..Definition::default()
        }];
        let mut r = reconciler(SyncMode::Normal);

        let err = r.reconcile(&mut defs, &Catalog::new()).expect_err("no name");
        assert!(matches!(err, SyncError::MissingName));
        assert!(r.remote().calls.is_empty());
    }

    #[test]
    fn resolution_failure_stops_before_later_entries() {
        let mut defs = vec![
            Definition::with_query("First", "is:open"),
            Definition::from_template("Broken", "missing"),
            Definition::with_query("Never", "is:open"),
        ];
        let mut r = reconciler(SyncMode::Normal);

        let err = r.reconcile(&mut defs, &Catalog::new()).expect_err("missing template");

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().starts_with("Broken: "));
        assert_eq!(r.remote().calls, vec![Call::Create("First".to_string())]);
        assert_eq!(defs[2].id, None);
    }

    #[test]
    fn remote_failure_names_operation() {
        let mut defs = vec![Definition::with_query("Mine", "is:open").with_id("X")];
        let remote = StubRemote {
            fail_on: Some(0),
            ..StubRemote::default()
        };
        let mut r = Reconciler::new(remote, SyncMode::Normal).with_pacing(Duration::ZERO);

        let err = r.reconcile(&mut defs, &Catalog::new()).expect_err("update fails");

        assert_eq!(err.kind(), ErrorKind::RemoteOperation);
        assert_eq!(err.to_string(), "update Mine: stub failure");
    }

    #[test]
    fn description_is_forwarded() {
        struct Capture(Option<SavedSearchInput>);

        impl RemoteOperations for Capture {
            type Error = StubError;

            fn create(&mut self, input: &SavedSearchInput) -> Result<String, StubError> {
                self.0 = Some(input.clone());
                Ok("SSC_1".to_string())
            }

            fn update(&mut self, _: &str, _: &SavedSearchInput) -> Result<(), StubError> {
                Ok(())
            }

            fn delete(&mut self, _: &str) -> Result<(), StubError> {
                Ok(())
            }
        }

        let mut defs = vec![Definition {
            description: Some("triage queue".to_string()),
            ..Definition::with_query("Mine", "is:open")
        }];
        let mut r = Reconciler::new(Capture(None), SyncMode::Normal).with_pacing(Duration::ZERO);
        r.reconcile(&mut defs, &Catalog::new()).expect("create");

        let input = r.into_remote().0.expect("captured input");
        assert_eq!(input.description.as_deref(), Some("triage queue"));
        assert_eq!(input.query, "is:open");
    }
}
