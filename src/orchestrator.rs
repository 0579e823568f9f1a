//! Report load orchestration
//!
//! [`ReportStore`] owns the section state. Actions go through the reducer and
//! every new snapshot is published on a watch channel. [`ReportStore::load_reports`]
//! fetches all selected reports concurrently and merges batches in arrival
//! order, giving up as soon as the selection or revision range has moved on.

use crate::error::Result;
use crate::source::ReportSource;
use futures::stream::{self, StreamExt};
use perf_report_core::{
    reduce, Action, MilestoneTable, ReduceContext, ReportSectionState, Revision, RowTransformer,
    UnitRegistry,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quiet period before a selection or revision change triggers a load
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Configuration for the reload subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadConfig {
    pub debounce: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// How a call to [`ReportStore::load_reports`] ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No revision range selected yet
    Skipped,
    /// Selection or revisions changed mid-flight; remaining batches dropped
    Stale,
    /// Every batch merged; per-template failures are listed
    Completed { errors: Vec<String> },
}

/// The part of the state a load depends on
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadKey {
    sources: BTreeSet<String>,
    min_revision: Option<Revision>,
    max_revision: Option<Revision>,
}

impl LoadKey {
    fn of(state: &ReportSectionState) -> Self {
        Self {
            sources: state.sources.iter().cloned().collect(),
            min_revision: state.min_revision,
            max_revision: state.max_revision,
        }
    }
}

/// Section state container wired to a report source
pub struct ReportStore {
    state: watch::Sender<ReportSectionState>,
    source: Arc<dyn ReportSource>,
    units: Arc<UnitRegistry>,
    milestones: Arc<MilestoneTable>,
    origin: String,
    user_email: Option<String>,
}

impl ReportStore {
    /// A store with the default section state, standard units and Chromium milestones
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        let (state, _) = watch::channel(ReportSectionState::default());
        Self {
            state,
            source,
            units: Arc::new(UnitRegistry::standard()),
            milestones: Arc::new(MilestoneTable::chromium()),
            origin: String::new(),
            user_email: None,
        }
    }

    /// Origin prefixed to chart links
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Owner seeded into new templates
    pub fn with_user_email(mut self, email: Option<String>) -> Self {
        self.user_email = email;
        self
    }

    pub fn with_milestones(mut self, milestones: Arc<MilestoneTable>) -> Self {
        self.milestones = milestones;
        self
    }

    pub fn with_units(mut self, units: Arc<UnitRegistry>) -> Self {
        self.units = units;
        self
    }

    pub fn milestones(&self) -> &MilestoneTable {
        &self.milestones
    }

    /// Current state
    pub fn snapshot(&self) -> ReportSectionState {
        self.state.borrow().clone()
    }

    /// Receive every state published from now on
    pub fn subscribe(&self) -> watch::Receiver<ReportSectionState> {
        self.state.subscribe()
    }

    fn context(&self) -> ReduceContext<'_> {
        ReduceContext {
            transformer: RowTransformer::new(&self.units, &self.origin),
            milestones: &self.milestones,
            user_email: self.user_email.as_deref(),
        }
    }

    /// Run an action through the reducer and publish the result
    pub fn dispatch(&self, action: Action) {
        let ctx = self.context();
        self.state
            .send_modify(|state| *state = reduce(state, &action, &ctx));
    }

    /// Run an action only while the load key still matches, as one step.
    ///
    /// Returns `false` and leaves the state untouched on a mismatch.
    fn dispatch_if_current(&self, key: &LoadKey, action: Action) -> bool {
        let ctx = self.context();
        self.state.send_if_modified(|state| {
            if LoadKey::of(state) != *key {
                return false;
            }
            *state = reduce(state, &action, &ctx);
            true
        })
    }

    /// Fetch and merge every selected report for the current revision range.
    ///
    /// Placeholders are put in place first. Batches from all templates are
    /// merged as they arrive; before each merge the selection and revision
    /// range are compared with the ones the load started with, and on any
    /// difference the load stops without touching the state again.
    pub async fn load_reports(&self) -> Result<LoadOutcome> {
        let started = self.snapshot();
        let Some(revisions) = started.revisions() else {
            debug!("No revision range selected, not loading reports");
            return Ok(LoadOutcome::Skipped);
        };
        let key = LoadKey::of(&started);

        self.dispatch(Action::RequestTables);

        let templates = match self.source.report_names().await {
            Ok(templates) => templates,
            Err(e) => {
                self.dispatch(Action::FinishLoading);
                return Err(e);
            }
        };

        let wanted: BTreeSet<&str> = started.report_names().collect();
        let selected: Vec<_> = templates
            .iter()
            .filter(|template| wanted.contains(template.name.as_str()))
            .collect();
        if selected.len() < wanted.len() {
            debug!(
                "{} of {} selected reports have no template",
                wanted.len() - selected.len(),
                wanted.len()
            );
        }

        info!(
            "Loading {} reports for revisions {}..{}",
            selected.len(),
            revisions.0,
            revisions.1
        );

        let mut batches = stream::select_all(
            selected
                .iter()
                .map(|template| self.source.report(template, revisions)),
        );

        let mut errors = Vec::new();
        while let Some(batch) = batches.next().await {
            for error in &batch.errors {
                warn!("Failed to load report: {}", error);
            }
            errors.extend(batch.errors);

            debug!("Merging {} report results", batch.results.len());
            if !self.dispatch_if_current(&key, Action::ReceiveTables(batch.results)) {
                debug!("Selection changed while loading, discarding results");
                return Ok(LoadOutcome::Stale);
            }
        }

        self.dispatch(Action::FinishLoading);
        Ok(LoadOutcome::Completed { errors })
    }
}

/// Reload whenever the selection or revision range changes and then stays
/// unchanged for `config.debounce`.
///
/// Each load runs in its own task; overlapping loads resolve through the
/// staleness check. Runs until aborted.
pub fn spawn_reload_on_change(store: Arc<ReportStore>, config: LoadConfig) -> JoinHandle<()> {
    let mut rx = store.subscribe();
    let mut last = LoadKey::of(&rx.borrow_and_update());

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let key = LoadKey::of(&rx.borrow_and_update());
            if key == last {
                continue;
            }

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(config.debounce) => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            let key = LoadKey::of(&rx.borrow_and_update());
            if key == last {
                continue;
            }
            last = key;

            let store = Arc::clone(&store);
            tokio::spawn(async move {
                if let Err(e) = store.load_reports().await {
                    warn!("Report load failed: {}", e);
                }
            });
        }
    })
}
