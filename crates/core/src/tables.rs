//! Report section state and its pure transition functions
//!
//! State is never mutated in place: every transition takes the current
//! snapshot and returns the next one. [`reduce`] dispatches typed
//! [`Action`]s to the individual transitions.

use crate::data::{ReportResult, Revision};
use crate::labels::align_label_parts;
use crate::query::{encode_route, MilestoneTable, RouteOptions};
use crate::statistics::{Statistic, StatisticSet};
use crate::transform::{RowTransformer, TransformedRow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reserved pseudo-name that asks for a blank template instead of a report
pub const CREATE: &str = "[Create new report]";

/// Report shown when nothing else is selected
pub const DEFAULT_NAME: &str = "Chromium Performance Overview";

/// Statistic picker attached to every table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticSelector {
    pub label: String,
    pub options: Vec<Statistic>,
    pub selected: StatisticSet,
    pub required: bool,
}

impl StatisticSelector {
    pub fn new(selected: StatisticSet) -> Self {
        Self {
            label: "Statistics".to_string(),
            options: Statistic::ALL.to_vec(),
            selected,
            required: true,
        }
    }
}

impl Default for StatisticSelector {
    fn default() -> Self {
        Self::new(StatisticSet::default())
    }
}

/// One report table of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    pub name: String,
    pub id: Option<i64>,
    pub internal: bool,
    pub can_edit: bool,
    pub is_editing: bool,
    /// Waiting for fetched data
    pub is_loading: bool,
    pub rows: Vec<TransformedRow>,
    pub max_label_parts: usize,
    pub owners: String,
    pub statistic: StatisticSelector,
}

impl ReportTable {
    /// A named table whose report has not arrived yet
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            internal: false,
            can_edit: false,
            is_editing: false,
            is_loading: true,
            rows: Vec::new(),
            max_label_parts: 0,
            owners: String::new(),
            statistic: StatisticSelector::default(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.is_loading && self.rows.is_empty()
    }
}

/// A blank, editable template seeded with one empty row
pub fn new_template(owner_email: Option<&str>) -> ReportTable {
    ReportTable {
        name: String::new(),
        id: None,
        internal: false,
        can_edit: true,
        is_editing: true,
        is_loading: false,
        rows: vec![TransformedRow::default()],
        max_label_parts: 0,
        owners: owner_email.unwrap_or_default().to_string(),
        statistic: StatisticSelector::default(),
    }
}

/// Everything the report section shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSectionState {
    /// Selected report names, possibly including [`CREATE`]
    pub sources: Vec<String>,
    pub min_revision: Option<Revision>,
    pub max_revision: Option<Revision>,
    pub milestone: Option<u32>,
    pub is_loading: bool,
    pub tables: Vec<ReportTable>,
    /// Section was opened with the default report
    pub contains_default_section: bool,
}

impl Default for ReportSectionState {
    fn default() -> Self {
        Self {
            sources: vec![DEFAULT_NAME.to_string()],
            min_revision: None,
            max_revision: None,
            milestone: None,
            is_loading: false,
            tables: vec![ReportTable::placeholder(DEFAULT_NAME)],
            contains_default_section: false,
        }
    }
}

impl ReportSectionState {
    /// Both ends of the revision range, when known
    pub fn revisions(&self) -> Option<(Revision, Revision)> {
        self.min_revision.zip(self.max_revision)
    }

    /// Selected names that name real reports
    pub fn report_names(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .map(String::as_str)
            .filter(|name| *name != CREATE)
    }

    pub fn table(&self, name: &str) -> Option<&ReportTable> {
        self.tables.iter().find(|table| table.name == name)
    }
}

/// Name of the table a selected name maps to; a blank template is named "" until saved
fn table_name(selected: &str) -> &str {
    if selected == CREATE {
        ""
    } else {
        selected
    }
}

/// Keep tables whose name is still selected and add placeholders for the rest.
///
/// The [`CREATE`] pseudo-name becomes a blank editable template. Marks the
/// section as loading.
pub fn request_tables(
    state: &ReportSectionState,
    selected: &[String],
    owner_email: Option<&str>,
) -> ReportSectionState {
    let mut tables: Vec<ReportTable> = state
        .tables
        .iter()
        .filter(|table| selected.iter().any(|name| table_name(name) == table.name))
        .cloned()
        .collect();

    for name in selected {
        let existing_name = table_name(name);
        if tables.iter().any(|table| table.name == existing_name) {
            continue;
        }
        if name == CREATE {
            tables.push(new_template(owner_email));
        } else {
            tables.push(ReportTable::placeholder(name.clone()));
        }
    }

    ReportSectionState {
        is_loading: true,
        tables,
        ..state.clone()
    }
}

/// Merge fetched reports into the section's tables.
///
/// Each report with rows replaces the table of the same name with a finished,
/// label-aligned table. Reports without rows are dropped. Nothing happens
/// while the revision range is unknown.
pub fn receive_tables(
    state: &ReportSectionState,
    reports: &[ReportResult],
    transformer: &RowTransformer<'_>,
) -> ReportSectionState {
    let Some((min_revision, max_revision)) = state.revisions() else {
        debug!("Ignoring {} reports without a revision range", reports.len());
        return state.clone();
    };

    let mut tables = state.tables.clone();
    for report in reports {
        let Some(raw) = report.report.as_ref().filter(|r| !r.rows.is_empty()) else {
            debug!("Dropping report '{}' without rows", report.name);
            continue;
        };

        tables.retain(|table| table.name != report.name);

        let statistics = StatisticSet::new(raw.statistics.iter().copied());
        let mut rows: Vec<TransformedRow> = raw
            .rows
            .iter()
            .map(|row| transformer.transform(row, &min_revision, &max_revision, &statistics))
            .collect();
        let max_label_parts = align_label_parts(&mut rows);

        tables.push(ReportTable {
            name: report.name.clone(),
            id: report.id,
            internal: report.internal,
            can_edit: false,
            is_editing: false,
            is_loading: false,
            rows,
            max_label_parts,
            owners: report.owners.join(", "),
            statistic: StatisticSelector::new(statistics),
        });
    }

    ReportSectionState {
        tables,
        ..state.clone()
    }
}

/// Apply route options to a section.
///
/// When either revision is unknown, the milestone selects the range.
pub fn restore_state(
    state: &ReportSectionState,
    options: &RouteOptions,
    milestones: &MilestoneTable,
) -> ReportSectionState {
    let milestone = options.milestone.or_else(|| milestones.current());
    let (mut min_revision, mut max_revision) = (options.min_revision, options.max_revision);
    if min_revision.is_none() || max_revision.is_none() {
        if let Some((min, max)) = milestone.and_then(|m| milestones.range(m)) {
            min_revision = Some(min);
            max_revision = Some(max);
        }
    }

    ReportSectionState {
        sources: options.sources.clone(),
        milestone,
        min_revision,
        max_revision,
        ..state.clone()
    }
}

/// Route query string for a section; empty for an untouched default section
pub fn route_params(state: &ReportSectionState) -> String {
    if state.contains_default_section
        && state.sources.len() == 1
        && state.sources[0] == DEFAULT_NAME
    {
        return String::new();
    }
    let sources: Vec<&str> = state.report_names().collect();
    encode_route(&sources, state.min_revision, state.max_revision)
}

/// What a section remembers between sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub sources: Vec<String>,
    pub milestone: Option<u32>,
}

pub fn session_state(state: &ReportSectionState) -> SessionState {
    SessionState {
        sources: state.sources.clone(),
        milestone: state.milestone,
    }
}

/// A state transition request
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RestoreState(RouteOptions),
    SelectSources(Vec<String>),
    SelectRevisions {
        min: Option<Revision>,
        max: Option<Revision>,
    },
    RequestTables,
    ReceiveTables(Vec<ReportResult>),
    FinishLoading,
}

/// Read-only collaborators the reducer needs
#[derive(Debug, Clone, Copy)]
pub struct ReduceContext<'a> {
    pub transformer: RowTransformer<'a>,
    pub milestones: &'a MilestoneTable,
    pub user_email: Option<&'a str>,
}

/// Produce the next state for an action
pub fn reduce(
    state: &ReportSectionState,
    action: &Action,
    ctx: &ReduceContext<'_>,
) -> ReportSectionState {
    match action {
        Action::RestoreState(options) => restore_state(state, options, ctx.milestones),
        Action::SelectSources(sources) => ReportSectionState {
            sources: sources.clone(),
            ..state.clone()
        },
        Action::SelectRevisions { min, max } => ReportSectionState {
            min_revision: *min,
            max_revision: *max,
            ..state.clone()
        },
        Action::RequestTables => request_tables(state, &state.sources, ctx.user_email),
        Action::ReceiveTables(reports) => receive_tables(state, reports, &ctx.transformer),
        Action::FinishLoading => ReportSectionState {
            is_loading: false,
            ..state.clone()
        },
    }
}
