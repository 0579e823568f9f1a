//! perf-report - Revision-to-revision performance report tables
//!
//! This library fetches named report templates from a dashboard server (or a
//! local fixture), turns their cached timeseries statistics into comparison
//! tables and keeps a report section's state in sync with its selection.
//!
//! # Features
//!
//! - Pluggable report sources (HTTP server or JSON fixture)
//! - Concurrent report loading with stale-result discarding
//! - Debounced reloads on selection or revision changes
//! - Pure table transformation in [`perf_report_core`]
//!
//! # Example
//!
//! ```no_run
//! use perf_report::{orchestrator::ReportStore, source::FixtureReportSource};
//! use perf_report_core::{render_markdown, Action, MilestoneTable, RouteOptions};
//! use std::sync::Arc;
//!
//! # async fn run() -> perf_report::Result<()> {
//! let source = FixtureReportSource::from_file("fixture.json".as_ref())?;
//! let store = ReportStore::new(Arc::new(source));
//!
//! let options = RouteOptions::from_query("report=Speed&minRev=100&maxRev=200", store.milestones());
//! store.dispatch(Action::RestoreState(options));
//! store.load_reports().await?;
//!
//! for table in &store.snapshot().tables {
//!     println!("{}", render_markdown(table));
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod orchestrator;
pub mod source;

pub use error::{Error, Result};
pub use orchestrator::{spawn_reload_on_change, LoadConfig, LoadOutcome, ReportStore};
pub use source::{Fixture, FixtureReportSource, ReportSource};
