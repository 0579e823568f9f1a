//! perf-report-core - Report section model for performance dashboards
//!
//! This crate contains the pure, WASM-compatible part of perf-report: no I/O,
//! no async, no clocks. It can be shared between the CLI and any frontend.
//!
//! # Features
//!
//! - Resolve unit names (including legacy ones) to canonical descriptors
//! - Extract statistics from per-revision statistic bundles
//! - Transform raw report rows into baseline/target/delta cells
//! - Align hierarchical row labels into merged columns
//! - Reduce report section state and encode it to/from route parameters
//! - Render finished tables as markdown

pub mod data;
pub mod error;
pub mod labels;
pub mod query;
pub mod render;
pub mod statistics;
pub mod tables;
pub mod transform;
pub mod units;

pub use data::{RawMetricRow, RawReport, ReportBatch, ReportResult, Revision, TemplateInfo};
pub use error::{Error, Result};
pub use labels::align_label_parts;
pub use query::{encode_route, MilestoneTable, RouteOptions};
pub use render::render_markdown;
pub use statistics::{
    extract, PerRevisionStats, RunningStatistics, Statistic, StatisticSet, TimeseriesDescriptor,
};
pub use tables::{
    new_template, receive_tables, reduce, request_tables, restore_state, route_params,
    session_state, Action, ReduceContext, ReportSectionState, ReportTable, SessionState,
    StatisticSelector, CREATE, DEFAULT_NAME,
};
pub use transform::{LabelPart, RowTransformer, ScalarCell, TransformedRow};
pub use units::{Change, ImprovementDirection, ResolvedUnit, UnitDescriptor, UnitRegistry};
