//! Turning raw report rows into display-ready cells
//!
//! Every transformed row has the same slot layout so columns line up across
//! rows: for each of baseline and target, one point cell per statistic; then
//! for each statistic a relative delta cell and an absolute delta cell.
//! Missing cells are `None`, never omitted.

use crate::data::{RawMetricRow, Revision};
use crate::statistics::{extract, Statistic, StatisticSet, TimeseriesDescriptor};
use crate::units::{Change, ResolvedUnit, UnitDescriptor, UnitPrefix, UnitRegistry};
use serde::{Deserialize, Serialize};

/// One segment of a colon-separated row label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPart {
    pub href: String,
    pub label: String,
    /// First row of a vertical run of equal labels in this column
    pub is_first: bool,
    /// Length of the run this part starts; meaningful when `is_first`
    pub row_count: usize,
}

impl LabelPart {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
            is_first: true,
            row_count: 1,
        }
    }
}

/// A value with its unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarCell {
    pub unit: UnitDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_prefix: Option<UnitPrefix>,
    /// May be non-finite for relative deltas against a zero baseline
    pub value: f64,
}

impl ScalarCell {
    pub fn change(&self) -> Change {
        self.unit.change(self.value)
    }
}

/// A report row ready for display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedRow {
    pub label: String,
    pub label_parts: Vec<LabelPart>,
    pub scalars: Vec<Option<ScalarCell>>,
    pub actual_descriptors: Vec<TimeseriesDescriptor>,
    pub suites: Vec<String>,
    pub bots: Vec<String>,
    pub cases: Vec<String>,
    pub measurement: String,
}

/// Deep link to the chart of a row's timeseries
pub fn chart_href(origin: &str, row: &RawMetricRow) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    params.append_pair("measurement", &row.measurement);
    for suite in &row.suites {
        params.append_pair("suite", suite);
    }
    for bot in &row.bots {
        params.append_pair("bot", bot);
    }
    for case in &row.cases {
        params.append_pair("testCase", case);
    }
    format!("{}#{}", origin, params.finish())
}

/// Transforms raw rows against a fixed unit registry and link origin
#[derive(Debug, Clone, Copy)]
pub struct RowTransformer<'a> {
    units: &'a UnitRegistry,
    origin: &'a str,
}

impl<'a> RowTransformer<'a> {
    pub fn new(units: &'a UnitRegistry, origin: &'a str) -> Self {
        Self { units, origin }
    }

    pub fn units(&self) -> &'a UnitRegistry {
        self.units
    }

    /// Transform one raw row comparing `baseline` to `target`
    pub fn transform(
        &self,
        row: &RawMetricRow,
        baseline: &Revision,
        target: &Revision,
        statistics: &StatisticSet,
    ) -> TransformedRow {
        let href = chart_href(self.origin, row);
        let label_parts = row
            .label
            .split(':')
            .map(|label| LabelPart::new(label, href.as_str()))
            .collect();

        let resolved = self.units.resolve(
            &row.units,
            row.legacy_units.as_deref(),
            row.improvement_direction_hint,
        );

        let baseline_stats = row.stats_at(baseline);
        let target_stats = row.stats_at(target);
        let mut scalars = Vec::with_capacity(4 * statistics.len());

        for stats in [baseline_stats, target_stats] {
            for statistic in statistics.iter() {
                scalars.push(
                    extract(stats, statistic)
                        .map(|value| self.point_cell(&resolved, statistic, value)),
                );
            }
        }

        for statistic in statistics.iter() {
            let values = extract(baseline_stats, statistic).zip(extract(target_stats, statistic));
            let Some((base, current)) = values else {
                scalars.push(None);
                scalars.push(None);
                continue;
            };

            let factor = conversion_factor(&resolved, statistic);
            let delta = current * factor - base * factor;
            let delta_unit = self.units.delta_of(&self.statistic_unit(&resolved, statistic));

            scalars.push(Some(ScalarCell {
                unit: self
                    .units
                    .normalized_percentage_delta(delta_unit.improvement_direction),
                unit_prefix: None,
                value: delta / (base * factor),
            }));
            scalars.push(Some(ScalarCell {
                unit_prefix: prefix_for(&resolved, statistic),
                unit: delta_unit,
                value: delta,
            }));
        }

        let actual_descriptors = target_stats
            .or(baseline_stats)
            .map(|stats| stats.descriptors.clone())
            .unwrap_or_default();

        TransformedRow {
            label: row.label.clone(),
            label_parts,
            scalars,
            actual_descriptors,
            suites: row.suites.clone(),
            bots: row.bots.clone(),
            cases: row.cases.clone(),
            measurement: row.measurement.clone(),
        }
    }

    fn statistic_unit(&self, resolved: &ResolvedUnit, statistic: Statistic) -> UnitDescriptor {
        if statistic == Statistic::Count {
            self.units.count()
        } else {
            resolved.unit.clone()
        }
    }

    fn point_cell(&self, resolved: &ResolvedUnit, statistic: Statistic, value: f64) -> ScalarCell {
        ScalarCell {
            unit: self.statistic_unit(resolved, statistic),
            unit_prefix: prefix_for(resolved, statistic),
            value: value * conversion_factor(resolved, statistic),
        }
    }
}

fn conversion_factor(resolved: &ResolvedUnit, statistic: Statistic) -> f64 {
    if statistic == Statistic::Count {
        1.0
    } else {
        resolved.conversion_factor
    }
}

fn prefix_for(resolved: &ResolvedUnit, statistic: Statistic) -> Option<UnitPrefix> {
    if statistic == Statistic::Count {
        None
    } else {
        resolved.prefix
    }
}
