//! Statistic identifiers, per-revision statistics bundles and scalar extraction

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A named aggregate over repeated samples.
///
/// Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Statistic {
    #[serde(rename = "avg")]
    Avg,
    #[serde(rename = "std")]
    Std,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "median")]
    Median,
    #[serde(rename = "iqr")]
    Iqr,
    #[serde(rename = "p90", alias = "90%")]
    P90,
    #[serde(rename = "p95", alias = "95%")]
    P95,
    #[serde(rename = "p99", alias = "99%")]
    P99,
}

impl Statistic {
    pub const ALL: [Statistic; 10] = [
        Statistic::Avg,
        Statistic::Std,
        Statistic::Count,
        Statistic::Min,
        Statistic::Max,
        Statistic::Median,
        Statistic::Iqr,
        Statistic::P90,
        Statistic::P95,
        Statistic::P99,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Avg => "avg",
            Statistic::Std => "std",
            Statistic::Count => "count",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Median => "median",
            Statistic::Iqr => "iqr",
            Statistic::P90 => "p90",
            Statistic::P95 => "p95",
            Statistic::P99 => "p99",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "avg" | "mean" => Ok(Statistic::Avg),
            "std" | "stddev" => Ok(Statistic::Std),
            "count" => Ok(Statistic::Count),
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "median" => Ok(Statistic::Median),
            "iqr" => Ok(Statistic::Iqr),
            "p90" | "90%" => Ok(Statistic::P90),
            "p95" | "95%" => Ok(Statistic::P95),
            "p99" | "99%" => Ok(Statistic::P99),
            other => Err(Error::UnknownStatistic(other.to_string())),
        }
    }
}

/// A non-empty, deduplicated set of statistics kept in canonical order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Statistic>", into = "Vec<Statistic>")]
pub struct StatisticSet(BTreeSet<Statistic>);

impl StatisticSet {
    /// Build a set from any selection; an empty selection yields the default `{avg}`
    pub fn new(selection: impl IntoIterator<Item = Statistic>) -> Self {
        let set: BTreeSet<Statistic> = selection.into_iter().collect();
        if set.is_empty() {
            Self::default()
        } else {
            Self(set)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Statistic> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, statistic: Statistic) -> bool {
        self.0.contains(&statistic)
    }
}

impl Default for StatisticSet {
    fn default() -> Self {
        Self(BTreeSet::from([Statistic::Avg]))
    }
}

impl From<Vec<Statistic>> for StatisticSet {
    fn from(selection: Vec<Statistic>) -> Self {
        Self::new(selection)
    }
}

impl From<StatisticSet> for Vec<Statistic> {
    fn from(set: StatisticSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Sorted sample reservoir that quantiles are interpolated from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct QuantileSummary(Vec<f64>);

impl QuantileSummary {
    /// Linearly interpolated quantile, `None` without samples
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let samples = &self.0;
        match samples.len() {
            0 => None,
            1 => Some(samples[0]),
            n => {
                let position = q.clamp(0.0, 1.0) * (n - 1) as f64;
                let lower = position.floor() as usize;
                let upper = position.ceil() as usize;
                let fraction = position - lower as f64;
                Some(samples[lower] + (samples[upper] - samples[lower]) * fraction)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for QuantileSummary {
    fn from(mut samples: Vec<f64>) -> Self {
        samples.sort_by(f64::total_cmp);
        Self(samples)
    }
}

impl From<QuantileSummary> for Vec<f64> {
    fn from(summary: QuantileSummary) -> Self {
        summary.0
    }
}

/// Aggregate statistics over the samples recorded for one revision
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStatistics {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub mean: f64,
    #[serde(default, alias = "stddev")]
    pub std: f64,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default, skip_serializing_if = "QuantileSummary::is_empty")]
    pub samples: QuantileSummary,
}

impl RunningStatistics {
    /// Aggregate raw samples (sample standard deviation)
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let samples: Vec<f64> = samples.into_iter().collect();
        let count = samples.len();
        if count == 0 {
            return Self::default();
        }

        let mean = samples.iter().sum::<f64>() / count as f64;
        let variance = if count > 1 {
            samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64
        } else {
            0.0
        };

        Self {
            count: count as u64,
            mean,
            std: variance.sqrt(),
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            samples: samples.into(),
        }
    }

    /// The value of one statistic; quantile statistics need samples
    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Avg => Some(self.mean),
            Statistic::Std => Some(self.std),
            Statistic::Count => Some(self.count as f64),
            Statistic::Min => Some(self.min),
            Statistic::Max => Some(self.max),
            Statistic::Median => self.samples.quantile(0.5),
            Statistic::Iqr => Some(self.samples.quantile(0.75)? - self.samples.quantile(0.25)?),
            Statistic::P90 => self.samples.quantile(0.90),
            Statistic::P95 => self.samples.quantile(0.95),
            Statistic::P99 => self.samples.quantile(0.99),
        }
    }
}

/// One timeseries that contributed to a row, used for chart links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesDescriptor {
    #[serde(default)]
    pub suite: String,
    #[serde(default)]
    pub measurement: String,
    #[serde(default)]
    pub bot: String,
    #[serde(default)]
    pub case: String,
}

/// Cached statistics for one revision of one row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerRevisionStats {
    pub statistics: RunningStatistics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptors: Vec<TimeseriesDescriptor>,
}

/// Extract a statistic from a revision's bundle.
///
/// A missing bundle (nothing cached for the revision) yields `None`.
pub fn extract(stats: Option<&PerRevisionStats>, statistic: Statistic) -> Option<f64> {
    stats?.statistics.get(statistic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(samples: &[f64]) -> PerRevisionStats {
        PerRevisionStats {
            statistics: RunningStatistics::from_samples(samples.iter().copied()),
            descriptors: Vec::new(),
        }
    }

    #[test]
    fn test_statistic_set_canonical_order() {
        let set = StatisticSet::new([Statistic::Max, Statistic::Avg, Statistic::Max, Statistic::P90]);
        let ordered: Vec<Statistic> = set.iter().collect();
        assert_eq!(ordered, vec![Statistic::Avg, Statistic::Max, Statistic::P90]);
    }

    #[test]
    fn test_statistic_set_defaults_to_avg() {
        let set = StatisticSet::new(Vec::new());
        assert_eq!(set.len(), 1);
        assert!(set.contains(Statistic::Avg));
    }

    #[test]
    fn test_statistic_wire_names() {
        let set: StatisticSet = serde_json::from_str(r#"["95%", "std", "avg"]"#).unwrap();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"["avg","std","p95"]"#
        );
        assert_eq!("90%".parse::<Statistic>().unwrap(), Statistic::P90);
        assert_eq!("mean".parse::<Statistic>().unwrap(), Statistic::Avg);
        assert!(matches!(
            "p50".parse::<Statistic>(),
            Err(Error::UnknownStatistic(s)) if s == "p50"
        ));
    }

    #[test]
    fn test_extract_basic_statistics() {
        let stats = bundle(&[2.0, 4.0, 6.0, 8.0]);
        assert_eq!(extract(Some(&stats), Statistic::Avg), Some(5.0));
        assert_eq!(extract(Some(&stats), Statistic::Count), Some(4.0));
        assert_eq!(extract(Some(&stats), Statistic::Min), Some(2.0));
        assert_eq!(extract(Some(&stats), Statistic::Max), Some(8.0));
        assert_eq!(extract(Some(&stats), Statistic::Median), Some(5.0));
        assert_eq!(extract(Some(&stats), Statistic::Iqr), Some(3.0));
    }

    #[test]
    fn test_extract_missing_bundle() {
        for statistic in Statistic::ALL {
            assert_eq!(extract(None, statistic), None);
        }
    }

    #[test]
    fn test_quantiles_need_samples() {
        let stats = PerRevisionStats {
            statistics: RunningStatistics {
                count: 3,
                mean: 5.0,
                ..Default::default()
            },
            descriptors: Vec::new(),
        };
        assert_eq!(extract(Some(&stats), Statistic::Avg), Some(5.0));
        assert_eq!(extract(Some(&stats), Statistic::Median), None);
        assert_eq!(extract(Some(&stats), Statistic::P99), None);
    }

    #[test]
    fn test_single_sample() {
        let stats = RunningStatistics::from_samples([3.0]);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.get(Statistic::P95), Some(3.0));
        assert_eq!(stats.get(Statistic::Iqr), Some(0.0));
    }

    #[test]
    fn test_percentile_interpolation() {
        let stats = RunningStatistics::from_samples((1..=11).map(f64::from));
        assert_eq!(stats.get(Statistic::P90), Some(10.0));
        assert_eq!(stats.get(Statistic::Median), Some(6.0));
    }

    #[test]
    fn test_deserialize_stddev_alias() {
        let stats: RunningStatistics =
            serde_json::from_str(r#"{"count": 2, "mean": 1.5, "stddev": 0.5, "min": 1, "max": 2}"#)
                .unwrap();
        assert_eq!(stats.std, 0.5);
        assert!(stats.samples.is_empty());
    }
}
