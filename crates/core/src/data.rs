//! Wire data structures exchanged with the report server

use crate::error::{Error, Result};
use crate::statistics::{PerRevisionStats, Statistic};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A build/commit point, or the newest one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    Number(u64),
    Latest,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Number(n) => write!(f, "{}", n),
            Revision::Latest => f.write_str("latest"),
        }
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "latest" {
            return Ok(Revision::Latest);
        }
        s.parse::<u64>()
            .map(Revision::Number)
            .map_err(|_| Error::InvalidRevision(s.to_string()))
    }
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Revision::Number(n) => serializer.serialize_u64(*n),
            Revision::Latest => serializer.serialize_str("latest"),
        }
    }
}

impl<'de> Deserialize<'de> for Revision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Revision::Number(n)),
            Repr::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

fn unknown_direction_hint() -> i64 {
    crate::units::UNKNOWN_DIRECTION_HINT
}

/// One metric row of a report as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetricRow {
    /// Colon-separated hierarchical label
    pub label: String,
    #[serde(default)]
    pub units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_units: Option<String>,
    #[serde(rename = "improvement_direction", default = "unknown_direction_hint")]
    pub improvement_direction_hint: i64,
    #[serde(default, alias = "testSuites")]
    pub suites: Vec<String>,
    #[serde(default)]
    pub bots: Vec<String>,
    #[serde(default, alias = "testCases")]
    pub cases: Vec<String>,
    #[serde(default)]
    pub measurement: String,
    /// Cached statistics keyed by revision; revisions may be missing
    #[serde(default)]
    pub data: HashMap<String, PerRevisionStats>,
}

impl Default for RawMetricRow {
    fn default() -> Self {
        Self {
            label: String::new(),
            units: String::new(),
            legacy_units: None,
            improvement_direction_hint: unknown_direction_hint(),
            suites: Vec::new(),
            bots: Vec::new(),
            cases: Vec::new(),
            measurement: String::new(),
            data: HashMap::new(),
        }
    }
}

impl RawMetricRow {
    /// Cached statistics for a revision, if any
    pub fn stats_at(&self, revision: &Revision) -> Option<&PerRevisionStats> {
        self.data.get(&revision.to_string())
    }
}

/// Report body: rows plus the statistics the template selects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    #[serde(default)]
    pub rows: Vec<RawMetricRow>,
    #[serde(default)]
    pub statistics: Vec<Statistic>,
}

/// One generated report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub name: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub report: Option<RawReport>,
}

impl ReportResult {
    /// Rows of the report; malformed results have none
    pub fn rows(&self) -> &[RawMetricRow] {
        self.report.as_ref().map(|r| r.rows.as_slice()).unwrap_or(&[])
    }
}

/// A partial result delivered by a report source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportBatch {
    #[serde(default)]
    pub results: Vec<ReportResult>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// A report template known to the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub owners: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_parse_and_display() {
        assert_eq!("123".parse::<Revision>().unwrap(), Revision::Number(123));
        assert_eq!("latest".parse::<Revision>().unwrap(), Revision::Latest);
        assert!(matches!(
            "tip".parse::<Revision>(),
            Err(Error::InvalidRevision(s)) if s == "tip"
        ));
        assert_eq!(Revision::Number(7).to_string(), "7");
        assert_eq!(Revision::Latest.to_string(), "latest");
    }

    #[test]
    fn test_revision_json() {
        let revs: Vec<Revision> = serde_json::from_str(r#"[100, "latest"]"#).unwrap();
        assert_eq!(revs, vec![Revision::Number(100), Revision::Latest]);
        assert_eq!(serde_json::to_string(&revs).unwrap(), r#"[100,"latest"]"#);
    }

    #[test]
    fn test_row_defaults_and_aliases() {
        let row: RawMetricRow = serde_json::from_str(
            r#"{
                "label": "A:B",
                "units": "ms",
                "testSuites": ["suite"],
                "testCases": ["case"],
                "data": {"100": {"statistics": {"mean": 5, "count": 1}}}
            }"#,
        )
        .unwrap();
        assert_eq!(row.improvement_direction_hint, crate::units::UNKNOWN_DIRECTION_HINT);
        assert_eq!(row.suites, vec!["suite"]);
        assert_eq!(row.cases, vec!["case"]);
        assert!(row.stats_at(&Revision::Number(100)).is_some());
        assert!(row.stats_at(&Revision::Number(200)).is_none());
    }

    #[test]
    fn test_malformed_report_has_no_rows() {
        let result: ReportResult = serde_json::from_str(r#"{"name": "A"}"#).unwrap();
        assert!(result.rows().is_empty());

        let result: ReportResult =
            serde_json::from_str(r#"{"name": "A", "report": {"statistics": ["avg"]}}"#).unwrap();
        assert!(result.rows().is_empty());
    }
}
