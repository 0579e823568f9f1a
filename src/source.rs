//! Report sources: where template registries and report batches come from

use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use perf_report_core::{RawReport, ReportBatch, ReportResult, Revision, TemplateInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A producer of report templates and generated reports.
///
/// `report` never fails as a whole: a failure for one template is delivered
/// as a batch whose `errors` names it.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Every template the source knows about
    async fn report_names(&self) -> Result<Vec<TemplateInfo>>;

    /// Generate one report over `(min, max)`, as zero or more batches
    fn report(
        &self,
        template: &TemplateInfo,
        revisions: (Revision, Revision),
    ) -> BoxStream<'static, ReportBatch>;
}

/// On-disk fixture: template registry plus one report body per template name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub templates: Vec<TemplateInfo>,
    #[serde(default)]
    pub reports: HashMap<String, RawReport>,
}

/// Serves reports from an in-memory [`Fixture`]
#[derive(Debug, Clone, Default)]
pub struct FixtureReportSource {
    fixture: Fixture,
}

impl FixtureReportSource {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }

    /// Load a fixture from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        Ok(Self::new(fixture))
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }
}

#[async_trait]
impl ReportSource for FixtureReportSource {
    async fn report_names(&self) -> Result<Vec<TemplateInfo>> {
        Ok(self.fixture.templates.clone())
    }

    fn report(
        &self,
        template: &TemplateInfo,
        _revisions: (Revision, Revision),
    ) -> BoxStream<'static, ReportBatch> {
        let batch = match self.fixture.reports.get(&template.name) {
            Some(report) => ReportBatch {
                results: vec![ReportResult {
                    name: template.name.clone(),
                    id: template.id,
                    internal: template.internal,
                    owners: template.owners.clone(),
                    report: Some(report.clone()),
                }],
                errors: Vec::new(),
            },
            None => ReportBatch {
                results: Vec::new(),
                errors: vec![format!("No report for template '{}'", template.name)],
            },
        };
        stream::once(async move { batch }).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FIXTURE: &str = r#"{
        "templates": [
            {"name": "Speed", "id": 1, "owners": ["a@example.com"]},
            {"name": "Missing", "id": 2}
        ],
        "reports": {
            "Speed": {
                "statistics": ["avg"],
                "rows": [{"label": "Load", "units": "ms", "data": {}}]
            }
        }
    }"#;

    fn make_source() -> FixtureReportSource {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        FixtureReportSource::from_file(file.path()).unwrap()
    }

    #[tokio::test]
    async fn test_fixture_templates() {
        let source = make_source();
        let names: Vec<String> = source
            .report_names()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Speed", "Missing"]);
    }

    #[tokio::test]
    async fn test_fixture_report_batches() {
        let source = make_source();
        let templates = source.report_names().await.unwrap();
        let revisions = (Revision::Number(1), Revision::Latest);

        let batches: Vec<ReportBatch> = source.report(&templates[0], revisions).collect().await;
        assert_eq!(batches.len(), 1);
        let result = &batches[0].results[0];
        assert_eq!(result.name, "Speed");
        assert_eq!(result.id, Some(1));
        assert_eq!(result.owners, vec!["a@example.com"]);
        assert_eq!(result.rows().len(), 1);

        let batches: Vec<ReportBatch> = source.report(&templates[1], revisions).collect().await;
        assert!(batches[0].results.is_empty());
        assert_eq!(batches[0].errors.len(), 1);
    }

    #[test]
    fn test_missing_fixture_file() {
        let err = FixtureReportSource::from_file(Path::new("/nonexistent/fixture.json"));
        assert!(matches!(err, Err(Error::FileReadError { .. })));
    }
}
