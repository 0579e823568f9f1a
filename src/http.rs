//! Report server client

use crate::error::{Error, Result};
use crate::source::ReportSource;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use perf_report_core::{ReportBatch, ReportResult, Revision, TemplateInfo};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;
use url::Url;

const NAMES_PATH: &str = "api/report/names";
const GENERATE_PATH: &str = "api/report/generate";

/// Fetches templates and reports from a dashboard server
#[derive(Debug, Clone)]
pub struct HttpReportSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpReportSource {
    /// Create a client for the server at `base`
    pub fn new(base: &str) -> Result<Self> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("perf-report"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

/// Form fields of a report generation request
pub fn generate_form(
    template: &TemplateInfo,
    revisions: (Revision, Revision),
) -> Vec<(&'static str, String)> {
    let mut form = Vec::with_capacity(3);
    if let Some(id) = template.id {
        form.push(("id", id.to_string()));
    }
    if let Some(modified) = template.modified {
        form.push(("modified", modified.timestamp_millis().to_string()));
    }
    form.push(("revisions", format!("{},{}", revisions.0, revisions.1)));
    form
}

async fn fetch_report(
    client: &reqwest::Client,
    url: Url,
    form: &[(&'static str, String)],
) -> Result<ReportResult> {
    let result = client
        .post(url)
        .form(form)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::SourceError(format!("Failed to generate report: {}", e)))?
        .json()
        .await?;
    Ok(result)
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn report_names(&self) -> Result<Vec<TemplateInfo>> {
        let url = self.endpoint(NAMES_PATH)?;
        debug!("Fetching report templates from {}", url);

        let templates = self
            .client
            .post(url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::SourceError(format!("Failed to list report templates: {}", e)))?
            .json()
            .await?;
        Ok(templates)
    }

    fn report(
        &self,
        template: &TemplateInfo,
        revisions: (Revision, Revision),
    ) -> BoxStream<'static, ReportBatch> {
        let client = self.client.clone();
        let url = self.endpoint(GENERATE_PATH);
        let name = template.name.clone();
        let form = generate_form(template, revisions);

        stream::once(async move {
            let result = match url {
                Ok(url) => fetch_report(&client, url, &form).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(result) => ReportBatch {
                    results: vec![result],
                    errors: Vec::new(),
                },
                Err(e) => ReportBatch {
                    results: Vec::new(),
                    errors: vec![format!("{}: {}", name, e)],
                },
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_template() -> TemplateInfo {
        TemplateInfo {
            name: "Speed".to_string(),
            id: Some(42),
            modified: Utc.timestamp_millis_opt(1_500_000_000_000).single(),
            internal: false,
            owners: vec!["a@example.com".to_string()],
        }
    }

    #[test]
    fn test_generate_form() {
        let form = generate_form(&make_template(), (Revision::Number(100), Revision::Latest));
        assert_eq!(
            form,
            vec![
                ("id", "42".to_string()),
                ("modified", "1500000000000".to_string()),
                ("revisions", "100,latest".to_string()),
            ]
        );
    }

    #[test]
    fn test_base_gets_trailing_slash() {
        let source = HttpReportSource::new("https://perf.example.com/dashboard").unwrap();
        assert_eq!(
            source.endpoint(NAMES_PATH).unwrap().as_str(),
            "https://perf.example.com/dashboard/api/report/names"
        );
        assert!(HttpReportSource::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_report_names() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/report/names"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Speed", "id": 42, "owners": ["a@example.com"]},
                {"name": "Memory", "id": 7, "internal": true}
            ])))
            .mount(&mock_server)
            .await;

        let source = HttpReportSource::new(&mock_server.uri()).unwrap();
        let templates = source.report_names().await.unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[1].name, "Memory");
        assert!(templates[1].internal);
    }

    #[tokio::test]
    async fn test_report_generate() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/report/generate"))
            .and(body_string_contains("revisions=100%2C200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Speed",
                "id": 42,
                "owners": ["a@example.com"],
                "report": {
                    "statistics": ["avg"],
                    "rows": [{"label": "Load", "units": "ms", "data": {}}]
                }
            })))
            .mount(&mock_server)
            .await;

        let source = HttpReportSource::new(&mock_server.uri()).unwrap();
        let batches: Vec<ReportBatch> = source
            .report(&make_template(), (Revision::Number(100), Revision::Number(200)))
            .collect()
            .await;

        assert_eq!(batches.len(), 1);
        assert!(batches[0].errors.is_empty());
        assert_eq!(batches[0].results[0].rows().len(), 1);
    }

    #[tokio::test]
    async fn test_report_failure_becomes_batch_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/report/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let source = HttpReportSource::new(&mock_server.uri()).unwrap();
        let batches: Vec<ReportBatch> = source
            .report(&make_template(), (Revision::Number(100), Revision::Number(200)))
            .collect()
            .await;

        assert!(batches[0].results.is_empty());
        assert_eq!(batches[0].errors.len(), 1);
        assert!(batches[0].errors[0].starts_with("Speed: "));
    }
}
