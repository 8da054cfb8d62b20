use std::time::Duration;

use super::{ReportRequest, ReportResponse};
use crate::analysis::AnalysisResult;
use crate::error::{ReportError, ReportResult};

/// Client for the report endpoint (normally the local relay).
pub struct ReportClient {
    endpoint: String,
    client: reqwest::Client,
}

impl ReportClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> ReportResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Ask for a narrative describing `result`. A single request; no retry.
    pub async fn generate(&self, result: &AnalysisResult) -> ReportResult<String> {
        let body = ReportRequest::from(result);
        let resp = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        let parsed: Option<ReportResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = parsed.and_then(|r| r.error).unwrap_or(text);
            return Err(ReportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parsed
            .and_then(|r| r.report)
            .filter(|r| !r.trim().is_empty())
            .ok_or(ReportError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn genuine() -> AnalysisResult {
        AnalysisResult {
            fake_percentage: Some(4.25),
            is_likely_deepfake: false,
            top_frames: Vec::new(),
        }
    }

    #[tokio::test]
    async fn posts_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "fakePercentage": 4.25,
                "isLikelyDeepfake": false,
                "topFrames": []
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"report": "Looks genuine."})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReportClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.generate(&genuine()).await.unwrap(), "Looks genuine.");
    }

    #[tokio::test]
    async fn plain_text_error_bodies_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = ReportClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        match client.generate(&genuine()).await {
            Err(ReportError::Status { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_report_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = ReportClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.generate(&genuine()).await,
            Err(ReportError::EmptyCompletion)
        ));
    }
}
