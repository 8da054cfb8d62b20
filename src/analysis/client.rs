//! HTTP client for the remote deepfake detector.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio::io::AsyncReadExt;

use super::models::AnalysisResult;
use crate::error::AnalysisError;
use crate::session::UploadSource;

const UPLOAD_CHUNK: usize = 64 * 1024;

/// Progress reported while a request is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Percentage of the video handed to the transport.
    Progress(f64),
    /// The service answered with a success status; the body is still pending.
    Acknowledged,
}

pub struct AnalysisClient {
    endpoint: String,
    client: Client,
}

impl AnalysisClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Upload `source` as the `video` multipart field and parse the verdict.
    ///
    /// `on_event` sees monotonically increasing `Progress` values, then a
    /// single `Acknowledged` once the status line is a success.
    pub async fn analyze<F>(
        &self,
        source: &UploadSource,
        on_event: F,
    ) -> Result<AnalysisResult, AnalysisError>
    where
        F: Fn(UploadEvent) + Send + Sync + 'static,
    {
        let file = tokio::fs::File::open(&source.path).await?;
        let total = file.metadata().await?.len();

        // Read lazily so only one chunk of the video is in memory at a time.
        let on_event = Arc::new(on_event);
        let progress = on_event.clone();
        let stream = futures_util::stream::try_unfold((file, 0u64), move |(mut file, sent)| {
            let progress = progress.clone();
            async move {
                let mut chunk = vec![0u8; UPLOAD_CHUNK];
                let read = file.read(&mut chunk).await?;
                if read == 0 {
                    return Ok::<_, std::io::Error>(None);
                }
                chunk.truncate(read);
                let sent = sent + read as u64;
                progress(UploadEvent::Progress(upload_percent(sent, total)));
                Ok(Some((chunk, (file, sent))))
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(source.file_name.clone())
            .mime_str(&source.mime)?;
        let form = Form::new().part("video", part);

        log::info!(
            "Uploading {} ({:.1} MB) to {}",
            source.file_name,
            total as f64 / 1_048_576.0,
            self.endpoint
        );

        let resp = self.client.post(&self.endpoint).multipart(form).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Status { status, body });
        }

        on_event(UploadEvent::Acknowledged);

        let body = resp.bytes().await?;
        let result: AnalysisResult =
            serde_json::from_slice(&body).map_err(|e| AnalysisError::decode(e.to_string()))?;

        log::info!(
            "Analysis complete: deepfake={} fake={}",
            result.is_likely_deepfake,
            result.percentage_text()
        );
        Ok(result)
    }
}

fn upload_percent(sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    sent as f64 / total as f64 * 100.0
}
