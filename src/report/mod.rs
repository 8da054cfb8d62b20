//! Narrative reports: the request/response contract, the prompt, the
//! language-model client, the local relay that serves it, and the client
//! the UI uses to reach that relay.

mod client;
mod llm;
mod relay;

pub use client::ReportClient;
pub use llm::LlmClient;
pub use relay::serve;

use serde::{Deserialize, Serialize};

use crate::analysis::{format_percentage, AnalysisResult};

pub const SYSTEM_PROMPT: &str = "You are an AI expert specializing in deepfake detection. Provide a detailed analysis of the video based on the given data.";

/// Body of `POST /api/generate-report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub fake_percentage: Option<f64>,
    pub is_likely_deepfake: bool,
    #[serde(default)]
    pub top_frames: Vec<ReportFrame>,
}

/// Frame summary sent for a report. Visualizations stay on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFrame {
    #[serde(default)]
    pub frame_number: u64,
    #[serde(default)]
    pub prediction: String,
    #[serde(default)]
    pub confidence: f64,
}

impl From<&AnalysisResult> for ReportRequest {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            fake_percentage: result.fake_percentage,
            is_likely_deepfake: result.is_likely_deepfake,
            top_frames: result
                .top_frames
                .iter()
                .map(|f| ReportFrame {
                    frame_number: f.frame_number,
                    prediction: f.prediction.clone(),
                    confidence: f.confidence,
                })
                .collect(),
        }
    }
}

/// Either field may be absent; failures carry `error` with a 5xx status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The user turn sent to the language model.
pub fn user_prompt(req: &ReportRequest) -> String {
    let percentage = req
        .fake_percentage
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".into());
    let frames = req
        .top_frames
        .iter()
        .map(|f| {
            format!(
                "Frame {}: Prediction - {}, Confidence - {}",
                f.frame_number,
                f.prediction,
                format_percentage(f.confidence * 100.0)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this deepfake detection result:\n\
         Fake Percentage: {percentage}%\n\
         Is Likely Deepfake: {}\n\
         Top Frames:\n\
         {frames}\n\
         Provide a detailed report on the likelihood of the video being a deepfake, potential implications, and any patterns or anomalies in the top frames.",
        req.is_likely_deepfake
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TopFrame;

    fn request() -> ReportRequest {
        ReportRequest {
            fake_percentage: Some(87.5),
            is_likely_deepfake: true,
            top_frames: vec![
                ReportFrame {
                    frame_number: 12,
                    prediction: "fake".into(),
                    confidence: 0.931,
                },
                ReportFrame {
                    frame_number: 40,
                    prediction: "real".into(),
                    confidence: 0.5,
                },
            ],
        }
    }

    #[test]
    fn wire_format_uses_camel_case_outer_fields() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(value["fakePercentage"], 87.5);
        assert_eq!(value["isLikelyDeepfake"], true);
        assert_eq!(value["topFrames"][0]["frame_number"], 12);
        assert!(value["topFrames"][0].get("visualization").is_none());
    }

    #[test]
    fn request_from_result_drops_visualizations() {
        let result = AnalysisResult {
            fake_percentage: Some(12.0),
            is_likely_deepfake: false,
            top_frames: vec![TopFrame {
                frame_number: 1,
                prediction: "real".into(),
                confidence: 0.8,
                visualization: Some("aGk=".into()),
            }],
        };
        let req = ReportRequest::from(&result);
        assert_eq!(req.top_frames.len(), 1);
        assert_eq!(req.top_frames[0].prediction, "real");
        assert_eq!(req.fake_percentage, Some(12.0));
    }

    #[test]
    fn prompt_lists_every_frame() {
        let prompt = user_prompt(&request());
        assert!(prompt.starts_with("Analyze this deepfake detection result:\nFake Percentage: 87.5%\n"));
        assert!(prompt.contains("Is Likely Deepfake: true\nTop Frames:\n"));
        assert!(prompt.contains("Frame 12: Prediction - fake, Confidence - 93.10%\nFrame 40: Prediction - real, Confidence - 50.00%\n"));
        assert!(prompt.ends_with("anomalies in the top frames."));
    }

    #[test]
    fn prompt_without_percentage() {
        let mut req = request();
        req.fake_percentage = None;
        req.top_frames.clear();
        assert!(user_prompt(&req).contains("Fake Percentage: unknown%"));
    }

    #[test]
    fn missing_frames_deserialize_empty() {
        let req: ReportRequest =
            serde_json::from_str(r#"{"fakePercentage": 3.2, "isLikelyDeepfake": false}"#).unwrap();
        assert!(req.top_frames.is_empty());
    }
}
