use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEEPFAKE_VERDICT: &str = "This video is likely a deepfake.";
pub const GENUINE_VERDICT: &str = "This video is likely genuine.";

/// One of the frames the detector weighted most heavily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFrame {
    #[serde(default, deserialize_with = "frame_index")]
    pub frame_number: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prediction: String,
    /// Confidence in [0, 1] as reported; never validated.
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
    /// Base64-encoded PNG.
    #[serde(default)]
    pub visualization: Option<String>,
}

impl TopFrame {
    /// Confidence as a percentage with two decimals, e.g. `93.10%`.
    pub fn confidence_text(&self) -> String {
        format_percentage(self.confidence * 100.0)
    }

    /// Decoded visualization bytes, if present and valid base64.
    pub fn visualization_bytes(&self) -> Option<Vec<u8>> {
        let encoded = self.visualization.as_deref()?.trim();
        if encoded.is_empty() {
            return None;
        }
        match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Frame {} has an undecodable visualization: {e}", self.frame_number);
                None
            }
        }
    }
}

/// `null` decodes like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Frame indices sometimes arrive as `3.0`. Only whole, non-negative
/// values are accepted.
fn frame_index<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Int(u64),
        Float(f64),
    }

    match Option::<Index>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Index::Int(n)) => Ok(n),
        Some(Index::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        Some(Index::Float(f)) => Err(D::Error::custom(format!("invalid frame number {f}"))),
    }
}

/// Verdict returned by the detection service.
///
/// Older service revisions only return the boolean verdict, so the
/// percentage and frames are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub fake_percentage: Option<f64>,
    pub is_likely_deepfake: bool,
    #[serde(default)]
    pub top_frames: Vec<TopFrame>,
}

impl AnalysisResult {
    pub fn verdict_text(&self) -> &'static str {
        if self.is_likely_deepfake {
            DEEPFAKE_VERDICT
        } else {
            GENUINE_VERDICT
        }
    }

    /// `87.50%`, or `n/a` when the service did not report a percentage.
    pub fn percentage_text(&self) -> String {
        match self.fake_percentage {
            Some(p) => format_percentage(p),
            None => "n/a".into(),
        }
    }

    /// Percentage mapped to a progress fraction in [0, 1].
    pub fn percentage_fraction(&self) -> f64 {
        self.fake_percentage.map(percent_to_fraction).unwrap_or(0.0)
    }
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

/// Clamp a 0–100 value into a progress fraction. NaN maps to zero.
pub fn percent_to_fraction(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    (value / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_response_parses_and_renders() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{
                "fake_percentage": 87.5,
                "is_likely_deepfake": true,
                "top_frames": [
                    {"frame_number": 12, "prediction": "fake", "confidence": 0.931, "visualization": "aGk="}
                ]
            }"#,
        )
        .unwrap();

        assert!(result.verdict_text().contains("likely a deepfake"));
        assert_eq!(result.percentage_text(), "87.50%");
        assert_eq!(result.top_frames[0].confidence_text(), "93.10%");
        assert_eq!(result.top_frames[0].visualization_bytes().unwrap(), b"hi");
    }

    #[test]
    fn verdict_only_response_degrades() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"is_likely_deepfake": false}"#).unwrap();
        assert_eq!(result.verdict_text(), GENUINE_VERDICT);
        assert_eq!(result.percentage_text(), "n/a");
        assert_eq!(result.percentage_fraction(), 0.0);
        assert!(result.top_frames.is_empty());
    }

    #[test]
    fn missing_verdict_is_rejected() {
        assert!(serde_json::from_str::<AnalysisResult>(r#"{"fake_percentage": 3}"#).is_err());
    }

    #[test]
    fn sparse_frames_take_defaults() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{"is_likely_deepfake": true, "top_frames": [{"frame_number": 4}]}"#,
        )
        .unwrap();
        let frame = &result.top_frames[0];
        assert_eq!(frame.prediction, "");
        assert_eq!(frame.confidence, 0.0);
        assert!(frame.visualization_bytes().is_none());
    }

    #[test]
    fn null_frame_fields_take_defaults() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{
                "is_likely_deepfake": true,
                "top_frames": [
                    {"frame_number": null, "prediction": null, "confidence": null, "visualization": null},
                    {"frame_number": 5, "prediction": "fake", "confidence": 0.8}
                ]
            }"#,
        )
        .unwrap();
        let sparse = &result.top_frames[0];
        assert_eq!(sparse.frame_number, 0);
        assert_eq!(sparse.prediction, "");
        assert_eq!(sparse.confidence_text(), "0.00%");
        assert!(sparse.visualization.is_none());
        assert_eq!(result.top_frames[1].frame_number, 5);
    }

    #[test]
    fn whole_float_frame_numbers_are_accepted() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{"is_likely_deepfake": false, "top_frames": [{"frame_number": 3.0, "confidence": 0.4}]}"#,
        )
        .unwrap();
        assert_eq!(result.top_frames[0].frame_number, 3);

        for bad in ["3.5", "-1", "\"three\""] {
            let body = format!(r#"{{"is_likely_deepfake": false, "top_frames": [{{"frame_number": {bad}}}]}}"#);
            assert!(serde_json::from_str::<AnalysisResult>(&body).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn out_of_range_values_are_kept_but_clamped_for_display() {
        assert_eq!(percent_to_fraction(140.0), 1.0);
        assert_eq!(percent_to_fraction(-3.0), 0.0);
        assert_eq!(percent_to_fraction(f64::NAN), 0.0);
        assert_eq!(format_percentage(140.0), "140.00%");
    }

    #[test]
    fn bad_base64_is_ignored() {
        let frame = TopFrame {
            frame_number: 1,
            prediction: "real".into(),
            confidence: 0.5,
            visualization: Some("%%%".into()),
        };
        assert!(frame.visualization_bytes().is_none());
    }
}
