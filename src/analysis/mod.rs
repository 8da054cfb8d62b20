mod client;
mod models;

pub use client::{AnalysisClient, UploadEvent};
pub use models::{
    format_percentage, percent_to_fraction, AnalysisResult, TopFrame, DEEPFAKE_VERDICT,
    GENUINE_VERDICT,
};
