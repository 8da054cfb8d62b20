//! Error types for every concern in the inspector.

use std::path::PathBuf;

use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Failures talking to the remote detection service.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Could not read video: {0}")]
    Read(#[from] std::io::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    #[error("Malformed analysis response: {0}")]
    Decode(String),
}

impl AnalysisError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Failures producing the narrative report, on either side of the relay.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Report service error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Language model returned no text")]
    EmptyCompletion,

    #[error("Language model API key is not configured")]
    MissingApiKey,
}

/// Failures acquiring or finishing a camera recording.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Could not open camera via {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Camera stopped unexpectedly: {0}")]
    Exited(String),

    #[error("Recording produced no video data")]
    EmptyRecording,

    #[error("Recording already stopped")]
    AlreadyStopped,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    pub fn exited(msg: impl Into<String>) -> Self {
        Self::Exited(msg.into())
    }
}

/// A file that cannot become the session's media.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("{} is not a supported video file", .0.display())]
    NotVideo(PathBuf),

    #[error("{name} is {size_mb} MB, the limit is {limit_mb} MB")]
    TooLarge {
        name: String,
        size_mb: u64,
        limit_mb: u64,
    },

    #[error("Cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A session operation attempted from the wrong phase, or an event
/// belonging to an abandoned request.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("No video selected")]
    NoMedia,

    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("Event belongs to an abandoned request")]
    Stale,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export yet: {0}")]
    NotReady(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the headless commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }
}
