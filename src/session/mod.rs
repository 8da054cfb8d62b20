//! Upload/analysis/report workflow for one selected video.
//!
//! Phases only move `Idle → Uploading → Analyzing → Complete`, or from an
//! in-flight phase to `Error`. Every request is stamped with a ticket; a
//! new selection bumps the generation so replies to abandoned requests are
//! rejected as [`SessionError::Stale`] instead of touching the new state.

mod media;
mod preview;

pub use media::{video_mime, MediaSelection, UploadSource};
pub use preview::PreviewHandle;

use crate::analysis::AnalysisResult;
use crate::error::SessionError;

const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Identifies one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Identifies one narrative report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    NotRequested,
    Pending,
    Ready(String),
    /// Advisory only; the analysis result stays valid.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Uploading { progress: f64 },
    Analyzing,
    Complete {
        result: AnalysisResult,
        report: ReportState,
    },
    Error { message: String },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading { .. } => "uploading",
            Phase::Analyzing => "analyzing",
            Phase::Complete { .. } => "complete",
            Phase::Error { .. } => "error",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Phase::Uploading { .. } | Phase::Analyzing)
    }
}

#[derive(Debug)]
pub struct UploadSession {
    media: Option<MediaSelection>,
    phase: Phase,
    generation: u64,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            media: None,
            phase: Phase::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn media(&self) -> Option<&MediaSelection> {
        self.media.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.phase {
            Phase::Complete { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&ReportState> {
        match &self.phase {
            Phase::Complete { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn can_upload(&self) -> bool {
        self.media.is_some() && self.phase == Phase::Idle
    }

    pub fn can_request_report(&self) -> bool {
        matches!(
            self.report(),
            Some(ReportState::NotRequested | ReportState::Failed(_))
        )
    }

    /// Replace the media and reset every result field. Any in-flight
    /// request is abandoned. The previous preview is released before the
    /// new selection is stored.
    pub fn select(&mut self, media: MediaSelection) {
        log::info!("Selected {} ({})", media.name(), media.mime());
        self.reset();
        self.media = Some(media);
    }

    /// Drop the media entirely, e.g. before recording again.
    pub fn clear_media(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        if self.phase.is_in_flight() {
            log::info!("Abandoning in-flight {} request", self.phase.name());
        }
        self.media = None;
        self.generation += 1;
        self.phase = Phase::Idle;
    }

    /// Attach a preview to the current selection. Without a selection the
    /// handle is released immediately.
    pub fn attach_preview(&mut self, handle: PreviewHandle) {
        match self.media.as_mut() {
            Some(media) => media.set_preview(handle),
            None => handle.release(),
        }
    }

    /// `Idle → Uploading`.
    pub fn begin_upload(&mut self) -> Result<(RequestTicket, UploadSource), SessionError> {
        let media = self.media.as_ref().ok_or(SessionError::NoMedia)?;
        if self.phase != Phase::Idle {
            return Err(self.invalid("upload"));
        }
        let source = media.upload_source();
        self.generation += 1;
        self.phase = Phase::Uploading { progress: 0.0 };
        log::info!("Uploading {}", source.file_name);
        Ok((RequestTicket(self.generation), source))
    }

    pub fn upload_progress(&mut self, ticket: RequestTicket, percent: f64) -> Result<(), SessionError> {
        self.check(ticket.0)?;
        if let Phase::Uploading { progress } = &mut self.phase {
            if percent > *progress {
                *progress = percent;
            }
            return Ok(());
        }
        Err(self.invalid("record upload progress"))
    }

    /// `Uploading → Analyzing`, once the service accepted the upload.
    pub fn acknowledge(&mut self, ticket: RequestTicket) -> Result<(), SessionError> {
        self.check(ticket.0)?;
        if !matches!(self.phase, Phase::Uploading { .. }) {
            return Err(self.invalid("start analyzing"));
        }
        log::debug!("Upload acknowledged, analyzing");
        self.phase = Phase::Analyzing;
        Ok(())
    }

    /// `Analyzing → Complete`. Values are stored as received.
    pub fn complete(&mut self, ticket: RequestTicket, result: AnalysisResult) -> Result<(), SessionError> {
        self.check(ticket.0)?;
        if self.phase != Phase::Analyzing {
            return Err(self.invalid("complete"));
        }
        self.phase = Phase::Complete {
            result,
            report: ReportState::NotRequested,
        };
        Ok(())
    }

    /// `Uploading | Analyzing → Error`.
    pub fn fail(&mut self, ticket: RequestTicket, message: impl Into<String>) -> Result<(), SessionError> {
        self.check(ticket.0)?;
        if !self.phase.is_in_flight() {
            return Err(self.invalid("fail"));
        }
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        log::error!("Analysis failed: {message}");
        self.phase = Phase::Error { message };
        Ok(())
    }

    /// Only a complete session without a pending or finished report can
    /// ask for one. Returns the result the report should describe.
    pub fn request_report(&mut self) -> Result<(ReportTicket, AnalysisResult), SessionError> {
        let generation = self.generation;
        let phase_name = self.phase.name();
        match &mut self.phase {
            Phase::Complete { result, report }
                if matches!(report, ReportState::NotRequested | ReportState::Failed(_)) =>
            {
                *report = ReportState::Pending;
                Ok((ReportTicket(generation), result.clone()))
            }
            _ => Err(SessionError::InvalidTransition {
                action: "request a report",
                phase: phase_name,
            }),
        }
    }

    pub fn report_ready(&mut self, ticket: ReportTicket, text: String) -> Result<(), SessionError> {
        self.finish_report(ticket, ReportState::Ready(text))
    }

    pub fn report_failed(&mut self, ticket: ReportTicket, message: impl Into<String>) -> Result<(), SessionError> {
        self.finish_report(ticket, ReportState::Failed(message.into()))
    }

    fn finish_report(&mut self, ticket: ReportTicket, outcome: ReportState) -> Result<(), SessionError> {
        self.check(ticket.0)?;
        let phase_name = self.phase.name();
        match &mut self.phase {
            Phase::Complete { report, .. } if *report == ReportState::Pending => {
                *report = outcome;
                Ok(())
            }
            _ => Err(SessionError::InvalidTransition {
                action: "finish a report",
                phase: phase_name,
            }),
        }
    }

    fn check(&self, generation: u64) -> Result<(), SessionError> {
        if generation == self.generation {
            Ok(())
        } else {
            Err(SessionError::Stale)
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}
