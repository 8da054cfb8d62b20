use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;

use super::selection::adopt_media;
use super::state::{refresh, show_notice, start_pulse, stop_pulse, AppState, BackendEvent, CaptureStatus};
use crate::error::SessionError;
use crate::kyc::KycOutcome;
use crate::session::{MediaSelection, UploadSession};

/// Handle a backend event. Session transitions happen here, on the main thread.
pub fn handle_backend_event(state: &Rc<RefCell<AppState>>, event: BackendEvent) {
    match event {
        BackendEvent::UploadProgress(ticket, percent) => {
            if apply(state, |session| session.upload_progress(ticket, percent)) {
                refresh(state);
            }
        }
        BackendEvent::UploadAcknowledged(ticket) => {
            if apply(state, |session| session.acknowledge(ticket)) {
                start_pulse(state);
                refresh(state);
            }
        }
        BackendEvent::AnalysisComplete(ticket, result) => {
            if !apply(state, |session| session.complete(ticket, result)) {
                return;
            }
            stop_pulse(state);
            {
                let mut s = state.borrow_mut();
                if let Some(result) = s.session.result() {
                    log::info!(
                        "Analysis complete: deepfake={}, {}",
                        result.is_likely_deepfake,
                        result.percentage_text()
                    );
                    if let Some(ref dash) = s.dashboard {
                        crate::ui::frames::fill(&dash.frames_box, &result.top_frames);
                    }
                }
                let outcome = s.session.result().map(KycOutcome::from_result);
                set_kyc_outcome(&mut s, outcome);
            }
            refresh(state);
        }
        BackendEvent::AnalysisFailed(ticket, message) => {
            if !apply(state, |session| session.fail(ticket, message.clone())) {
                return;
            }
            stop_pulse(state);
            set_kyc_outcome(&mut state.borrow_mut(), Some(KycOutcome::Error(message)));
            refresh(state);
        }
        BackendEvent::ReportReady(ticket, text) => {
            if !apply(state, |session| session.report_ready(ticket, text.clone())) {
                return;
            }
            log::info!("Report ready ({} chars)", text.len());
            if let Some(ref dash) = state.borrow().dashboard {
                dash.report_view.buffer().set_text(&text);
            }
            refresh(state);
        }
        BackendEvent::ReportFailed(ticket, message) => {
            if apply(state, |session| session.report_failed(ticket, message.clone())) {
                log::warn!("Report failed: {message}");
                refresh(state);
            }
        }
        BackendEvent::CaptureStarted(remaining) => {
            log::info!("Recording for {remaining}s");
            set_capture(state, CaptureStatus::Recording { remaining });
        }
        BackendEvent::CaptureTick(remaining) => {
            if state.borrow().capture.is_active() {
                set_capture(state, CaptureStatus::Recording { remaining });
            }
        }
        BackendEvent::CaptureComplete(clip) => {
            log::info!("Recording finished ({} bytes)", clip.size());
            {
                let mut s = state.borrow_mut();
                s.capture = CaptureStatus::Idle;
                s.capture_stop = None;
            }
            adopt_media(state, MediaSelection::recorded(clip));
        }
        BackendEvent::CaptureFailed(message) => {
            log::error!("Recording failed: {message}");
            {
                let mut s = state.borrow_mut();
                s.capture = CaptureStatus::Idle;
                s.capture_stop = None;
            }
            show_notice(state, &format!("Camera error: {message}"));
            refresh(state);
        }
    }
}

/// Run a session transition. Events from abandoned requests are dropped.
fn apply<F>(state: &Rc<RefCell<AppState>>, transition: F) -> bool
where
    F: FnOnce(&mut UploadSession) -> Result<(), SessionError>,
{
    let outcome = transition(&mut state.borrow_mut().session);
    match outcome {
        Ok(()) => true,
        Err(SessionError::Stale) => {
            log::debug!("Dropping event from an abandoned request");
            false
        }
        Err(e) => {
            log::warn!("Ignoring event: {e}");
            false
        }
    }
}

fn set_capture(state: &Rc<RefCell<AppState>>, status: CaptureStatus) {
    state.borrow_mut().capture = status;
    refresh(state);
}

/// Only a submission started from the wizard gets an outcome.
fn set_kyc_outcome(s: &mut AppState, outcome: Option<KycOutcome>) {
    if let Some(ref mut kyc) = s.kyc {
        if kyc.awaiting_outcome {
            kyc.awaiting_outcome = false;
            kyc.outcome = outcome;
        }
    }
}
