use std::cell::RefCell;
use std::rc::Rc;

use gtk4::glib;

use crate::analysis::AnalysisResult;
use crate::capture::RecordedClip;
use crate::config::Config;
use crate::kyc::{KycOutcome, KycWizard};
use crate::session::{ReportTicket, RequestTicket, UploadSession};
use crate::ui::dashboard::DashboardWidgets;
use crate::ui::kyc::KycWidgets;

/// Events sent from the tokio runtime to the GTK main thread.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    UploadProgress(RequestTicket, f64),
    UploadAcknowledged(RequestTicket),
    AnalysisComplete(RequestTicket, AnalysisResult),
    AnalysisFailed(RequestTicket, String),
    ReportReady(ReportTicket, String),
    ReportFailed(ReportTicket, String),
    CaptureStarted(u32),
    CaptureTick(u32),
    CaptureComplete(RecordedClip),
    CaptureFailed(String),
}

/// Camera state as the UI sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    Opening,
    Recording { remaining: u32 },
}

impl CaptureStatus {
    pub fn is_active(self) -> bool {
        self != CaptureStatus::Idle
    }
}

/// The KYC wizard window and its progress.
pub struct KycState {
    pub wizard: KycWizard,
    pub widgets: KycWidgets,
    /// Set while a submission started from the wizard is in flight.
    pub awaiting_outcome: bool,
    pub outcome: Option<KycOutcome>,
}

/// In-process report relay task.
pub struct RelayHandle {
    pub shutdown: tokio::sync::oneshot::Sender<()>,
    pub task: tokio::task::JoinHandle<()>,
}

/// Central application state. Lives on the GTK main thread inside Rc<RefCell<>>.
pub struct AppState {
    pub config: Config,
    pub session: UploadSession,
    pub tokio_rt: tokio::runtime::Runtime,
    pub backend_sender: async_channel::Sender<BackendEvent>,

    // Camera
    pub capture: CaptureStatus,
    pub capture_stop: Option<async_channel::Sender<()>>,

    pub pulse_source: Option<glib::SourceId>,
    pub relay: Option<RelayHandle>,

    // UI handles
    pub dashboard: Option<DashboardWidgets>,
    pub kyc: Option<KycState>,
}

impl AppState {
    pub fn new(sender: async_channel::Sender<BackendEvent>) -> std::io::Result<Self> {
        let config = Config::load();
        let tokio_rt = tokio::runtime::Runtime::new()?;

        Ok(Self {
            config,
            session: UploadSession::new(),
            tokio_rt,
            backend_sender: sender,
            capture: CaptureStatus::Idle,
            capture_stop: None,
            pulse_source: None,
            relay: None,
            dashboard: None,
            kyc: None,
        })
    }

    /// Every video widget that should show the current selection.
    pub fn preview_targets(&self) -> Vec<gtk4::Video> {
        let mut videos = Vec::new();
        if let Some(ref dash) = self.dashboard {
            videos.push(dash.video.clone());
        }
        if let Some(ref kyc) = self.kyc {
            videos.push(kyc.widgets.video.clone());
        }
        videos
    }
}

/// Redraw every open window from the session.
pub fn refresh(state: &Rc<RefCell<AppState>>) {
    let s = state.borrow();
    if let Some(ref dash) = s.dashboard {
        crate::ui::dashboard::render(dash, &s.session, s.capture);
    }
    if let Some(ref kyc) = s.kyc {
        crate::ui::kyc::render(
            &kyc.widgets,
            &kyc.wizard,
            &s.session,
            s.capture,
            kyc.outcome.as_ref(),
        );
    }
}

/// Show a transient message on the dashboard.
pub fn show_notice(state: &Rc<RefCell<AppState>>, text: &str) {
    if let Some(ref dash) = state.borrow().dashboard {
        dash.toast_overlay.add_toast(libadwaita::Toast::new(text));
    }
}

/// Pulse the progress bar while the service analyzes the upload.
pub fn start_pulse(state: &Rc<RefCell<AppState>>) {
    stop_pulse(state);
    let mut s = state.borrow_mut();
    let Some(bar) = s.dashboard.as_ref().map(|d| d.progress_bar.clone()) else {
        return;
    };
    let source = glib::timeout_add_local(std::time::Duration::from_millis(120), move || {
        bar.pulse();
        glib::ControlFlow::Continue
    });
    s.pulse_source = Some(source);
}

pub fn stop_pulse(state: &Rc<RefCell<AppState>>) {
    if let Some(source) = state.borrow_mut().pulse_source.take() {
        source.remove();
    }
}
