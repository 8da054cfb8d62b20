use std::cell::RefCell;
use std::rc::Rc;

use super::state::{refresh, show_notice, AppState, BackendEvent};
use crate::analysis::{AnalysisClient, UploadEvent};
use crate::export::{ExportFormat, ReportDocument};
use crate::report::ReportClient;

/// Upload the selected video and wait for the verdict on the tokio runtime.
pub fn dispatch_analysis(state: &Rc<RefCell<AppState>>) {
    let mut s = state.borrow_mut();
    let (ticket, source) = match s.session.begin_upload() {
        Ok(started) => started,
        Err(e) => {
            drop(s);
            log::warn!("Cannot upload: {e}");
            show_notice(state, &e.to_string());
            return;
        }
    };
    let endpoint = s.config.analysis_endpoint.clone();
    let timeout = s.config.request_timeout();
    let sender = s.backend_sender.clone();

    s.tokio_rt.spawn(async move {
        let client = match AnalysisClient::new(endpoint, timeout) {
            Ok(client) => client,
            Err(e) => {
                let _ = sender.send(BackendEvent::AnalysisFailed(ticket, e.to_string())).await;
                return;
            }
        };

        let progress_sender = sender.clone();
        let outcome = client
            .analyze(&source, move |event| {
                let event = match event {
                    UploadEvent::Progress(percent) => BackendEvent::UploadProgress(ticket, percent),
                    UploadEvent::Acknowledged => BackendEvent::UploadAcknowledged(ticket),
                };
                let _ = progress_sender.try_send(event);
            })
            .await;

        let event = match outcome {
            Ok(result) => BackendEvent::AnalysisComplete(ticket, result),
            Err(e) => BackendEvent::AnalysisFailed(ticket, e.to_string()),
        };
        let _ = sender.send(event).await;
    });
    drop(s);

    refresh(state);
}

/// Ask the report endpoint for a narrative of the completed result.
pub fn dispatch_report(state: &Rc<RefCell<AppState>>) {
    let mut s = state.borrow_mut();
    let (ticket, result) = match s.session.request_report() {
        Ok(requested) => requested,
        Err(e) => {
            drop(s);
            log::warn!("Cannot request report: {e}");
            return;
        }
    };
    let endpoint = s.config.report_endpoint.clone();
    let timeout = s.config.request_timeout();
    let sender = s.backend_sender.clone();
    log::info!("Requesting report from {endpoint}");

    s.tokio_rt.spawn(async move {
        let outcome = match ReportClient::new(endpoint, timeout) {
            Ok(client) => client.generate(&result).await,
            Err(e) => Err(e),
        };
        let event = match outcome {
            Ok(text) => BackendEvent::ReportReady(ticket, text),
            Err(e) => BackendEvent::ReportFailed(ticket, e.to_string()),
        };
        let _ = sender.send(event).await;
    });
    drop(s);

    refresh(state);
}

/// Write the current report into the export directory.
pub fn save_report(state: &Rc<RefCell<AppState>>, format: ExportFormat) {
    let saved = {
        let s = state.borrow();
        ReportDocument::from_session(&s.session, chrono::Local::now().date_naive())
            .and_then(|doc| doc.save(format, &s.config.export_dir()))
    };
    match saved {
        Ok(path) => show_notice(state, &format!("Saved {}", path.display())),
        Err(e) => {
            log::warn!("Export failed: {e}");
            show_notice(state, &e.to_string());
        }
    }
}
