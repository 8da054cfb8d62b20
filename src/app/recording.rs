use std::cell::RefCell;
use std::rc::Rc;

use super::selection::discard_media;
use super::state::{refresh, AppState, BackendEvent, CaptureStatus};
use crate::capture::open_camera;

/// Start recording when idle, stop early while recording.
pub fn toggle_recording(state: &Rc<RefCell<AppState>>) {
    let capture = state.borrow().capture;
    match capture {
        CaptureStatus::Idle => start_recording(state),
        CaptureStatus::Recording { .. } => stop_recording(state),
        CaptureStatus::Opening => log::info!("Ignoring toggle while the camera opens"),
    }
}

/// Open the camera on the runtime and record one window. Any current
/// selection is discarded first ("record again").
fn start_recording(state: &Rc<RefCell<AppState>>) {
    log::info!("Starting recording");
    discard_media(state);

    let (stop_tx, stop_rx) = async_channel::bounded::<()>(1);
    let mut s = state.borrow_mut();
    s.capture = CaptureStatus::Opening;
    s.capture_stop = Some(stop_tx);

    let camera = s.config.camera.clone();
    let sender = s.backend_sender.clone();
    s.tokio_rt.spawn(async move {
        let session = match open_camera(&camera) {
            Ok(session) => session,
            Err(e) => {
                let _ = sender.send(BackendEvent::CaptureFailed(e.to_string())).await;
                return;
            }
        };

        let window = camera.window_secs.max(1);
        let tick_sender = sender.clone();
        let result = session
            .record(stop_rx, move |remaining| {
                let event = if remaining == window {
                    BackendEvent::CaptureStarted(remaining)
                } else {
                    BackendEvent::CaptureTick(remaining)
                };
                let _ = tick_sender.try_send(event);
            })
            .await;

        let event = match result {
            Ok(clip) => BackendEvent::CaptureComplete(clip),
            Err(e) => BackendEvent::CaptureFailed(e.to_string()),
        };
        let _ = sender.send(event).await;
    });
    drop(s);

    refresh(state);
}

fn stop_recording(state: &Rc<RefCell<AppState>>) {
    log::info!("Stopping recording");
    if let Some(ref stop) = state.borrow().capture_stop {
        let _ = stop.try_send(());
    }
}

/// Stop any live recording so the camera is released before exit.
pub fn shutdown_capture(state: &Rc<RefCell<AppState>>) {
    let mut s = state.borrow_mut();
    if let Some(stop) = s.capture_stop.take() {
        let _ = stop.try_send(());
    }
    s.capture = CaptureStatus::Idle;
}
