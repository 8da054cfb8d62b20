use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use gtk4::prelude::*;

use super::state::{refresh, show_notice, stop_pulse, AppState};
use crate::session::MediaSelection;

/// Validate a user-picked file and make it the session's media.
/// Rejected files leave the session untouched.
pub fn select_file(state: &Rc<RefCell<AppState>>, path: &Path) {
    if state.borrow().capture.is_active() {
        log::info!("Ignoring selection while the camera is recording");
        return;
    }

    let max_bytes = state.borrow().config.max_upload_bytes();
    match MediaSelection::from_path(path, max_bytes) {
        Ok(media) => adopt_media(state, media),
        Err(e) => {
            log::warn!("Rejected selection: {e}");
            show_notice(state, &e.to_string());
        }
    }
}

/// Replace the session's media, reset results, and start its preview.
pub(super) fn adopt_media(state: &Rc<RefCell<AppState>>, media: MediaSelection) {
    let path = media.path().to_path_buf();
    stop_pulse(state);
    state.borrow_mut().session.select(media);
    clear_results(state);

    let videos = state.borrow().preview_targets();
    let handle = crate::ui::player::show_preview(&videos, &path);
    state.borrow_mut().session.attach_preview(handle);

    refresh(state);
}

/// Drop the current media, e.g. before recording again.
pub(super) fn discard_media(state: &Rc<RefCell<AppState>>) {
    stop_pulse(state);
    state.borrow_mut().session.clear_media();
    clear_results(state);
    refresh(state);
}

/// Widgets that are filled once per result rather than on every refresh.
fn clear_results(state: &Rc<RefCell<AppState>>) {
    let mut s = state.borrow_mut();
    if let Some(ref dash) = s.dashboard {
        crate::ui::frames::clear(&dash.frames_box);
        dash.report_view.buffer().set_text("");
    }
    if let Some(ref mut kyc) = s.kyc {
        kyc.awaiting_outcome = false;
        kyc.outcome = None;
    }
}
