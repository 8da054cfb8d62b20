use std::cell::RefCell;
use std::rc::Rc;

use gtk4::glib;
use gtk4::prelude::*;
use libadwaita::prelude::*;

use super::pipeline::dispatch_analysis;
use super::recording::toggle_recording;
use super::state::{refresh, AppState, KycState};
use crate::kyc::{KycWizard, PersonalDetails};

/// Open the verification wizard, or raise it if it is already open.
pub fn open_kyc(state: &Rc<RefCell<AppState>>) {
    if let Some(ref kyc) = state.borrow().kyc {
        kyc.widgets.window.present();
        return;
    }

    let parent = state.borrow().dashboard.as_ref().map(|d| d.window.clone());
    let widgets = crate::ui::kyc::build_kyc_window(parent.as_ref());

    connect_detail(state, &widgets.first_name_row, |d, text| d.first_name = text);
    connect_detail(state, &widgets.last_name_row, |d, text| d.last_name = text);
    connect_detail(state, &widgets.email_row, |d, text| d.email = text);

    {
        let state = state.clone();
        widgets.next_button.connect_clicked(move |_| {
            {
                let mut s = state.borrow_mut();
                let has_video = s.session.media().is_some();
                if let Some(ref mut kyc) = s.kyc {
                    kyc.wizard.advance(has_video);
                }
            }
            refresh(&state);
        });
    }

    {
        let state = state.clone();
        widgets.previous_button.connect_clicked(move |_| {
            {
                let mut s = state.borrow_mut();
                let submitting = s.session.phase().is_in_flight();
                if let Some(ref mut kyc) = s.kyc {
                    kyc.wizard.go_back(submitting);
                }
            }
            refresh(&state);
        });
    }

    {
        let state = state.clone();
        widgets.record_button.connect_clicked(move |_| toggle_recording(&state));
    }

    {
        let state = state.clone();
        widgets.submit_button.connect_clicked(move |_| submit(&state));
    }

    {
        let state = state.clone();
        widgets.window.connect_close_request(move |_| {
            state.borrow_mut().kyc = None;
            refresh(&state);
            glib::Propagation::Proceed
        });
    }

    let window = widgets.window.clone();
    state.borrow_mut().kyc = Some(KycState {
        wizard: KycWizard::default(),
        widgets,
        awaiting_outcome: false,
        outcome: None,
    });

    show_current_media(state);
    refresh(state);
    window.present();
}

fn connect_detail<F>(state: &Rc<RefCell<AppState>>, row: &libadwaita::EntryRow, set: F)
where
    F: Fn(&mut PersonalDetails, String) + 'static,
{
    let state = state.clone();
    row.connect_changed(move |row| {
        let text = row.text().to_string();
        if let Some(ref mut kyc) = state.borrow_mut().kyc {
            set(&mut kyc.wizard.details, text);
        }
        refresh(&state);
    });
}

/// Submit the current selection for analysis; the outcome lands on the
/// confirmation page.
fn submit(state: &Rc<RefCell<AppState>>) {
    {
        let mut s = state.borrow_mut();
        let has_video = s.session.media().is_some();
        let submitting = s.session.phase().is_in_flight();
        let can_upload = s.session.can_upload();
        let Some(ref mut kyc) = s.kyc else {
            return;
        };
        if !kyc.wizard.can_submit(has_video, submitting) || !can_upload {
            return;
        }
        log::info!("Submitting KYC for {}", kyc.wizard.details.full_name());
        kyc.awaiting_outcome = true;
        kyc.outcome = None;
    }
    dispatch_analysis(state);
}

/// Point the new window's player at the selection that already exists.
fn show_current_media(state: &Rc<RefCell<AppState>>) {
    let Some(path) = state
        .borrow()
        .session
        .media()
        .map(|m| m.path().to_path_buf())
    else {
        return;
    };
    let videos = state.borrow().preview_targets();
    let handle = crate::ui::player::show_preview(&videos, &path);
    state.borrow_mut().session.attach_preview(handle);
}
