use gtk4::prelude::*;
use libadwaita::prelude::*;

use super::dashboard::render_capture;
use crate::app::CaptureStatus;
use crate::kyc::{KycOutcome, KycStep, KycWizard};
use crate::session::UploadSession;

/// Handles returned from building the KYC wizard window.
pub struct KycWidgets {
    pub window: libadwaita::Window,
    pub heading: gtk4::Label,
    pub step_title: gtk4::Label,
    pub step_description: gtk4::Label,
    pub stack: gtk4::Stack,
    pub first_name_row: libadwaita::EntryRow,
    pub last_name_row: libadwaita::EntryRow,
    pub email_row: libadwaita::EntryRow,
    pub video: gtk4::Video,
    pub record_button: gtk4::Button,
    pub countdown_label: gtk4::Label,
    pub video_status: gtk4::Label,
    pub summary_name: libadwaita::ActionRow,
    pub summary_email: libadwaita::ActionRow,
    pub summary_video: libadwaita::ActionRow,
    pub outcome_title: gtk4::Label,
    pub outcome_message: gtk4::Label,
    pub previous_button: gtk4::Button,
    pub next_button: gtk4::Button,
    pub submit_button: gtk4::Button,
}

pub fn build_kyc_window(parent: Option<&libadwaita::ApplicationWindow>) -> KycWidgets {
    let window = libadwaita::Window::builder()
        .title("KYC Verification")
        .default_width(520)
        .default_height(640)
        .build();
    if let Some(parent) = parent {
        window.set_transient_for(Some(parent));
    }

    let toolbar_view = libadwaita::ToolbarView::new();
    toolbar_view.add_top_bar(&libadwaita::HeaderBar::new());

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
    content.set_margin_start(16);
    content.set_margin_end(16);
    content.set_margin_top(12);
    content.set_margin_bottom(12);

    let heading = gtk4::Label::new(None);
    heading.add_css_class("title-2");
    content.append(&heading);

    let step_title = gtk4::Label::new(None);
    step_title.add_css_class("heading");
    step_title.set_xalign(0.0);
    step_title.set_margin_top(8);
    content.append(&step_title);

    let step_description = gtk4::Label::new(None);
    step_description.add_css_class("dim-label");
    step_description.set_xalign(0.0);
    step_description.set_wrap(true);
    content.append(&step_description);

    let stack = gtk4::Stack::new();
    stack.set_transition_type(gtk4::StackTransitionType::SlideLeftRight);
    stack.set_vexpand(true);
    stack.set_margin_top(8);

    // --- Personal details ---
    let details = libadwaita::PreferencesGroup::new();
    let first_name_row = libadwaita::EntryRow::builder().title("First Name").build();
    let last_name_row = libadwaita::EntryRow::builder().title("Last Name").build();
    let email_row = libadwaita::EntryRow::builder().title("Email").build();
    email_row.set_input_purpose(gtk4::InputPurpose::Email);
    details.add(&first_name_row);
    details.add(&last_name_row);
    details.add(&email_row);
    stack.add_named(&details, Some(KycStep::PersonalDetails.page_name()));

    // --- Video ---
    let video_page = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
    let video = gtk4::Video::new();
    video.set_autoplay(false);
    video.set_size_request(-1, 260);
    video_page.append(&video);

    let record_button = gtk4::Button::with_label("Record Video");
    record_button.set_halign(gtk4::Align::Center);
    video_page.append(&record_button);

    let countdown_label = gtk4::Label::new(None);
    countdown_label.add_css_class("title-4");
    countdown_label.set_visible(false);
    video_page.append(&countdown_label);

    let video_status = gtk4::Label::new(None);
    video_status.add_css_class("dim-label");
    video_page.append(&video_status);
    stack.add_named(&video_page, Some(KycStep::VideoVerification.page_name()));

    // --- Confirmation ---
    let confirm_page = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    let summary = libadwaita::PreferencesGroup::new();
    summary.set_title("Summary");
    let summary_name = libadwaita::ActionRow::builder().title("Name").build();
    let summary_email = libadwaita::ActionRow::builder().title("Email").build();
    let summary_video = libadwaita::ActionRow::builder().title("Video").build();
    summary.add(&summary_name);
    summary.add(&summary_email);
    summary.add(&summary_video);
    confirm_page.append(&summary);

    let outcome_title = gtk4::Label::new(None);
    outcome_title.add_css_class("title-3");
    outcome_title.set_visible(false);
    confirm_page.append(&outcome_title);

    let outcome_message = gtk4::Label::new(None);
    outcome_message.set_wrap(true);
    outcome_message.set_justify(gtk4::Justification::Center);
    outcome_message.set_visible(false);
    confirm_page.append(&outcome_message);
    stack.add_named(&confirm_page, Some(KycStep::Confirmation.page_name()));

    content.append(&stack);

    // --- Navigation ---
    let nav = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    let previous_button = gtk4::Button::with_label("Previous");
    let spacer = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    spacer.set_hexpand(true);
    let next_button = gtk4::Button::with_label("Next");
    next_button.add_css_class("suggested-action");
    let submit_button = gtk4::Button::with_label("Submit");
    submit_button.add_css_class("suggested-action");
    nav.append(&previous_button);
    nav.append(&spacer);
    nav.append(&next_button);
    nav.append(&submit_button);
    content.append(&nav);

    toolbar_view.set_content(Some(&content));
    window.set_content(Some(&toolbar_view));

    KycWidgets {
        window,
        heading,
        step_title,
        step_description,
        stack,
        first_name_row,
        last_name_row,
        email_row,
        video,
        record_button,
        countdown_label,
        video_status,
        summary_name,
        summary_email,
        summary_video,
        outcome_title,
        outcome_message,
        previous_button,
        next_button,
        submit_button,
    }
}

/// Never touches entry text, so it is safe to call from `changed` handlers.
pub fn render(
    widgets: &KycWidgets,
    wizard: &KycWizard,
    session: &UploadSession,
    capture: CaptureStatus,
    outcome: Option<&KycOutcome>,
) {
    let step = wizard.step();
    let has_video = session.media().is_some();
    let submitting = session.phase().is_in_flight();

    widgets.heading.set_text(&wizard.heading());
    widgets.step_title.set_text(step.title());
    widgets.step_description.set_text(step.description());
    widgets.stack.set_visible_child_name(step.page_name());

    let recorded = session.media().is_some_and(|m| m.is_recording());
    render_capture(&widgets.record_button, &widgets.countdown_label, capture, recorded);
    widgets.video_status.set_text(
        session
            .media()
            .map(|m| m.name())
            .unwrap_or("No video recorded yet"),
    );

    widgets.summary_name.set_subtitle(&wizard.details.full_name());
    widgets.summary_email.set_subtitle(wizard.details.email.trim());
    widgets
        .summary_video
        .set_subtitle(session.media().map(|m| m.name()).unwrap_or("None"));

    let on_confirmation = step == KycStep::Confirmation;
    widgets
        .previous_button
        .set_sensitive(wizard.can_go_back(submitting) && !capture.is_active());
    widgets.next_button.set_visible(!on_confirmation);
    widgets
        .next_button
        .set_sensitive(wizard.can_advance(has_video) && !capture.is_active());
    widgets.submit_button.set_visible(on_confirmation);
    widgets
        .submit_button
        .set_sensitive(wizard.can_submit(has_video, submitting) && session.can_upload());
    widgets
        .submit_button
        .set_label(if submitting { "Submitting\u{2026}" } else { "Submit" });

    widgets.outcome_title.remove_css_class("error");
    widgets.outcome_title.remove_css_class("success");
    match outcome {
        Some(outcome) => {
            widgets.outcome_title.set_text(outcome.title());
            widgets.outcome_title.add_css_class(match outcome {
                KycOutcome::Passed { .. } => "success",
                _ => "error",
            });
            widgets.outcome_message.set_text(&outcome.message());
            widgets.outcome_title.set_visible(true);
            widgets.outcome_message.set_visible(true);
        }
        None => {
            widgets.outcome_title.set_visible(false);
            widgets.outcome_message.set_visible(false);
        }
    }
}
