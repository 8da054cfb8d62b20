use gtk4::prelude::*;
use libadwaita::prelude::*;

use crate::app::CaptureStatus;
use crate::session::{Phase, ReportState, UploadSession};

const STYLE: &str = r#"
.drop-zone {
    border: 2px dashed alpha(@window_fg_color, 0.25);
    border-radius: 12px;
    padding: 24px;
}
.drop-zone.drop-hover {
    border-color: @accent_color;
    background-color: alpha(@accent_bg_color, 0.08);
}
.verdict {
    font-size: 16px;
    font-weight: 500;
    padding: 12px;
    border-radius: 8px;
}
.verdict.fake {
    background-color: alpha(@error_bg_color, 0.15);
    color: @error_color;
}
.verdict.genuine {
    background-color: alpha(@success_bg_color, 0.15);
    color: @success_color;
}
.percentage {
    font-size: 28px;
    font-weight: bold;
}
"#;

/// Handles returned from building the dashboard window.
pub struct DashboardWidgets {
    pub window: libadwaita::ApplicationWindow,
    pub toast_overlay: libadwaita::ToastOverlay,
    pub drop_zone: gtk4::Box,
    pub choose_button: gtk4::Button,
    pub record_button: gtk4::Button,
    pub file_label: gtk4::Label,
    pub countdown_label: gtk4::Label,
    pub video: gtk4::Video,
    pub upload_button: gtk4::Button,
    pub status_label: gtk4::Label,
    pub progress_bar: gtk4::ProgressBar,
    pub results_group: libadwaita::PreferencesGroup,
    pub verdict_label: gtk4::Label,
    pub percentage_label: gtk4::Label,
    pub percentage_bar: gtk4::LevelBar,
    pub frames_box: gtk4::FlowBox,
    pub report_group: libadwaita::PreferencesGroup,
    pub report_button: gtk4::Button,
    pub report_status: gtk4::Label,
    pub report_view: gtk4::TextView,
    pub save_text_button: gtk4::Button,
    pub save_html_button: gtk4::Button,
    pub api_key_row: libadwaita::PasswordEntryRow,
}

/// Build the main dashboard window.
pub fn build_dashboard(app: &libadwaita::Application, initial_api_key: &str) -> DashboardWidgets {
    load_style();

    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("Deepfake Inspector")
        .default_width(720)
        .default_height(820)
        .build();

    let toolbar_view = libadwaita::ToolbarView::new();
    let header = libadwaita::HeaderBar::new();

    let menu_button = gtk4::MenuButton::new();
    menu_button.set_icon_name("open-menu-symbolic");

    let menu = gtk4::gio::Menu::new();
    menu.append(Some("KYC Verification"), Some("app.kyc"));
    menu.append(Some("Quit"), Some("app.quit"));

    menu_button.set_menu_model(Some(&menu));
    header.pack_end(&menu_button);

    toolbar_view.add_top_bar(&header);

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    content.set_margin_start(16);
    content.set_margin_end(16);
    content.set_margin_top(12);
    content.set_margin_bottom(12);

    // --- Video group ---
    let video_group = libadwaita::PreferencesGroup::new();
    video_group.set_title("Video");
    video_group.set_description(Some("Upload a video or record one to check it for deepfakes."));

    let drop_zone = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
    drop_zone.add_css_class("drop-zone");

    let drop_hint = gtk4::Label::new(Some("Drag and drop a video here"));
    drop_hint.add_css_class("dim-label");
    drop_zone.append(&drop_hint);

    let buttons = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    buttons.set_halign(gtk4::Align::Center);
    let choose_button = gtk4::Button::with_label("Choose Video");
    let record_button = gtk4::Button::with_label("Record Video");
    buttons.append(&choose_button);
    buttons.append(&record_button);
    drop_zone.append(&buttons);

    let file_label = gtk4::Label::new(Some("No video selected"));
    file_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
    drop_zone.append(&file_label);

    let countdown_label = gtk4::Label::new(None);
    countdown_label.add_css_class("title-4");
    countdown_label.set_visible(false);
    drop_zone.append(&countdown_label);

    video_group.add(&drop_zone);

    let video = gtk4::Video::new();
    video.set_autoplay(false);
    video.set_size_request(-1, 260);
    video.set_margin_top(12);
    video_group.add(&video);

    let upload_button = gtk4::Button::builder()
        .label("Upload and Analyze")
        .halign(gtk4::Align::Center)
        .margin_top(12)
        .sensitive(false)
        .build();
    upload_button.add_css_class("suggested-action");
    upload_button.add_css_class("pill");
    video_group.add(&upload_button);

    content.append(&video_group);

    // --- Progress ---
    let progress_bar = gtk4::ProgressBar::new();
    progress_bar.set_show_text(true);
    progress_bar.set_visible(false);
    content.append(&progress_bar);

    let status_label = gtk4::Label::new(None);
    status_label.set_wrap(true);
    status_label.set_visible(false);
    content.append(&status_label);

    // --- Results group ---
    let results_group = libadwaita::PreferencesGroup::new();
    results_group.set_title("Analysis Results");
    results_group.set_visible(false);

    let verdict_label = gtk4::Label::new(None);
    verdict_label.add_css_class("verdict");
    verdict_label.set_xalign(0.0);
    results_group.add(&verdict_label);

    let percentage_label = gtk4::Label::new(None);
    percentage_label.add_css_class("percentage");
    percentage_label.set_margin_top(8);
    results_group.add(&percentage_label);

    let percentage_caption = gtk4::Label::new(Some("Fake Percentage"));
    percentage_caption.add_css_class("dim-label");
    results_group.add(&percentage_caption);

    let percentage_bar = gtk4::LevelBar::for_interval(0.0, 1.0);
    percentage_bar.set_margin_top(6);
    percentage_bar.set_margin_bottom(12);
    results_group.add(&percentage_bar);

    let frames_title = gtk4::Label::new(Some("Top Analyzed Frames"));
    frames_title.add_css_class("heading");
    frames_title.set_xalign(0.0);
    results_group.add(&frames_title);

    let frames_box = gtk4::FlowBox::new();
    frames_box.set_selection_mode(gtk4::SelectionMode::None);
    frames_box.set_max_children_per_line(2);
    frames_box.set_column_spacing(12);
    frames_box.set_row_spacing(12);
    results_group.add(&frames_box);

    content.append(&results_group);

    // --- Report group ---
    let report_group = libadwaita::PreferencesGroup::new();
    report_group.set_title("Detailed Report");
    report_group.set_visible(false);

    let report_button = gtk4::Button::with_label("Generate Report");
    report_button.set_halign(gtk4::Align::Start);
    report_group.add(&report_button);

    let report_status = gtk4::Label::new(None);
    report_status.set_wrap(true);
    report_status.set_xalign(0.0);
    report_status.set_visible(false);
    report_group.add(&report_status);

    let report_view = gtk4::TextView::builder()
        .editable(false)
        .wrap_mode(gtk4::WrapMode::Word)
        .top_margin(8)
        .bottom_margin(8)
        .left_margin(8)
        .right_margin(8)
        .build();
    let report_scroll = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .min_content_height(220)
        .child(&report_view)
        .margin_top(8)
        .build();
    report_scroll.add_css_class("card");
    report_group.add(&report_scroll);

    let save_box = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    save_box.set_margin_top(8);
    let save_text_button = gtk4::Button::with_label("Save as Text");
    let save_html_button = gtk4::Button::with_label("Save as HTML");
    save_box.append(&save_text_button);
    save_box.append(&save_html_button);
    report_group.add(&save_box);

    content.append(&report_group);

    // --- API Key group ---
    let api_group = libadwaita::PreferencesGroup::new();
    api_group.set_title("Report Generation");
    api_group.set_description(Some("OpenAI API key used by the local report relay."));

    let api_key_row = libadwaita::PasswordEntryRow::builder()
        .title("API Key")
        .text(initial_api_key)
        .show_apply_button(true)
        .build();
    api_group.add(&api_key_row);

    content.append(&api_group);

    // Assemble
    let scrolled = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .child(&content)
        .build();
    toolbar_view.set_content(Some(&scrolled));

    let toast_overlay = libadwaita::ToastOverlay::new();
    toast_overlay.set_child(Some(&toolbar_view));
    window.set_content(Some(&toast_overlay));

    DashboardWidgets {
        window,
        toast_overlay,
        drop_zone,
        choose_button,
        record_button,
        file_label,
        countdown_label,
        video,
        upload_button,
        status_label,
        progress_bar,
        results_group,
        verdict_label,
        percentage_label,
        percentage_bar,
        frames_box,
        report_group,
        report_button,
        report_status,
        report_view,
        save_text_button,
        save_html_button,
        api_key_row,
    }
}

fn load_style() {
    let Some(display) = gtk4::gdk::Display::default() else {
        log::warn!("No display, skipping custom styles");
        return;
    };
    let css_provider = gtk4::CssProvider::new();
    css_provider.load_from_string(STYLE);
    gtk4::style_context_add_provider_for_display(
        &display,
        &css_provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}

/// Bring every widget in line with the session.
pub fn render(dash: &DashboardWidgets, session: &UploadSession, capture: CaptureStatus) {
    match session.media() {
        Some(media) => dash.file_label.set_text(&format!(
            "{} ({:.1} MB)",
            media.name(),
            media.size() as f64 / 1_048_576.0
        )),
        None => dash.file_label.set_text("No video selected"),
    }

    let recorded = session.media().is_some_and(|m| m.is_recording());
    render_capture(&dash.record_button, &dash.countdown_label, capture, recorded);
    dash.choose_button.set_sensitive(!capture.is_active());
    dash.upload_button
        .set_sensitive(session.can_upload() && !capture.is_active());

    dash.status_label.remove_css_class("error");
    match session.phase() {
        Phase::Idle => {
            dash.progress_bar.set_visible(false);
            dash.status_label.set_visible(false);
        }
        Phase::Uploading { progress } => {
            dash.progress_bar.set_visible(true);
            dash.progress_bar.set_fraction(crate::analysis::percent_to_fraction(*progress));
            dash.progress_bar
                .set_text(Some(&format!("Uploading\u{2026} {progress:.0}%")));
            dash.status_label.set_visible(false);
        }
        Phase::Analyzing => {
            dash.progress_bar.set_visible(true);
            dash.progress_bar.set_text(Some("Analyzing video\u{2026}"));
            dash.status_label.set_visible(false);
        }
        Phase::Complete { .. } => {
            dash.progress_bar.set_visible(false);
            dash.status_label.set_visible(false);
        }
        Phase::Error { message } => {
            dash.progress_bar.set_visible(false);
            dash.status_label.set_text(&format!("Error: {message}"));
            dash.status_label.add_css_class("error");
            dash.status_label.set_visible(true);
        }
    }

    match session.result() {
        Some(result) => {
            dash.results_group.set_visible(true);
            dash.verdict_label.set_text(result.verdict_text());
            dash.verdict_label.remove_css_class("fake");
            dash.verdict_label.remove_css_class("genuine");
            dash.verdict_label.add_css_class(if result.is_likely_deepfake {
                "fake"
            } else {
                "genuine"
            });
            dash.percentage_label.set_text(&result.percentage_text());
            dash.percentage_bar.set_value(result.percentage_fraction());
        }
        None => dash.results_group.set_visible(false),
    }

    render_report(dash, session.report());
}

/// Shared by the dashboard and the wizard's video page.
pub fn render_capture(
    button: &gtk4::Button,
    countdown: &gtk4::Label,
    capture: CaptureStatus,
    has_recording: bool,
) {
    match capture {
        CaptureStatus::Idle => {
            button.set_label(if has_recording { "Record Again" } else { "Record Video" });
            button.set_sensitive(true);
            button.remove_css_class("destructive-action");
            countdown.set_visible(false);
        }
        CaptureStatus::Opening => {
            button.set_label("Opening Camera\u{2026}");
            button.set_sensitive(false);
            countdown.set_visible(false);
        }
        CaptureStatus::Recording { remaining } => {
            button.set_label("Stop Recording");
            button.set_sensitive(true);
            button.add_css_class("destructive-action");
            countdown.set_text(&format!("Recording\u{2026} {remaining}s"));
            countdown.set_visible(true);
        }
    }
}

fn render_report(dash: &DashboardWidgets, report: Option<&ReportState>) {
    let Some(report) = report else {
        dash.report_group.set_visible(false);
        return;
    };
    dash.report_group.set_visible(true);

    let ready = matches!(report, ReportState::Ready(_));
    dash.save_text_button.set_sensitive(ready);
    dash.save_html_button.set_sensitive(ready);

    match report {
        ReportState::NotRequested => {
            dash.report_button.set_label("Generate Report");
            dash.report_button.set_sensitive(true);
            dash.report_status.set_visible(false);
        }
        ReportState::Pending => {
            dash.report_button.set_label("Generating Report\u{2026}");
            dash.report_button.set_sensitive(false);
            dash.report_status.set_visible(false);
        }
        ReportState::Ready(_) => {
            dash.report_button.set_label("Generate Report");
            dash.report_button.set_sensitive(false);
            dash.report_status.set_visible(false);
        }
        ReportState::Failed(message) => {
            dash.report_button.set_label("Try Again");
            dash.report_button.set_sensitive(true);
            dash.report_status
                .set_text(&format!("Failed to generate report: {message}"));
            dash.report_status.add_css_class("error");
            dash.report_status.set_visible(true);
        }
    }
}
