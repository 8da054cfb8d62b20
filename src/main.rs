mod analysis;
mod app;
mod capture;
mod cli;
mod config;
mod error;
mod export;
mod kyc;
mod report;
mod session;
mod ui;

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{gdk, gio, glib};
use libadwaita::prelude::*;

use app::{AppState, BackendEvent};
use cli::Command;
use config::Config;
use export::ExportFormat;

fn main() -> ExitCode {
    env_logger::init();

    let command = match cli::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Gui => run_gui(),
        Command::Help => {
            println!("{}", cli::USAGE);
            ExitCode::SUCCESS
        }
        Command::Analyze(args) => run_headless(|config| async move { cli::analyze(&config, &args).await }),
        Command::ServeReport { bind } => {
            run_headless(|config| async move { cli::serve_report(&config, bind.as_deref()).await })
        }
    }
}

fn run_headless<F, Fut>(command: F) -> ExitCode
where
    F: FnOnce(Config) -> Fut,
    Fut: std::future::Future<Output = Result<(), error::CliError>>,
{
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(command(Config::load())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_gui() -> ExitCode {
    log::info!("Deepfake Inspector starting");

    let application = libadwaita::Application::builder()
        .application_id("io.github.deepfake-inspector")
        .build();

    application.connect_activate(on_activate);
    if application.run() == glib::ExitCode::SUCCESS {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn on_activate(app: &libadwaita::Application) {
    if let Some(window) = app.active_window() {
        window.present();
        return;
    }

    // Create async channel for backend → UI communication
    let (backend_tx, backend_rx) = async_channel::unbounded::<BackendEvent>();

    let state = match AppState::new(backend_tx) {
        Ok(state) => Rc::new(RefCell::new(state)),
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            app.quit();
            return;
        }
    };

    let dashboard = ui::dashboard::build_dashboard(app, &state.borrow().config.llm.api_key);

    // File chooser
    {
        let state_clone = state.clone();
        let dash_window = dashboard.window.clone();
        dashboard.choose_button.connect_clicked(move |_| {
            let filter = gtk4::FileFilter::new();
            filter.set_name(Some("Videos"));
            filter.add_mime_type("video/*");

            let dialog = gtk4::FileDialog::builder()
                .title("Choose a Video")
                .modal(true)
                .default_filter(&filter)
                .build();

            let state_inner = state_clone.clone();
            dialog.open(Some(&dash_window), None::<&gio::Cancellable>, move |result| {
                match result {
                    Ok(file) => match file.path() {
                        Some(path) => app::select_file(&state_inner, &path),
                        None => log::warn!("Selected file has no local path"),
                    },
                    Err(e) => log::debug!("File dialog closed: {e}"),
                }
            });
        });
    }

    // Drag and drop
    {
        let drop_target = gtk4::DropTarget::new(gio::File::static_type(), gdk::DragAction::COPY);
        let state_clone = state.clone();
        drop_target.connect_drop(move |_, value, _, _| {
            let Ok(file) = value.get::<gio::File>() else {
                return false;
            };
            match file.path() {
                Some(path) => {
                    app::select_file(&state_clone, &path);
                    true
                }
                None => false,
            }
        });
        let zone = dashboard.drop_zone.clone();
        drop_target.connect_enter(move |_, _, _| {
            zone.add_css_class("drop-hover");
            gdk::DragAction::COPY
        });
        let zone = dashboard.drop_zone.clone();
        drop_target.connect_leave(move |_| zone.remove_css_class("drop-hover"));
        dashboard.drop_zone.add_controller(drop_target);
    }

    {
        let state_clone = state.clone();
        dashboard
            .record_button
            .connect_clicked(move |_| app::toggle_recording(&state_clone));
    }

    {
        let state_clone = state.clone();
        dashboard
            .upload_button
            .connect_clicked(move |_| app::dispatch_analysis(&state_clone));
    }

    {
        let state_clone = state.clone();
        dashboard
            .report_button
            .connect_clicked(move |_| app::dispatch_report(&state_clone));
    }

    {
        let state_clone = state.clone();
        dashboard
            .save_text_button
            .connect_clicked(move |_| app::save_report(&state_clone, ExportFormat::Text));
        let state_clone = state.clone();
        dashboard
            .save_html_button
            .connect_clicked(move |_| app::save_report(&state_clone, ExportFormat::Html));
    }

    // API key: saved and handed to the relay when applied
    {
        let state_clone = state.clone();
        dashboard
            .api_key_row
            .connect_apply(move |row: &libadwaita::PasswordEntryRow| {
                let key = row.text().trim().to_string();
                {
                    let mut s = state_clone.borrow_mut();
                    s.config.llm.api_key = key;
                    if let Err(e) = s.config.save() {
                        log::warn!("Failed to save config: {e}");
                    }
                }
                app::restart_relay(&state_clone);
            });
    }

    // Actions
    {
        let kyc_action = gio::SimpleAction::new("kyc", None);
        let state_clone = state.clone();
        kyc_action.connect_activate(move |_, _| app::open_kyc(&state_clone));
        app.add_action(&kyc_action);

        let quit_action = gio::SimpleAction::new("quit", None);
        let app_clone = app.clone();
        quit_action.connect_activate(move |_, _| app_clone.quit());
        app.add_action(&quit_action);
    }

    {
        let state_clone = state.clone();
        app.connect_shutdown(move |_| {
            log::info!("Shutting down");
            app::shutdown_capture(&state_clone);
            app::stop_relay(&state_clone);
        });
    }

    // Store UI handles in state
    let window = dashboard.window.clone();
    state.borrow_mut().dashboard = Some(dashboard);
    app::refresh(&state);
    window.present();

    app::start_relay(&state);

    // Attach backend event handler
    {
        let state_clone = state.clone();
        glib::spawn_future_local(async move {
            while let Ok(event) = backend_rx.recv().await {
                app::handle_backend_event(&state_clone, event);
            }
        });
    }
}
