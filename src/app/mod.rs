mod event_handler;
mod kyc;
mod pipeline;
mod recording;
mod relay;
mod selection;
mod state;

pub use event_handler::handle_backend_event;
pub use kyc::open_kyc;
pub use pipeline::{dispatch_analysis, dispatch_report, save_report};
pub use recording::{shutdown_capture, toggle_recording};
pub use relay::{restart_relay, start_relay, stop_relay};
pub use selection::select_file;
pub use state::{refresh, AppState, BackendEvent, CaptureStatus};
