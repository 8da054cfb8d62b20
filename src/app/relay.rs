use std::cell::RefCell;
use std::rc::Rc;

use tokio::net::TcpListener;

use super::state::{AppState, RelayHandle};
use crate::report::{self, LlmClient};

/// Run the report relay on the runtime when enabled in config.
pub fn start_relay(state: &Rc<RefCell<AppState>>) {
    spawn_relay(state, None);
}

/// Restart the relay so it picks up a new API key. The old listener is
/// shut down before the new one binds the same address.
pub fn restart_relay(state: &Rc<RefCell<AppState>>) {
    let previous = state.borrow_mut().relay.take();
    spawn_relay(state, previous);
}

fn spawn_relay(state: &Rc<RefCell<AppState>>, previous: Option<RelayHandle>) {
    let mut s = state.borrow_mut();
    if !s.config.relay.enabled {
        if let Some(old) = previous {
            let _ = old.shutdown.send(());
        }
        return;
    }

    let llm = match LlmClient::new(&s.config.llm, s.config.request_timeout()) {
        Ok(llm) => llm,
        Err(e) => {
            log::warn!("Report relay disabled: {e}");
            return;
        }
    };
    let bind = s.config.relay.bind.clone();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let task = s.tokio_rt.spawn(async move {
        if let Some(old) = previous {
            let _ = old.shutdown.send(());
            let _ = old.task.await;
        }

        let listener = match TcpListener::bind(&bind).await {
            Ok(listener) => listener,
            Err(e) => {
                log::warn!("Report relay disabled: cannot bind {bind}: {e}");
                return;
            }
        };
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = report::serve(listener, llm, shutdown).await {
            log::error!("Report relay stopped: {e}");
        }
    });

    s.relay = Some(RelayHandle {
        shutdown: shutdown_tx,
        task,
    });
}

/// Ask the relay to finish in-flight requests and stop.
pub fn stop_relay(state: &Rc<RefCell<AppState>>) {
    if let Some(relay) = state.borrow_mut().relay.take() {
        let _ = relay.shutdown.send(());
    }
}
