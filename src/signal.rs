//! `SIGUSR1` as a toggle trigger.
//!
//! Works without a display server, e.g. `pkill -USR1 metronome` from a
//! compositor keybinding under Wayland.

use crate::error::Result;
use crate::toggle::{ToggleSwitch, ToggleTrigger};
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::info;

/// Toggles the switch on every `SIGUSR1`.
///
/// tokio never uninstalls a signal handler once one is registered, so after
/// [`unregister`](ToggleTrigger::unregister) the process keeps catching
/// `SIGUSR1` and ignores it instead of being terminated by the default
/// action.
#[derive(Debug, Default)]
pub struct SignalTrigger {
    listener: Option<JoinHandle<()>>,
}

impl SignalTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToggleTrigger for SignalTrigger {
    fn describe(&self) -> String {
        "signal SIGUSR1".to_string()
    }

    fn register(&mut self, switch: ToggleSwitch) -> Result<()> {
        let mut stream = signal(SignalKind::user_defined1())?;

        self.listener = Some(tokio::spawn(async move {
            while stream.recv().await.is_some() {
                switch.toggle();
                info!(
                    "SIGUSR1 received, emission {}",
                    if switch.is_on() { "ON" } else { "OFF" }
                );
            }
        }));

        Ok(())
    }

    /// Stops toggling. The handler stays installed for the life of the
    /// process, so later signals are swallowed.
    fn unregister(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
