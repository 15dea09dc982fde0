use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide on/off flag gating tick emission.
///
/// Clones share the same flag. Reads and writes are relaxed: a tick already in
/// flight may observe either the old or the new value.
#[derive(Debug, Clone, Default)]
pub struct ToggleSwitch {
    on: Arc<AtomicBool>,
}

impl ToggleSwitch {
    pub fn new(initial: bool) -> Self {
        Self {
            on: Arc::new(AtomicBool::new(initial)),
        }
    }

    /// Flips the flag. Load and store are separate, so two simultaneous
    /// toggles may collapse into one.
    pub fn toggle(&self) {
        let current = self.on.load(Ordering::Relaxed);
        self.on.store(!current, Ordering::Relaxed);
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }
}

/// External event source that flips a [`ToggleSwitch`].
pub trait ToggleTrigger {
    /// Human-readable description for log lines.
    fn describe(&self) -> String;

    /// Starts delivering events to `switch`.
    fn register(&mut self, switch: ToggleSwitch) -> Result<()>;

    /// Stops delivering events. Never fails; problems are logged.
    fn unregister(&mut self);
}
