//! Virtual input device.
//!
//! The metronome never talks to an input subsystem directly. It asks an
//! [`InputHost`] to allocate and then register a keyboard described by a
//! [`DeviceSpec`], and emits through the returned [`InputSink`]. Dropping the
//! last handle to the sink unregisters and releases the device.

mod recording;
#[cfg(target_os = "linux")]
mod uinput;

pub use recording::{RecordedEvent, Recording, RecordingHost};
#[cfg(target_os = "linux")]
pub use uinput::UinputHost;

use crate::error::Result;
use crate::keys::KeyCode;
use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

/// Name the virtual keyboard is registered under.
pub const DEVICE_NAME: &str = "Key Metronome";

/// Key transition carried by a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released = 0,
    Pressed = 1,
}

/// Capabilities declared when the device is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    pub name: &'static str,
    pub keys: BTreeSet<KeyCode>,
    pub key_repeat: bool,
}

impl DeviceSpec {
    /// A keyboard supporting key events and key repeat for exactly `keys`.
    pub fn keyboard(keys: impl IntoIterator<Item = KeyCode>) -> Self {
        Self {
            name: DEVICE_NAME,
            keys: keys.into_iter().collect(),
            key_repeat: true,
        }
    }

    pub fn declares(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }
}

/// A registered device that accepts key reports.
pub trait InputSink: Send + Sync {
    /// Reports one key transition followed by a synchronization frame.
    fn send_key(&self, key: KeyCode, state: KeyState) -> io::Result<()>;
}

/// Host input subsystem able to create virtual keyboards.
pub trait InputHost {
    /// A device that has been allocated but not yet registered.
    type Allocated;

    fn allocate(&self, spec: &DeviceSpec) -> Result<Self::Allocated>;

    /// Registers an allocated device. On failure the allocation is dropped.
    fn register(&self, device: Self::Allocated) -> Result<Arc<dyn InputSink>>;
}

/// Emits a full key press: down, sync, up, sync.
pub fn tap(sink: &dyn InputSink, key: KeyCode) -> io::Result<()> {
    sink.send_key(key, KeyState::Pressed)?;
    sink.send_key(key, KeyState::Released)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_spec_declares_only_given_keys() {
        let spec = DeviceSpec::keyboard([KeyCode::A, KeyCode::Space, KeyCode::A]);
        assert_eq!(spec.keys.len(), 2);
        assert!(spec.declares(KeyCode::A));
        assert!(spec.declares(KeyCode::Space));
        assert!(!spec.declares(KeyCode::B));
        assert!(spec.key_repeat);
        assert_eq!(spec.name, DEVICE_NAME);
    }

    #[test]
    fn test_tap_is_down_then_up() {
        let host = RecordingHost::new();
        let allocated = host.allocate(&DeviceSpec::keyboard([KeyCode::Space])).unwrap();
        let sink = host.register(allocated).unwrap();

        tap(sink.as_ref(), KeyCode::Space).unwrap();

        let events = host.recording().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, KeyCode::Space);
        assert_eq!(events[0].state, KeyState::Pressed);
        assert_eq!(events[1].key, KeyCode::Space);
        assert_eq!(events[1].state, KeyState::Released);
    }
}
