use super::{DeviceSpec, InputHost, InputSink, KeyState};
use crate::error::{MetronomeError, Result};
use crate::keys::KeyCode;
use std::collections::BTreeSet;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

/// One key report received by a recording device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedEvent {
    pub key: KeyCode,
    pub state: KeyState,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct RecordingState {
    declared: BTreeSet<KeyCode>,
    key_repeat: bool,
    events: Vec<RecordedEvent>,
    registered: bool,
    released: bool,
}

/// Shared view of everything a [`RecordingHost`] device has seen.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    state: Arc<Mutex<RecordingState>>,
}

impl Recording {
    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.lock().events.clone()
    }

    /// Key-down reports for `key`.
    pub fn presses(&self, key: KeyCode) -> Vec<Instant> {
        self.lock()
            .events
            .iter()
            .filter(|event| event.key == key && event.state == KeyState::Pressed)
            .map(|event| event.at)
            .collect()
    }

    pub fn declared(&self) -> BTreeSet<KeyCode> {
        self.lock().declared.clone()
    }

    /// Whether the registered device asked for autorepeat (`EV_REP`).
    pub fn key_repeat(&self) -> bool {
        self.lock().key_repeat
    }

    pub fn is_registered(&self) -> bool {
        self.lock().registered
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }
}

/// In-memory input host used for dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    recording: Recording,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }
}

pub struct RecordingAllocation {
    spec: DeviceSpec,
}

impl InputHost for RecordingHost {
    type Allocated = RecordingAllocation;

    fn allocate(&self, spec: &DeviceSpec) -> Result<Self::Allocated> {
        if spec.keys.is_empty() {
            return Err(MetronomeError::device_allocation("no keys declared"));
        }
        Ok(RecordingAllocation { spec: spec.clone() })
    }

    fn register(&self, device: Self::Allocated) -> Result<Arc<dyn InputSink>> {
        {
            let mut state = self.recording.lock();
            if state.registered {
                return Err(MetronomeError::device_registration(
                    device.spec.name,
                    "recording host already has a device",
                ));
            }
            state.declared = device.spec.keys.clone();
            state.key_repeat = device.spec.key_repeat;
            state.registered = true;
        }
        debug!(
            "Recording device '{}' registered with {} key(s)",
            device.spec.name,
            device.spec.keys.len()
        );

        Ok(Arc::new(RecordingDevice {
            spec: device.spec,
            recording: self.recording.clone(),
        }))
    }
}

struct RecordingDevice {
    spec: DeviceSpec,
    recording: Recording,
}

impl InputSink for RecordingDevice {
    fn send_key(&self, key: KeyCode, state: KeyState) -> io::Result<()> {
        if !self.spec.declares(key) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("key '{}' was not declared by '{}'", key, self.spec.name),
            ));
        }

        self.recording.lock().events.push(RecordedEvent {
            key,
            state,
            at: Instant::now(),
        });
        Ok(())
    }
}

impl Drop for RecordingDevice {
    fn drop(&mut self) {
        let mut state = self.recording.lock();
        state.registered = false;
        state.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_key_is_rejected() {
        let host = RecordingHost::new();
        let allocated = host.allocate(&DeviceSpec::keyboard([KeyCode::A])).unwrap();
        let sink = host.register(allocated).unwrap();

        assert!(sink.send_key(KeyCode::A, KeyState::Pressed).is_ok());
        let err = sink.send_key(KeyCode::B, KeyState::Pressed).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(host.recording().events().len(), 1);
    }

    #[test]
    fn test_drop_releases_device() {
        let host = RecordingHost::new();
        let recording = host.recording();
        let allocated = host.allocate(&DeviceSpec::keyboard([KeyCode::Space])).unwrap();
        let sink = host.register(allocated).unwrap();

        assert!(recording.is_registered());
        assert_eq!(recording.declared().len(), 1);
        drop(sink);
        assert!(!recording.is_registered());
        assert!(recording.is_released());
    }

    #[test]
    fn test_key_repeat_is_carried_to_registration() {
        let host = RecordingHost::new();
        let allocated = host.allocate(&DeviceSpec::keyboard([KeyCode::A])).unwrap();
        let _sink = host.register(allocated).unwrap();
        assert!(host.recording().key_repeat());

        let host = RecordingHost::new();
        let spec = DeviceSpec {
            key_repeat: false,
            ..DeviceSpec::keyboard([KeyCode::A])
        };
        let allocated = host.allocate(&spec).unwrap();
        let _sink = host.register(allocated).unwrap();
        assert!(!host.recording().key_repeat());
    }

    #[test]
    fn test_empty_spec_fails_allocation() {
        let host = RecordingHost::new();
        let err = host
            .allocate(&DeviceSpec::keyboard(Vec::<KeyCode>::new()))
            .err()
            .unwrap();
        assert!(matches!(err, MetronomeError::DeviceAllocation(_)));
    }
}
