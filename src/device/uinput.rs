//! `/dev/uinput` backend.
//!
//! Talks to the kernel's uinput interface directly through `nix` ioctls, so
//! every capability bit of a [`DeviceSpec`] (including `EV_REP`) is set
//! before `UI_DEV_CREATE`.

use super::{DeviceSpec, InputHost, InputSink, KeyState};
use crate::error::{MetronomeError, Result};
use crate::keys::KeyCode;
use nix::libc;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use tracing::{debug, info, warn};

const UINPUT_PATH: &str = "/dev/uinput";
const UINPUT_MAX_NAME_SIZE: usize = 80;

const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_REP: u16 = 0x14;
const SYN_REPORT: u16 = 0;
const BUS_VIRTUAL: u16 = 0x06;

mod ioctl {
    use super::UinputSetup;

    nix::ioctl_none!(ui_dev_create, b'U', 1);
    nix::ioctl_none!(ui_dev_destroy, b'U', 2);
    nix::ioctl_write_ptr!(ui_dev_setup, b'U', 3, UinputSetup);
    nix::ioctl_write_int!(ui_set_evbit, b'U', 100);
    nix::ioctl_write_int!(ui_set_keybit, b'U', 101);
}

/// `struct input_id` from `linux/input.h`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct InputId {
    bustype: u16,
    vendor: u16,
    product: u16,
    version: u16,
}

/// `struct uinput_setup` from `linux/uinput.h`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct UinputSetup {
    id: InputId,
    name: [libc::c_char; UINPUT_MAX_NAME_SIZE],
    ff_effects_max: u32,
}

/// `struct input_event` from `linux/input.h`.
#[repr(C)]
#[derive(Clone, Copy)]
struct RawInputEvent {
    time: libc::timeval,
    event_type: u16,
    code: u16,
    value: i32,
}

impl RawInputEvent {
    fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            event_type,
            code,
            value,
        }
    }
}

/// Event types the device declares: always `EV_KEY`, plus `EV_REP` when the
/// spec asks for key repeat.
fn event_types(spec: &DeviceSpec) -> Vec<u16> {
    let mut types = vec![EV_KEY];
    if spec.key_repeat {
        types.push(EV_REP);
    }
    types
}

fn device_setup(spec: &DeviceSpec) -> UinputSetup {
    let mut name = [0 as libc::c_char; UINPUT_MAX_NAME_SIZE];
    // Keep the trailing NUL.
    for (slot, byte) in name
        .iter_mut()
        .zip(spec.name.bytes().take(UINPUT_MAX_NAME_SIZE - 1))
    {
        *slot = byte as libc::c_char;
    }

    UinputSetup {
        id: InputId {
            bustype: BUS_VIRTUAL,
            vendor: 0x1,
            product: 0x1,
            version: 1,
        },
        name,
        ff_effects_max: 0,
    }
}

/// A key report and its SYN_REPORT, written in one `write(2)` so reports
/// from concurrent generators never split a frame.
fn key_frame(key: KeyCode, state: KeyState) -> [RawInputEvent; 2] {
    [
        RawInputEvent::new(EV_KEY, key.code(), state as i32),
        RawInputEvent::new(EV_SYN, SYN_REPORT, 0),
    ]
}

/// Creates virtual keyboards through the kernel's uinput module.
///
/// Needs write access to `/dev/uinput` (root, or membership in the `input`
/// group with a matching udev rule).
#[derive(Debug, Default)]
pub struct UinputHost;

impl UinputHost {
    pub fn new() -> Self {
        Self
    }
}

/// An open `/dev/uinput` handle not yet turned into a device. Dropping it
/// closes the descriptor.
pub struct UinputAllocation {
    file: File,
    spec: DeviceSpec,
}

impl InputHost for UinputHost {
    type Allocated = UinputAllocation;

    fn allocate(&self, spec: &DeviceSpec) -> Result<Self::Allocated> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(UINPUT_PATH)
            .map_err(|e| MetronomeError::device_allocation(format!("{}: {}", UINPUT_PATH, e)))?;

        Ok(UinputAllocation {
            file,
            spec: spec.clone(),
        })
    }

    fn register(&self, device: Self::Allocated) -> Result<Arc<dyn InputSink>> {
        let UinputAllocation { file, spec } = device;

        configure(&file, &spec)
            .map_err(|e| MetronomeError::device_registration(spec.name, e.to_string()))?;

        info!(
            "Registered uinput device '{}' ({} key(s), repeat {})",
            spec.name,
            spec.keys.len(),
            if spec.key_repeat { "on" } else { "off" }
        );
        Ok(Arc::new(UinputKeyboard { file, spec }))
    }
}

fn configure(file: &File, spec: &DeviceSpec) -> io::Result<()> {
    let fd = file.as_raw_fd();
    let setup = device_setup(spec);

    // SAFETY: `fd` is an open uinput descriptor owned by `file`, and every
    // argument matches the kernel's declaration of the request.
    unsafe {
        for event_type in event_types(spec) {
            ioctl::ui_set_evbit(fd, event_type.into())?;
        }
        for key in &spec.keys {
            ioctl::ui_set_keybit(fd, key.code().into())?;
        }
        ioctl::ui_dev_setup(fd, &setup)?;
        ioctl::ui_dev_create(fd)?;
    }

    Ok(())
}

struct UinputKeyboard {
    file: File,
    spec: DeviceSpec,
}

impl InputSink for UinputKeyboard {
    fn send_key(&self, key: KeyCode, state: KeyState) -> io::Result<()> {
        if !self.spec.declares(key) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("key '{}' was not declared by '{}'", key, self.spec.name),
            ));
        }

        let frame = key_frame(key, state);
        // SAFETY: `RawInputEvent` is `repr(C)` plain data; the slice covers
        // exactly the two events in `frame`.
        let bytes = unsafe {
            std::slice::from_raw_parts(
                frame.as_ptr().cast::<u8>(),
                std::mem::size_of_val(&frame),
            )
        };
        (&self.file).write_all(bytes)
    }
}

impl Drop for UinputKeyboard {
    fn drop(&mut self) {
        debug!("Destroying uinput device '{}'", self.spec.name);
        // SAFETY: the descriptor is still open; the file closes after this.
        if let Err(e) = unsafe { ioctl::ui_dev_destroy(self.file.as_raw_fd()) } {
            warn!("Failed to destroy uinput device '{}': {}", self.spec.name, e);
        }
    }
}
