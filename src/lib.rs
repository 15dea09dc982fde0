//! # Key Metronome
//!
//! Generates periodic synthetic key presses on a virtual keyboard, at up to
//! three independent frequencies, toggled on and off by a global hotkey.
//!
//! ## Features
//!
//! - One to three tick generators, each with its own interval and key
//! - Drift-free scheduling: deadlines advance by whole intervals, missed
//!   ticks are reported
//! - Virtual keyboard through Linux uinput, or an in-memory recorder
//! - Global hotkey toggle, plus `SIGUSR1` on unix
//! - JSON configuration file support
//!
//! ## Example
//!
//! ```no_run
//! use key_metronome::{Config, KeyCode, Metronome, RecordingHost};
//!
//! # async fn run() -> key_metronome::Result<()> {
//! let config = Config {
//!     delay: 500_000_000,
//!     key: "a".to_string(),
//!     status: true,
//!     ..Config::default()
//! };
//!
//! let host = RecordingHost::new();
//! let metronome = Metronome::start(&config.settings()?, &host, Vec::new())?;
//! tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//! metronome.stop().await;
//!
//! println!("{} presses", host.recording().presses(KeyCode::A).len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod hotkey;
pub mod keys;
pub mod metronome;
#[cfg(unix)]
pub mod signal;
pub mod tick;
pub mod toggle;

pub use config::{Config, Settings};
#[cfg(target_os = "linux")]
pub use device::UinputHost;
pub use device::{InputHost, InputSink, RecordingHost};
pub use error::{MetronomeError, Result};
pub use hotkey::GlobalHotkeyTrigger;
pub use keys::KeyCode;
pub use metronome::Metronome;
#[cfg(unix)]
pub use signal::SignalTrigger;
pub use tick::TickGenerator;
pub use toggle::{ToggleSwitch, ToggleTrigger};
