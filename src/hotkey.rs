use crate::error::{MetronomeError, Result};
use crate::keys::KeyCode;
use crate::toggle::{ToggleSwitch, ToggleTrigger};
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default toggle combination.
#[cfg(target_os = "macos")]
pub const DEFAULT_HOTKEY: &str = "cmd+alt+a";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_HOTKEY: &str = "ctrl+alt+a";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// System-wide key combination that flips the toggle switch on every press.
pub struct GlobalHotkeyTrigger {
    manager: GlobalHotKeyManager,
    combo: String,
    hotkey: HotKey,
    listening: Arc<AtomicBool>,
}

impl GlobalHotkeyTrigger {
    pub fn new(combo: &str) -> Result<Self> {
        let hotkey = parse_hotkey(combo)?;
        let manager = GlobalHotKeyManager::new().map_err(|e| {
            MetronomeError::hotkey(format!("failed to create GlobalHotKeyManager: {}", e))
        })?;

        Ok(Self {
            manager,
            combo: combo.to_string(),
            hotkey,
            listening: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl ToggleTrigger for GlobalHotkeyTrigger {
    fn describe(&self) -> String {
        format!("hotkey '{}'", self.combo)
    }

    fn register(&mut self, switch: ToggleSwitch) -> Result<()> {
        self.manager.register(self.hotkey).map_err(|e| {
            MetronomeError::hotkey(format!("failed to register '{}': {}", self.combo, e))
        })?;

        self.listening.store(true, Ordering::Relaxed);
        let listening = self.listening.clone();
        let id = self.hotkey.id();
        let combo = self.combo.clone();
        let receiver = GlobalHotKeyEvent::receiver();

        tokio::task::spawn_blocking(move || {
            while listening.load(Ordering::Relaxed) {
                match receiver.try_recv() {
                    Ok(event) if event.id == id && event.state == HotKeyState::Pressed => {
                        switch.toggle();
                        info!(
                            "Hotkey '{}' pressed, emission {}",
                            combo,
                            if switch.is_on() { "ON" } else { "OFF" }
                        );
                    }
                    Ok(_) => {}
                    Err(_) => std::thread::sleep(POLL_INTERVAL),
                }
            }
            debug!("Hotkey listener for '{}' stopped", combo);
        });

        Ok(())
    }

    fn unregister(&mut self) {
        if !self.listening.swap(false, Ordering::Relaxed) {
            return;
        }
        if let Err(e) = self.manager.unregister(self.hotkey) {
            warn!("Failed to unregister hotkey '{}': {}", self.combo, e);
        }
    }
}

/// Parses a combination such as `ctrl+alt+a` or `super+f9`.
pub fn parse_hotkey(hotkey_str: &str) -> Result<HotKey> {
    let binding = hotkey_str.to_lowercase();
    let parts: Vec<&str> = binding
        .split('+')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(MetronomeError::invalid_hotkey(hotkey_str, "empty hotkey"));
    }

    let mut modifiers = Modifiers::empty();
    let mut key_code = None;

    for part in &parts {
        match *part {
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "meta" | "cmd" | "super" => modifiers |= Modifiers::SUPER,
            key => {
                if key_code.is_some() {
                    return Err(MetronomeError::invalid_hotkey(
                        hotkey_str,
                        "multiple keys specified",
                    ));
                }
                let key = KeyCode::parse(key)
                    .map_err(|e| MetronomeError::invalid_hotkey(hotkey_str, e.to_string()))?;
                key_code = Some(hotkey_code(key));
            }
        }
    }

    let code =
        key_code.ok_or_else(|| MetronomeError::invalid_hotkey(hotkey_str, "no key specified"))?;

    Ok(HotKey::new(Some(modifiers), code))
}

fn hotkey_code(key: KeyCode) -> Code {
    match key {
        KeyCode::Escape => Code::Escape,
        KeyCode::Digit1 => Code::Digit1,
        KeyCode::Digit2 => Code::Digit2,
        KeyCode::Digit3 => Code::Digit3,
        KeyCode::Digit4 => Code::Digit4,
        KeyCode::Digit5 => Code::Digit5,
        KeyCode::Digit6 => Code::Digit6,
        KeyCode::Digit7 => Code::Digit7,
        KeyCode::Digit8 => Code::Digit8,
        KeyCode::Digit9 => Code::Digit9,
        KeyCode::Digit0 => Code::Digit0,
        KeyCode::Minus => Code::Minus,
        KeyCode::Equal => Code::Equal,
        KeyCode::Backspace => Code::Backspace,
        KeyCode::Tab => Code::Tab,
        KeyCode::Q => Code::KeyQ,
        KeyCode::W => Code::KeyW,
        KeyCode::E => Code::KeyE,
        KeyCode::R => Code::KeyR,
        KeyCode::T => Code::KeyT,
        KeyCode::Y => Code::KeyY,
        KeyCode::U => Code::KeyU,
        KeyCode::I => Code::KeyI,
        KeyCode::O => Code::KeyO,
        KeyCode::P => Code::KeyP,
        KeyCode::Enter => Code::Enter,
        KeyCode::A => Code::KeyA,
        KeyCode::S => Code::KeyS,
        KeyCode::D => Code::KeyD,
        KeyCode::F => Code::KeyF,
        KeyCode::G => Code::KeyG,
        KeyCode::H => Code::KeyH,
        KeyCode::J => Code::KeyJ,
        KeyCode::K => Code::KeyK,
        KeyCode::L => Code::KeyL,
        KeyCode::Z => Code::KeyZ,
        KeyCode::X => Code::KeyX,
        KeyCode::C => Code::KeyC,
        KeyCode::V => Code::KeyV,
        KeyCode::B => Code::KeyB,
        KeyCode::N => Code::KeyN,
        KeyCode::M => Code::KeyM,
        KeyCode::Space => Code::Space,
        KeyCode::F1 => Code::F1,
        KeyCode::F2 => Code::F2,
        KeyCode::F3 => Code::F3,
        KeyCode::F4 => Code::F4,
        KeyCode::F5 => Code::F5,
        KeyCode::F6 => Code::F6,
        KeyCode::F7 => Code::F7,
        KeyCode::F8 => Code::F8,
        KeyCode::F9 => Code::F9,
        KeyCode::F10 => Code::F10,
        KeyCode::F11 => Code::F11,
        KeyCode::F12 => Code::F12,
        KeyCode::Home => Code::Home,
        KeyCode::Up => Code::ArrowUp,
        KeyCode::PageUp => Code::PageUp,
        KeyCode::Left => Code::ArrowLeft,
        KeyCode::Right => Code::ArrowRight,
        KeyCode::End => Code::End,
        KeyCode::Down => Code::ArrowDown,
        KeyCode::PageDown => Code::PageDown,
        KeyCode::Insert => Code::Insert,
        KeyCode::Delete => Code::Delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hotkey_with_modifiers() {
        let hotkey = parse_hotkey("ctrl+alt+a").unwrap();
        assert_eq!(
            hotkey.id(),
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyA).id()
        );

        let hotkey = parse_hotkey(" Super + F9 ").unwrap();
        assert_eq!(hotkey.id(), HotKey::new(Some(Modifiers::SUPER), Code::F9).id());
    }

    #[test]
    fn test_parse_hotkey_errors() {
        assert!(parse_hotkey("").is_err());
        assert!(parse_hotkey("ctrl+alt").is_err());
        assert!(parse_hotkey("ctrl+a+b").is_err());
        assert!(parse_hotkey("ctrl+hyper").is_err());
    }

    #[test]
    fn test_default_hotkey_parses() {
        assert!(parse_hotkey(DEFAULT_HOTKEY).is_ok());
    }
}
