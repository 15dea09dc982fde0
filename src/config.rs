//! Startup configuration.
//!
//! Options come from a JSON file, the command line, or both (command line
//! wins). Once the metronome has started they are never re-read.
//!
//! ```json
//! {
//!   "delay": 500000000,
//!   "key": "a",
//!   "delay2": 300000000,
//!   "key2": "b",
//!   "hotkey_code": "ctrl+alt+a",
//!   "status": false
//! }
//! ```

use crate::error::{MetronomeError, Result};
use crate::hotkey::{parse_hotkey, DEFAULT_HOTKEY};
use crate::keys::KeyCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Number of generator slots.
pub const GENERATOR_SLOTS: usize = 3;

/// Default interval of generator 1: one second.
pub const DEFAULT_DELAY_NS: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Generator 1 interval in nanoseconds. Must be positive.
    #[serde(default = "default_delay")]
    pub delay: i64,

    #[serde(default = "default_key")]
    pub key: String,

    /// Generator 2 interval in nanoseconds; `<= 0` disables it.
    #[serde(default)]
    pub delay2: i64,

    #[serde(default = "default_key2")]
    pub key2: String,

    /// Generator 3 interval in nanoseconds; `<= 0` disables it.
    #[serde(default)]
    pub delay3: i64,

    #[serde(default = "default_key3")]
    pub key3: String,

    #[serde(default = "default_hotkey")]
    pub hotkey_code: String,

    /// Initial state of the toggle switch.
    #[serde(default)]
    pub status: bool,

    #[serde(default)]
    pub verbose: bool,
}

fn default_delay() -> i64 {
    DEFAULT_DELAY_NS
}

fn default_key() -> String {
    "space".to_string()
}

fn default_key2() -> String {
    "enter".to_string()
}

fn default_key3() -> String {
    "tab".to_string()
}

fn default_hotkey() -> String {
    DEFAULT_HOTKEY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay: default_delay(),
            key: default_key(),
            delay2: 0,
            key2: default_key2(),
            delay3: 0,
            key3: default_key3(),
            hotkey_code: default_hotkey(),
            status: false,
            verbose: false,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| MetronomeError::config_load(path, e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| MetronomeError::config_load(path, e.to_string()))
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| MetronomeError::config_save(path, e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.settings().map(|_| ())
    }

    /// Resolves the raw options into typed settings.
    pub fn settings(&self) -> Result<Settings> {
        if self.delay <= 0 {
            return Err(MetronomeError::config_validation(format!(
                "delay must be positive, got {}ns",
                self.delay
            )));
        }

        if self.hotkey_code.trim().is_empty() {
            return Err(MetronomeError::config_validation(
                "hotkey_code cannot be empty",
            ));
        }
        parse_hotkey(&self.hotkey_code)?;

        let slots = [
            (self.delay, &self.key),
            (self.delay2, &self.key2),
            (self.delay3, &self.key3),
        ];

        let mut generators = [None; GENERATOR_SLOTS];
        for (slot, (delay, key)) in slots.into_iter().enumerate() {
            if delay <= 0 {
                continue;
            }
            generators[slot] = Some(GeneratorSettings {
                index: slot + 1,
                interval: Duration::from_nanos(delay.unsigned_abs()),
                key: KeyCode::parse(key)?,
            });
        }

        Ok(Settings {
            generators,
            hotkey_code: self.hotkey_code.clone(),
            status: self.status,
        })
    }
}

/// One enabled generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// 1-based slot number.
    pub index: usize,
    pub interval: Duration,
    pub key: KeyCode,
}

/// Validated configuration. Slot 1 is always enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    generators: [Option<GeneratorSettings>; GENERATOR_SLOTS],
    hotkey_code: String,
    status: bool,
}

impl Settings {
    /// Enabled generators in slot order.
    pub fn generators(&self) -> impl Iterator<Item = &GeneratorSettings> {
        self.generators.iter().flatten()
    }

    pub fn slot(&self, index: usize) -> Option<&GeneratorSettings> {
        index
            .checked_sub(1)
            .and_then(|slot| self.generators.get(slot))
            .and_then(Option::as_ref)
    }

    /// Keys of the enabled generators, without duplicates.
    pub fn keys(&self) -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = self.generators().map(|g| g.key).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn hotkey_code(&self) -> &str {
        &self.hotkey_code
    }

    pub fn status(&self) -> bool {
        self.status
    }
}

/// Parses an interval into nanoseconds.
///
/// A bare integer is nanoseconds; `ns`, `us`, `ms`, `s` and `m` suffixes are
/// accepted. Negative values are allowed so that extra generators can be
/// disabled explicitly.
pub fn parse_interval(value: &str) -> Result<i64> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(MetronomeError::invalid_interval(value, "empty interval"));
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.as_str()),
    };

    let split = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    let (digits, unit) = body.split_at(split);

    if digits.is_empty() {
        return Err(MetronomeError::invalid_interval(value, "missing number"));
    }

    let amount: i64 = digits
        .parse()
        .map_err(|_| MetronomeError::invalid_interval(value, "number out of range"))?;

    let scale: i64 = match unit {
        "" | "ns" => 1,
        "us" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        other => {
            return Err(MetronomeError::invalid_interval(
                value,
                format!("unknown unit '{}'", other),
            ))
        }
    };

    let nanos = amount
        .checked_mul(scale)
        .ok_or_else(|| MetronomeError::invalid_interval(value, "interval too large"))?;

    Ok(if negative { -nanos } else { nanos })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("1000000000").unwrap(), 1_000_000_000);
        assert_eq!(parse_interval("500ms").unwrap(), 500_000_000);
        assert_eq!(parse_interval(" 2S ").unwrap(), 2_000_000_000);
        assert_eq!(parse_interval("250us").unwrap(), 250_000);
        assert_eq!(parse_interval("1m").unwrap(), 60_000_000_000);
        assert_eq!(parse_interval("0").unwrap(), 0);
        assert_eq!(parse_interval("-1").unwrap(), -1);

        assert!(parse_interval("").is_err());
        assert!(parse_interval("ms").is_err());
        assert!(parse_interval("10h").is_err());
        assert!(parse_interval("1.5s").is_err());
        assert!(parse_interval("99999999999999999999").is_err());
    }

    #[test]
    fn test_default_settings_enable_only_first_slot() {
        let settings = Config::default().settings().unwrap();
        let enabled: Vec<_> = settings.generators().collect();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].index, 1);
        assert_eq!(enabled[0].interval, Duration::from_secs(1));
        assert_eq!(enabled[0].key, KeyCode::Space);
        assert_eq!(settings.keys(), vec![KeyCode::Space]);
        assert!(!settings.status());
        assert_eq!(settings.hotkey_code(), DEFAULT_HOTKEY);
    }

    #[test]
    fn test_non_positive_delays_disable_extra_slots() {
        let config = Config {
            delay2: -5,
            delay3: 300_000_000,
            key3: "b".to_string(),
            ..Config::default()
        };
        let settings = config.settings().unwrap();
        assert!(settings.slot(2).is_none());
        assert_eq!(settings.slot(3).unwrap().key, KeyCode::B);
        assert!(settings.slot(0).is_none());
        assert!(settings.slot(4).is_none());
    }

    #[test]
    fn test_disabled_slot_key_is_not_validated() {
        let config = Config {
            key2: "not-a-key".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let config = Config {
            delay: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MetronomeError::ConfigValidation(_))
        ));

        let config = Config {
            key: "hyper".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MetronomeError::InvalidKey { .. })
        ));

        let config = Config {
            hotkey_code: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            hotkey_code: "ctrl+alt".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MetronomeError::InvalidHotkey { .. })
        ));
    }

    #[test]
    fn test_shared_keys_are_declared_once() {
        let config = Config {
            delay2: 250_000_000,
            key2: "space".to_string(),
            ..Config::default()
        };
        let settings = config.settings().unwrap();
        assert_eq!(settings.generators().count(), 2);
        assert_eq!(settings.keys(), vec![KeyCode::Space]);
    }
}
