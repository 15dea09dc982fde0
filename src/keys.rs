//! Key codes a tick generator may emit.
//!
//! Values are Linux input-event codes (`KEY_*` in `input-event-codes.h`), so
//! a key can be given either by name (`space`, `f5`) or by its decimal code
//! (`57`).

use crate::error::{MetronomeError, Result};
use std::fmt;
use std::str::FromStr;

macro_rules! key_codes {
    (@first $first:literal $(, $rest:literal)*) => { $first };
    ($($variant:ident = $code:literal => [$($name:literal),+]),+ $(,)?) => {
        /// A key from the fixed set the virtual keyboard can declare.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum KeyCode {
            $($variant = $code),+
        }

        impl KeyCode {
            /// Every supported key, ordered by code.
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$variant),+];

            /// Canonical lowercase name.
            pub fn name(self) -> &'static str {
                match self {
                    $(KeyCode::$variant => key_codes!(@first $($name),+)),+
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($($name)|+ => Some(KeyCode::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

key_codes! {
    Escape = 1 => ["escape", "esc"],
    Digit1 = 2 => ["1"],
    Digit2 = 3 => ["2"],
    Digit3 = 4 => ["3"],
    Digit4 = 5 => ["4"],
    Digit5 = 6 => ["5"],
    Digit6 = 7 => ["6"],
    Digit7 = 8 => ["7"],
    Digit8 = 9 => ["8"],
    Digit9 = 10 => ["9"],
    Digit0 = 11 => ["0"],
    Minus = 12 => ["minus", "-"],
    Equal = 13 => ["equal", "="],
    Backspace = 14 => ["backspace"],
    Tab = 15 => ["tab"],
    Q = 16 => ["q"],
    W = 17 => ["w"],
    E = 18 => ["e"],
    R = 19 => ["r"],
    T = 20 => ["t"],
    Y = 21 => ["y"],
    U = 22 => ["u"],
    I = 23 => ["i"],
    O = 24 => ["o"],
    P = 25 => ["p"],
    Enter = 28 => ["enter", "return"],
    A = 30 => ["a"],
    S = 31 => ["s"],
    D = 32 => ["d"],
    F = 33 => ["f"],
    G = 34 => ["g"],
    H = 35 => ["h"],
    J = 36 => ["j"],
    K = 37 => ["k"],
    L = 38 => ["l"],
    Z = 44 => ["z"],
    X = 45 => ["x"],
    C = 46 => ["c"],
    V = 47 => ["v"],
    B = 48 => ["b"],
    N = 49 => ["n"],
    M = 50 => ["m"],
    Space = 57 => ["space"],
    F1 = 59 => ["f1"],
    F2 = 60 => ["f2"],
    F3 = 61 => ["f3"],
    F4 = 62 => ["f4"],
    F5 = 63 => ["f5"],
    F6 = 64 => ["f6"],
    F7 = 65 => ["f7"],
    F8 = 66 => ["f8"],
    F9 = 67 => ["f9"],
    F10 = 68 => ["f10"],
    F11 = 87 => ["f11"],
    F12 = 88 => ["f12"],
    Home = 102 => ["home"],
    Up = 103 => ["up", "arrowup"],
    PageUp = 104 => ["pageup"],
    Left = 105 => ["left", "arrowleft"],
    Right = 106 => ["right", "arrowright"],
    End = 107 => ["end"],
    Down = 108 => ["down", "arrowdown"],
    PageDown = 109 => ["pagedown"],
    Insert = 110 => ["insert"],
    Delete = 111 => ["delete"],
}

impl KeyCode {
    /// Linux input-event code.
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.code() == code)
    }

    /// Parses a key name (case-insensitive) or a decimal key code.
    ///
    /// Single digits are always names: `"1"` is the `1` key, not `KEY_ESC`.
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(MetronomeError::invalid_key(key, "empty key"));
        }

        if let Some(code) = Self::from_name(&key) {
            return Ok(code);
        }

        match key.parse::<u16>() {
            Ok(raw) => Self::from_code(raw)
                .ok_or_else(|| MetronomeError::invalid_key(&key, "unsupported key code")),
            Err(_) => Err(MetronomeError::invalid_key(&key, "unknown key name")),
        }
    }
}

impl FromStr for KeyCode {
    type Err = MetronomeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name() {
        assert_eq!(KeyCode::parse("space").unwrap(), KeyCode::Space);
        assert_eq!(KeyCode::parse("SPACE").unwrap(), KeyCode::Space);
        assert_eq!(KeyCode::parse(" return ").unwrap(), KeyCode::Enter);
        assert_eq!(KeyCode::parse("f12").unwrap(), KeyCode::F12);
        assert_eq!(KeyCode::parse("1").unwrap(), KeyCode::Digit1);
    }

    #[test]
    fn test_parse_by_code() {
        assert_eq!(KeyCode::parse("57").unwrap(), KeyCode::Space);
        assert_eq!(KeyCode::parse("30").unwrap(), KeyCode::A);
        assert!(KeyCode::parse("29").is_err());
        assert!(KeyCode::parse("70000").is_err());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(KeyCode::parse("").is_err());
        assert!(KeyCode::parse("hyper").is_err());
    }

    #[test]
    fn test_linux_codes() {
        assert_eq!(KeyCode::Space.code(), 57);
        assert_eq!(KeyCode::Escape.code(), 1);
        assert_eq!(KeyCode::Delete.code(), 111);
        assert_eq!(KeyCode::from_code(28), Some(KeyCode::Enter));
    }

    #[test]
    fn test_names_round_trip() {
        for key in KeyCode::ALL {
            assert_eq!(KeyCode::parse(key.name()).unwrap(), *key);
        }
    }
}
