//! # System Keyboard Sink
//!
//! Sends real key taps through the OS input-injection layer (enigo).
//! Key identifiers from the frequency map resolve to either a single
//! unicode character or one of the named special keys; an identifier
//! that resolves to neither fails the tap.

use anyhow::{Result, anyhow, bail};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use presser_core::processor::KeySink;

/// Key sink backed by synthetic OS key events.
///
/// One instance is created at startup and holds the enigo handle for
/// the process lifetime.
pub struct SystemKeyboard {
    enigo: Enigo,
}

impl SystemKeyboard {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("failed to initialize keyboard injection: {e}"))?;
        Ok(Self { enigo })
    }
}

impl KeySink for SystemKeyboard {
    fn tap(&mut self, key: &str) -> Result<()> {
        let key = resolve_key(key)?;
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| anyhow!("failed to tap key: {e}"))
    }
}

/// Resolves a map key identifier to an enigo key.
///
/// Single-character identifiers tap that character; longer ones must
/// name a special key (case-insensitive).
fn resolve_key(name: &str) -> Result<Key> {
    let mut chars = name.chars();
    if let Some(c) = chars.next() {
        if chars.next().is_none() {
            return Ok(Key::Unicode(c));
        }
    }

    let key = match name.to_ascii_lowercase().as_str() {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => bail!("unknown key identifier '{name}'"),
    };
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::resolve_key;
    use enigo::Key;

    #[test]
    fn single_characters_resolve_to_unicode_keys() {
        assert!(matches!(resolve_key("a"), Ok(Key::Unicode('a'))));
        assert!(matches!(resolve_key("7"), Ok(Key::Unicode('7'))));
        assert!(matches!(resolve_key("!"), Ok(Key::Unicode('!'))));
    }

    #[test]
    fn named_keys_resolve_case_insensitively() {
        assert!(matches!(resolve_key("space"), Ok(Key::Space)));
        assert!(matches!(resolve_key("Enter"), Ok(Key::Return)));
        assert!(matches!(resolve_key("RETURN"), Ok(Key::Return)));
        assert!(matches!(resolve_key("f12"), Ok(Key::F12)));
    }

    #[test]
    fn unknown_identifiers_are_rejected() {
        assert!(resolve_key("not-a-key").is_err());
        assert!(resolve_key("").is_err());
    }
}
