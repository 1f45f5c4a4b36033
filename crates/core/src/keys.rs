// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyboard event descriptors for `Input.dispatchKeyEvent`.
//!
//! Named keys map to the `{key, code, windowsVirtualKeyCode}` triple the
//! browser expects. Keys that produce characters also carry `text` so the
//! page sees a full keydown/keypress/keyup cycle — Enter in particular must
//! deliver `"\r"` or form submission handlers never fire.

/// Modifier bitmask values for key and mouse events.
pub const MODIFIER_ALT: u32 = 1;
pub const MODIFIER_CTRL: u32 = 2;
pub const MODIFIER_META: u32 = 4;
pub const MODIFIER_SHIFT: u32 = 8;

/// Descriptor for one dispatchable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub code: String,
    pub windows_virtual_key_code: i64,
    /// Character payload for keys that type something.
    pub text: Option<String>,
}

/// Combine modifier flags into the protocol bitmask.
pub fn modifier_mask(alt: bool, ctrl: bool, meta: bool, shift: bool) -> u32 {
    let mut mask = 0;
    if alt {
        mask |= MODIFIER_ALT;
    }
    if ctrl {
        mask |= MODIFIER_CTRL;
    }
    if meta {
        mask |= MODIFIER_META;
    }
    if shift {
        mask |= MODIFIER_SHIFT;
    }
    mask
}

const NAMED: &[(&str, &str, i64, Option<&str>)] = &[
    ("Enter", "Enter", 13, Some("\r")),
    ("Tab", "Tab", 9, None),
    ("Escape", "Escape", 27, None),
    ("Backspace", "Backspace", 8, None),
    ("Delete", "Delete", 46, None),
    ("ArrowUp", "ArrowUp", 38, None),
    ("ArrowDown", "ArrowDown", 40, None),
    ("ArrowLeft", "ArrowLeft", 37, None),
    ("ArrowRight", "ArrowRight", 39, None),
    ("Home", "Home", 36, None),
    ("End", "End", 35, None),
    ("PageUp", "PageUp", 33, None),
    ("PageDown", "PageDown", 34, None),
    ("Space", "Space", 32, Some(" ")),
];

/// Resolve a key name to its descriptor.
///
/// Named keys match case-insensitively. A single character falls back to a
/// synthesized descriptor whose virtual key code is the uppercased ASCII
/// value, which is what the browser reports for real keyboards.
pub fn lookup(name: &str) -> Option<KeyEvent> {
    for (key, code, vk, text) in NAMED {
        if key.eq_ignore_ascii_case(name) {
            return Some(KeyEvent {
                key: if *key == "Space" { " ".to_string() } else { (*key).to_string() },
                code: (*code).to_string(),
                windows_virtual_key_code: *vk,
                text: text.map(str::to_string),
            });
        }
    }

    let mut chars = name.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let upper = c.to_ascii_uppercase();
    let code = if c.is_ascii_alphabetic() {
        format!("Key{upper}")
    } else if c.is_ascii_digit() {
        format!("Digit{c}")
    } else {
        String::new()
    };
    Some(KeyEvent {
        key: c.to_string(),
        code,
        windows_virtual_key_code: upper as i64,
        text: Some(c.to_string()),
    })
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
