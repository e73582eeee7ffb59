use crate::error::{KeyFitError, KfResult};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyNameDefinition {
    pub code: String,
    pub label: String,
}

/// Immutable lookup from raw key identifiers (as recorded by the
/// monitoring service) to display names. Unknown codes pass through.
#[derive(Debug, Clone, Default)]
pub struct KeyNameRegistry {
    code_to_label: FnvHashMap<String, String>,
    label_to_code: FnvHashMap<String, String>,
}

const NAMED_KEYS: &[(&str, &str)] = &[
    // Whitespace / editing
    ("Space", "Space"),
    ("Return", "Enter"),
    ("Tab", "Tab"),
    ("Backspace", "BackSpace"),
    ("Delete", "Del"),
    ("Escape", "Esc"),
    ("Insert", "Ins"),
    // Modifiers
    ("ShiftLeft", "Shift(L)"),
    ("ShiftRight", "Shift(R)"),
    ("ControlLeft", "Ctrl(L)"),
    ("ControlRight", "Ctrl(R)"),
    ("Alt", "Alt/Opt(L)"),
    ("AltGr", "Alt/Opt(R)"),
    ("MetaLeft", "Win/Cmd(L)"),
    ("MetaRight", "Win/Cmd(R)"),
    ("CapsLock", "CapsLock"),
    ("Function", "Fn"),
    // Punctuation
    ("BackQuote", "`"),
    ("Minus", "-"),
    ("Equal", "="),
    ("LeftBracket", "["),
    ("RightBracket", "]"),
    ("BackSlash", "\\"),
    ("IntlBackslash", "\\(Intl)"),
    ("SemiColon", ";"),
    ("Quote", "'"),
    ("Comma", ","),
    ("Dot", "."),
    ("Slash", "/"),
    // Navigation
    ("UpArrow", "↑"),
    ("DownArrow", "↓"),
    ("LeftArrow", "←"),
    ("RightArrow", "→"),
    ("Home", "Home"),
    ("End", "End"),
    ("PageUp", "PgUp"),
    ("PageDown", "PgDn"),
    ("PrintScreen", "PrtSc"),
    ("ScrollLock", "ScrLk"),
    ("Pause", "Pause"),
    ("NumLock", "NumLock"),
    // Keypad
    ("KpReturn", "Num Enter"),
    ("KpMinus", "Num -"),
    ("KpPlus", "Num +"),
    ("KpMultiply", "Num *"),
    ("KpDivide", "Num /"),
    ("KpDelete", "Num Del"),
    // JIS (macOS virtual key codes reported as unknown)
    ("Unknown(93)", "¥"),
    ("Unknown(94)", "_"),
    ("Unknown(102)", "英数"),
    ("Unknown(104)", "かな"),
];

impl KeyNameRegistry {
    pub fn new_with_defaults() -> Self {
        let mut reg = Self::default();

        for c in 'A'..='Z' {
            reg.insert(&format!("Key{}", c), &c.to_string());
        }
        for d in 0..=9 {
            reg.insert(&format!("Num{}", d), &d.to_string());
            reg.insert(&format!("Kp{}", d), &format!("Num {}", d));
        }
        for f in 1..=12 {
            let name = format!("F{}", f);
            reg.insert(&name, &name);
        }
        for (code, label) in NAMED_KEYS {
            reg.insert(code, label);
        }

        reg
    }

    /// Built-in table extended (or overridden) by a JSON list of
    /// `{code, label}` pairs.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KfResult<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            KeyFitError::Config(format!("Failed to read key names file: {}", e))
        })?;

        let definitions: Vec<KeyNameDefinition> = serde_json::from_str(&content)?;

        let mut reg = Self::new_with_defaults();
        for def in &definitions {
            reg.insert(&def.code, &def.label);
        }
        Ok(reg)
    }

    fn insert(&mut self, code: &str, label: &str) {
        self.code_to_label.insert(code.to_string(), label.to_string());
        self.label_to_code
            .entry(label.to_uppercase())
            .or_insert_with(|| code.to_string());
    }

    /// Display name for `code`, or `code` itself when the table has no entry.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.code_to_label
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }

    /// Reverse lookup used when importing layouts that only carry legends.
    pub fn code_for_label(&self, label: &str) -> Option<&str> {
        self.label_to_code
            .get(&label.to_uppercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.code_to_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code_to_label.is_empty()
    }
}
