use crate::geometry::{KeyDefinition, LayoutDefinition, LayoutMeta, LayoutVariant};

fn k(code: &str, label: &str) -> KeyDefinition {
    KeyDefinition::new(code, label)
}

fn gap() -> KeyDefinition {
    KeyDefinition::placeholder()
}

fn letters(s: &str) -> Vec<KeyDefinition> {
    s.chars()
        .map(|c| k(&format!("Key{}", c), &c.to_string()))
        .collect()
}

fn digits() -> Vec<KeyDefinition> {
    "1234567890"
        .chars()
        .map(|c| k(&format!("Num{}", c), &c.to_string()))
        .collect()
}

fn function_row() -> Vec<KeyDefinition> {
    let mut row = vec![k("Escape", "Esc"), gap()];
    for f in 1..=12 {
        let name = format!("F{}", f);
        let key = k(&name, &name);
        // Half-unit gaps between the F1-F4 / F5-F8 / F9-F12 blocks.
        row.push(if f == 5 || f == 9 { key.offset(0.5) } else { key });
    }
    row
}

pub fn builtin(variant: LayoutVariant) -> LayoutDefinition {
    match variant {
        LayoutVariant::Jp => jis(),
        LayoutVariant::Us => ansi(),
    }
}

fn ansi() -> LayoutDefinition {
    let mut number_row = vec![k("BackQuote", "`")];
    number_row.extend(digits());
    number_row.extend([k("Minus", "-"), k("Equal", "="), k("Backspace", "BS").wide(2.0)]);

    let mut top_row = vec![k("Tab", "Tab").wide(1.5)];
    let mut top_letters = letters("QWERTYUIOP");
    top_letters[0] = top_letters[0].clone().offset(0.5);
    top_row.extend(top_letters);
    top_row.extend([
        k("LeftBracket", "["),
        k("RightBracket", "]"),
        k("BackSlash", "\\").wide(1.5),
    ]);

    let mut home_row = vec![k("CapsLock", "Caps").wide(1.75)];
    let mut home_letters = letters("ASDFGHJKL");
    home_letters[0] = home_letters[0].clone().offset(0.75);
    home_row.extend(home_letters);
    home_row.extend([
        k("SemiColon", ";"),
        k("Quote", "'"),
        k("Return", "Enter").wide(2.25),
    ]);

    let mut bottom_row = vec![k("ShiftLeft", "Shift").wide(2.25)];
    let mut bottom_letters = letters("ZXCVBNM");
    bottom_letters[0] = bottom_letters[0].clone().offset(1.25);
    bottom_row.extend(bottom_letters);
    bottom_row.extend([
        k("Comma", ","),
        k("Dot", "."),
        k("Slash", "/"),
        k("ShiftRight", "Shift").wide(2.75),
    ]);

    let modifier_row = vec![
        k("ControlLeft", "Ctrl").wide(1.25),
        k("MetaLeft", "Win").offset(0.25).wide(1.25),
        k("Alt", "Alt").offset(0.25).wide(1.25),
        k("Space", "Space").offset(0.25).wide(6.25),
        k("AltGr", "AltGr").offset(5.25).wide(1.25),
        k("MetaRight", "Win").offset(0.25).wide(1.25),
        k("Function", "Fn").offset(0.25).wide(1.25),
        k("ControlRight", "Ctrl").offset(0.25).wide(1.25),
    ];

    LayoutDefinition {
        meta: LayoutMeta {
            name: "US".to_string(),
            notes: "ANSI 60% with function row".to_string(),
            ..Default::default()
        },
        rows: vec![
            function_row(),
            number_row,
            top_row,
            home_row,
            bottom_row,
            modifier_row,
        ],
    }
}

fn jis() -> LayoutDefinition {
    let mut number_row = vec![k("BackQuote", "半/全")];
    number_row.extend(digits());
    number_row.extend([
        k("Minus", "-"),
        k("Equal", "^"),
        k("Unknown(93)", "¥"),
        k("Backspace", "BS"),
    ]);

    let mut top_row = vec![k("Tab", "Tab").wide(1.5)];
    let mut top_letters = letters("QWERTYUIOP");
    top_letters[0] = top_letters[0].clone().offset(0.5);
    top_row.extend(top_letters);
    top_row.extend([
        k("LeftBracket", "@"),
        k("RightBracket", "["),
        // Spans the home row as well.
        k("Return", "Enter").offset(0.25).wide(1.25).tall(2.0),
    ]);

    let mut home_row = vec![k("CapsLock", "Caps").wide(1.75)];
    let mut home_letters = letters("ASDFGHJKL");
    home_letters[0] = home_letters[0].clone().offset(0.75);
    home_row.extend(home_letters);
    home_row.extend([k("SemiColon", ";"), k("Quote", ":"), k("BackSlash", "]")]);

    let mut bottom_row = vec![k("ShiftLeft", "Shift").wide(2.25)];
    let mut bottom_letters = letters("ZXCVBNM");
    bottom_letters[0] = bottom_letters[0].clone().offset(1.25);
    bottom_row.extend(bottom_letters);
    bottom_row.extend([
        k("Comma", ","),
        k("Dot", "."),
        k("Slash", "/"),
        k("Unknown(94)", "_"),
        k("ShiftRight", "Shift").wide(1.75),
    ]);

    let modifier_row = vec![
        k("ControlLeft", "Ctrl").wide(1.25),
        k("Alt", "Opt").offset(0.25).wide(1.25),
        k("MetaLeft", "Cmd").offset(0.25).wide(1.25),
        k("Unknown(102)", "英数").offset(0.25).wide(1.25),
        k("Space", "Space").offset(0.25).wide(4.5),
        k("Unknown(104)", "かな").offset(3.5).wide(1.25),
        k("MetaRight", "Cmd").offset(0.25).wide(1.25),
        k("Function", "Fn").offset(0.25),
    ];

    LayoutDefinition {
        meta: LayoutMeta {
            name: "JP".to_string(),
            notes: "JIS (macOS) with function row".to_string(),
            ..Default::default()
        },
        rows: vec![
            function_row(),
            number_row,
            top_row,
            home_row,
            bottom_row,
            modifier_row,
        ],
    }
}
