//! String transformation utilities for code generation
//!
//! The casing rules here are deliberately literal: they only look at `_` and
//! at upper-case letters, so they can be inverted by each other.

// External imports (alphabetized)
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Convert a snake_case string to camelCase.
///
/// The first character is lower-cased and every `_x` becomes `X`.
pub fn snake_to_camel(input: &str) -> String {
    join_snake(input, false)
}

/// Convert a snake_case string to PascalCase.
///
/// Same rule as [`snake_to_camel`] except the first character is upper-cased.
pub fn snake_to_pascal(input: &str) -> String {
    join_snake(input, true)
}

fn join_snake(input: &str, upper_first: bool) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return output;
    };
    if upper_first {
        output.extend(first.to_uppercase());
    } else {
        output.extend(first.to_lowercase());
    }

    let mut upper_next = false;
    for ch in chars {
        if upper_next {
            output.extend(ch.to_uppercase());
            upper_next = false;
        } else if ch == '_' {
            upper_next = true;
        } else {
            output.push(ch);
        }
    }
    output
}

/// Convert a camelCase or PascalCase string to snake_case.
///
/// Inserts `_` before every upper-case letter except at position 0 and
/// lower-cases it. Every other character is kept as is.
pub fn camel_to_snake(input: &str) -> String {
    let mut output = String::with_capacity(input.len() + 4);
    for (i, ch) in input.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                output.push('_');
            }
            output.extend(ch.to_lowercase());
        } else {
            output.push(ch);
        }
    }
    output
}

/// Lower-case only the first character.
pub fn pascal_to_camel(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Upper-case only the first character.
pub fn camel_to_pascal(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Collapse line breaks into single spaces for one-line doc text.
pub fn strip_newlines(input: &str) -> String {
    input.replace("\r\n", " ").replace('\n', " ")
}

static RUST_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
        "move", "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "try",
        "type", "unsafe", "use", "where", "while", "yield", "abstract", "become", "do",
        "final", "macro", "override", "priv", "typeof", "unsized", "virtual", "gen",
    ]
    .into_iter()
    .collect()
});

/// Keywords that cannot be written as raw identifiers.
const NON_RAW_KEYWORDS: [&str; 4] = ["self", "Self", "super", "crate"];

/// Turn an arbitrary wire key into a valid Rust value identifier
/// (field, parameter or method name).
///
/// Characters outside `[A-Za-z0-9_]` become `_`, a leading digit gets a `_`
/// prefix and keywords are escaped as raw identifiers.
pub fn rust_ident(input: &str) -> String {
    let mut ident: String = input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() {
        return "_unnamed".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    } else if RUST_KEYWORDS.contains(ident.as_str()) {
        ident.insert_str(0, "r#");
    }
    ident
}

/// Turn an enum literal into a PascalCase variant name.
///
/// ALL-CAPS literals such as `ANDROID_DEVICE` are lower-cased first so the
/// result is `AndroidDevice` rather than `ANDROIDDEVICE`.
pub fn enum_variant_name(literal: &str) -> String {
    let normalized = if literal.chars().any(char::is_lowercase) {
        literal.to_string()
    } else {
        literal.to_lowercase()
    };
    let sanitized: String = normalized
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let name = snake_to_pascal(&sanitized);
    match name.chars().next() {
        None => "Unnamed".to_string(),
        Some(c) if c.is_ascii_digit() => format!("V{}", name),
        Some(_) if name == "Self" => "Self_".to_string(),
        Some(_) => name,
    }
}
