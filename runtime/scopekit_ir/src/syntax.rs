//! Name syntax: which names print bare and how the rest are escaped.
//!
//! Binding tables accept any text as a name. Only display cares whether a
//! name is syntactic; non-syntactic names are wrapped in backticks.

/// Words the modelled language reserves. They can still be bound, but only
/// through the backtick escape.
pub const RESERVED_WORDS: &[&str] = &[
    "if", "else", "repeat", "while", "function", "for", "in", "next", "break", "TRUE", "FALSE",
    "NULL", "Inf", "NaN", "NA", "...",
];

/// Whether `name` is one of [`RESERVED_WORDS`].
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Whether `name` can be written without escaping.
///
/// Syntactic names start with a letter, or with `.` not followed by a digit,
/// continue with letters, digits, `.` or `_`, and are not reserved.
pub fn is_syntactic_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let head_ok = match first {
        '.' => !name[1..].starts_with(|c: char| c.is_ascii_digit()),
        c => c.is_alphabetic(),
    };
    head_ok
        && chars.all(|c| c.is_alphanumeric() || c == '.' || c == '_')
        && !is_reserved_word(name)
}

/// Render `name` for display, backtick-escaping it when it is not syntactic.
///
/// Inside backticks, `` ` `` and `\` are escaped with a backslash.
pub fn quote_name(name: &str) -> String {
    if is_syntactic_name(name) {
        return name.to_owned();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for c in name.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('`');
    out
}
