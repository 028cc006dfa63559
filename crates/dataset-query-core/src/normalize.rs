//! Text normalization strategies.
//!
//! Two strictness levels exist. Substring matching against accented free
//! text needs diacritic folding, while keyword comparison only needs case
//! and whitespace insensitivity. Callers pick one via [`Normalization`].
//!
//! Both strategies are pure, total, and idempotent:
//! `s.apply(&s.apply(x)) == s.apply(x)` for every input.

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Base letter → every lowercase precomposed Vietnamese variant that folds onto it.
const FOLD_TABLE: &[(char, &str)] = &[
    ('a', "àáạảãâầấậẩẫăằắặẳẵ"),
    ('e', "èéẹẻẽêềếệểễ"),
    ('i', "ìíịỉĩ"),
    ('o', "òóọỏõôồốộổỗơờớợởỡ"),
    ('u', "ùúụủũưừứựửữ"),
    ('y', "ỳýỵỷỹ"),
    ('d', "đ"),
];

/// A named normalization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Lowercase, fold Vietnamese diacritics to base letters, drop every
    /// non-alphanumeric character (spaces and punctuation included).
    DiacriticFolding,
    /// Lowercase and remove whitespace. Accents and symbols are kept.
    WhitespaceOnly,
}

impl Normalization {
    /// Normalizes a string with this strategy.
    pub fn apply(&self, input: &str) -> String {
        match self {
            Normalization::DiacriticFolding => fold_diacritics(input),
            Normalization::WhitespaceOnly => strip_whitespace(input),
        }
    }

    /// Normalizes a JSON value, stringifying non-string values first.
    ///
    /// `null` normalizes to the empty string.
    pub fn apply_value(&self, value: &Value) -> String {
        self.apply(&value_text(value))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Normalization::DiacriticFolding => "diacritic_folding",
            Normalization::WhitespaceOnly => "whitespace_only",
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Textual form of a JSON value as used for matching.
///
/// Strings are taken verbatim, numbers in decimal form, booleans as
/// `true`/`false`, and arrays/objects as compact JSON.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

fn fold_diacritics(input: &str) -> String {
    // Dropping a symbol can bring two composable characters together
    // (`\u{1100}!\u{1161}`), so repeat until composition has nothing left.
    let mut current = fold_pass(&input.to_lowercase());
    loop {
        let next = fold_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn fold_pass(input: &str) -> String {
    input
        .nfc()
        .map(fold_char)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c;
    }
    FOLD_TABLE
        .iter()
        .find(|(_, variants)| variants.contains(c))
        .map(|(base, _)| *base)
        .unwrap_or(c)
}

fn strip_whitespace(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
