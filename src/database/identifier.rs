//! Identifier normalization and validate-then-quote helpers.
//!
//! Identifiers cannot be bound as statement parameters, so every table and
//! column name that reaches SQL text goes through [`quote`], which only accepts
//! names of the shape produced by [`normalize`].

use crate::database::SchemaError;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Name given to labels that normalize to nothing
pub const FALLBACK_NAME: &str = "column";
/// Synthetic identity column present in every created table
pub const IDENTITY: &str = "id";

static INVALID_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Hardcode regex pattern"));
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").expect("Hardcode regex pattern"));
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Hardcode regex pattern"));

/// Turns free header text into a safe identifier.
///
/// `"Precio (€)"` becomes `Precio`, `"2024 Ventas"` becomes `_2024_Ventas` and
/// an empty label becomes `column`.
pub fn normalize(label: &str) -> String {
    let ascii = transliterate(label);
    let replaced = INVALID_CHARACTERS.replace_all(&ascii, "_");
    let collapsed = UNDERSCORES.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_owned()
    } else {
        prefix_digit(trimmed)
    }
}

/// Prepends `_` to names starting with a digit
pub(crate) fn prefix_digit(name: &str) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name.to_owned()
    }
}

/// Approximates text in plain ASCII: accents are dropped after canonical
/// decomposition, a few ligatures are spelled out and everything else that is
/// not ASCII is removed.
fn transliterate(label: &str) -> String {
    let mut ascii = String::with_capacity(label.len());
    for character in label.nfkd() {
        if character.is_ascii() {
            ascii.push(character);
            continue;
        }
        if is_combining_mark(character) {
            continue;
        }
        let spelled = match character {
            'ß' => "ss",
            'æ' => "ae",
            'Æ' => "AE",
            'œ' => "oe",
            'Œ' => "OE",
            'ø' => "o",
            'Ø' => "O",
            'đ' => "d",
            'Đ' => "D",
            'ł' => "l",
            'Ł' => "L",
            'þ' => "th",
            'Þ' => "Th",
            _ => "",
        };
        ascii.push_str(spelled);
    }
    ascii
}

/// Returns true if the name can be quoted into SQL text
pub fn is_valid(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Validates an identifier and wraps it in double quotes
pub fn quote(name: &str) -> Result<String, SchemaError> {
    if is_valid(name) {
        Ok(format!("\"{name}\""))
    } else {
        Err(SchemaError::InvalidIdentifierError(name.to_owned()))
    }
}

/// Makes `name` unique among `taken` by appending `_1`, `_2`, …
///
/// DuckDB resolves identifiers case-insensitively, so collisions are too.
pub(crate) fn deduplicate<S: AsRef<str>>(name: &str, taken: &[S]) -> String {
    let collides = |candidate: &str| {
        candidate.eq_ignore_ascii_case(IDENTITY)
            || taken.iter().any(|existing| existing.as_ref().eq_ignore_ascii_case(candidate))
    };
    let mut candidate = name.to_owned();
    let mut suffix = 1usize;
    while collides(&candidate) {
        candidate = format!("{name}_{suffix}");
        suffix += 1;
    }
    candidate
}
