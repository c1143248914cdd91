//! Devanagari cleanup for recognized Hindi text.
//!
//! Re-attaches dependent vowel signs that recognition split off their base letter
//! and strips punctuation noise that is neither a word character nor Devanagari.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// Dependent vowel signs, virama and nukta-range signs (0x093E..=0x094F)
// plus candrabindu, anusvara and visarga (0x0901..=0x0903).
static DETACHED_SIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([\x{093E}-\x{094F}\x{0901}-\x{0903}])").expect("static regex"));

static LEADING_JUNK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\w\x{0900}-\x{097F}]+").expect("static regex"));

static INNER_JUNK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\x{0900}-\x{097F}\s\-/]+").expect("static regex"));

/// Joins a vowel sign that recognition separated from its consonant by whitespace.
///
/// Example: "क ु मार" -> "कुमार"
pub fn join_detached_signs(text: &str) -> String {
    DETACHED_SIGN_RE.replace_all(text, "$1").into_owned()
}

/// Strips leading punctuation and any character outside word, Devanagari,
/// whitespace, `-` and `/`.
pub fn clean_value(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = LEADING_JUNK_RE.replace(text, "");
    let text = INNER_JUNK_RE.replace_all(&text, "");
    text.trim().to_string()
}

/// Full cleanup applied to captured name fields.
pub fn clean_script_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let normalized = text.nfc().collect::<String>();
    clean_value(&join_detached_signs(&normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn joins_detached_vowel_signs() {
        assert_eq!(join_detached_signs("क ु मार"), "कुमार");
        assert_eq!(join_detached_signs("र ा म"), "रा म");
    }

    #[test]
    fn keeps_word_spacing() {
        assert_eq!(clean_script_text("राम कुमार"), "राम कुमार");
        assert_eq!(clean_script_text("Ram Kumar"), "Ram Kumar");
    }

    #[test]
    fn strips_punctuation_noise() {
        assert_eq!(clean_value(":- रामपुर |"), "रामपुर");
        assert_eq!(clean_value("'श्याम\""), "श्याम");
        assert_eq!(clean_value("12/4-ए"), "12/4-ए");
    }
}
