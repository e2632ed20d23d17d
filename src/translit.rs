//! Transliteration support for Chinese-character names.
//!
//! This module detects Han characters in name fields and converts them to
//! tone-marked Pinyin readings, so that the original text can be kept while
//! a Latin phonetic form is stored alongside it.

use pinyin::ToPinyin;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Check if a string contains at least one character in the CJK Unified
/// Ideographs block (U+4E00..=U+9FFF). Empty strings never match.
pub fn contains_han(s: &str) -> bool {
    s.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
}

/// Transliterate a string to tone-marked Pinyin, character by character.
///
/// Adjacent Han readings are separated by a single space; characters without
/// a reading (Latin text, punctuation, rare ideographs) pass through
/// unchanged and interrupt the syllable run.
pub fn to_latin(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_syllable = false;
    for c in s.chars() {
        match c.to_pinyin() {
            Some(p) => {
                if prev_was_syllable {
                    result.push(' ');
                }
                result.push_str(p.with_tone());
                prev_was_syllable = true;
            }
            None => {
                result.push(c);
                prev_was_syllable = false;
            }
        }
    }
    result
}

/// Remove combining diacritical marks (tone indicators) from a string,
/// leaving plain Latin letters. Idempotent; casing, spacing and character
/// order are preserved.
pub fn strip_tones(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_han() {
        assert!(!contains_han(""));
        assert!(!contains_han("John Doe"));
        assert!(!contains_han("José García"));
        assert!(!contains_han("Иван Петров")); // Cyrillic, not Han
        assert!(contains_han("王伟"));
        assert!(contains_han("John 王")); // Mixed
    }

    #[test]
    fn test_contains_han_block_boundaries() {
        assert!(contains_han("\u{4E00}"));
        assert!(contains_han("\u{9FFF}"));
        assert!(!contains_han("\u{4DFF}"));
        assert!(!contains_han("\u{A000}"));
    }

    #[test]
    fn test_to_latin_single_char() {
        assert_eq!(to_latin("伟"), "wěi");
        assert_eq!(to_latin("王"), "wáng");
    }

    #[test]
    fn test_to_latin_separates_syllables() {
        assert_eq!(to_latin("伟国"), "wěi guó");
        assert_eq!(to_latin("你好"), "nǐ hǎo");
    }

    #[test]
    fn test_to_latin_passthrough() {
        assert_eq!(to_latin(""), "");
        assert_eq!(to_latin("Anna"), "Anna");
        assert_eq!(to_latin("A伟B"), "AwěiB");
    }

    #[test]
    fn test_strip_tones() {
        assert_eq!(strip_tones("wěi"), "wei");
        assert_eq!(strip_tones("wáng wěi"), "wang wei");
        assert_eq!(strip_tones("yùchí"), "yuchi");
        assert_eq!(strip_tones("plain"), "plain");
    }

    #[test]
    fn test_strip_tones_idempotent() {
        for s in ["wěi", "zhǎngsūn", "Ānnà", "no tones at all"] {
            let once = strip_tones(s);
            assert_eq!(strip_tones(&once), once);
        }
    }

    #[test]
    fn test_strip_tones_leaves_no_combining_marks() {
        let stripped = strip_tones(&to_latin("伟"));
        assert!(stripped.chars().all(|c| !is_combining_mark(c)));
    }
}
