//! Surname-specific Pinyin resolution.
//!
//! Mandarin surnames are a closed set, but a number of them are read
//! differently as a family name than in common vocabulary (单 is "shàn" as a
//! surname, "dān" elsewhere). A curated override table carries the correct
//! readings for these, including compound two-character surnames that must be
//! matched as a whole. Everything else falls back to the general
//! transliterator.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::translit;

/// Irregular surname readings, keyed by the exact family-name string.
/// Compound surnames are first-class keys; they are never decomposed into
/// per-character readings.
const SURNAME_READINGS: &[(&str, &str)] = &[
    ("柏", "bǎi"),
    ("鲍", "bào"),
    ("贲", "bēn"),
    ("秘", "bì"),
    ("薄", "bó"),
    ("卜", "bǔ"),
    ("岑", "cén"),
    ("晁", "cháo"),
    ("谌", "chén"),
    ("种", "chóng"),
    ("褚", "chǔ"),
    ("啜", "chuài"),
    ("单", "shàn"),
    ("郗", "xī"),
    ("邸", "dǐ"),
    ("都", "dū"),
    ("缪", "miào"),
    ("宓", "mì"),
    ("费", "fèi"),
    ("苻", "fú"),
    ("睢", "suī"),
    ("区", "ōu"),
    ("华", "huà"),
    ("庞", "páng"),
    ("查", "zhā"),
    ("佘", "shé"),
    ("仇", "qiú"),
    ("靳", "jìn"),
    ("解", "xiè"),
    ("繁", "pó"),
    ("折", "shé"),
    ("员", "yùn"),
    ("祭", "zhài"),
    ("芮", "ruì"),
    ("覃", "qín"),
    ("牟", "móu"),
    ("蕃", "pó"),
    ("戚", "qī"),
    ("瞿", "qú"),
    ("冼", "xiǎn"),
    ("洗", "xiǎn"),
    ("郤", "xì"),
    ("庹", "tuǒ"),
    ("彤", "tóng"),
    ("佟", "tóng"),
    ("妫", "guī"),
    ("句", "gōu"),
    ("郝", "hǎo"),
    ("曾", "zēng"),
    ("乐", "yuè"),
    ("蔺", "lìn"),
    ("隽", "juàn"),
    ("臧", "zāng"),
    ("庾", "yǔ"),
    ("詹", "zhān"),
    ("禚", "zhuó"),
    ("迮", "zé"),
    ("沈", "shěn"),
    ("沉", "shěn"),
    ("尉", "yù"),
    ("尉迟", "yùchí"),
    ("长孙", "zhǎngsūn"),
    ("中行", "zhōngháng"),
    ("万俟", "mòqí"),
    ("单于", "chányú"),
];

static OVERRIDES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SURNAME_READINGS.iter().copied().collect());

/// Resolve the Pinyin reading of a family name.
///
/// The override table is consulted first with an exact whole-string match;
/// anything not listed there goes through [`translit::to_latin`]. An empty
/// string resolves to an empty string.
pub fn resolve_family_name(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    match OVERRIDES.get(s) {
        Some(reading) => (*reading).to_string(),
        None => translit::to_latin(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_keys_resolve_to_stored_value() {
        for (key, value) in SURNAME_READINGS {
            assert_eq!(resolve_family_name(key), *value, "override for {key}");
        }
    }

    #[test]
    fn test_surname_reading_beats_common_reading() {
        // 单 is read "dān" in common vocabulary
        assert_eq!(resolve_family_name("单"), "shàn");
        assert_ne!(resolve_family_name("单"), translit::to_latin("单"));
    }

    #[test]
    fn test_compound_surname_matches_whole_string() {
        assert_eq!(resolve_family_name("长孙"), "zhǎngsūn");
        assert_eq!(resolve_family_name("单于"), "chányú");
        // Never assembled from per-character readings
        assert_ne!(resolve_family_name("长孙"), translit::to_latin("长孙"));
    }

    #[test]
    fn test_fallback_to_base_transliterator() {
        assert_eq!(resolve_family_name("王"), translit::to_latin("王"));
        assert_eq!(resolve_family_name("王"), "wáng");
        // Not a surname at all: still the base reading
        assert_eq!(resolve_family_name("Smith"), translit::to_latin("Smith"));
    }

    #[test]
    fn test_empty_family_name() {
        assert_eq!(resolve_family_name(""), "");
    }

    #[test]
    fn test_table_keys_are_han() {
        for (key, _) in SURNAME_READINGS {
            assert!(translit::contains_han(key), "non-Han key {key}");
        }
    }
}
