//! Phonetic-reading helpers for imported names.
//!
//! A name written only in katakana has no separate reading on the catalog
//! site, so its reading is derived by transliterating the name itself into
//! hiragana. The middle dot used between given and family names is dropped
//! first.

use crate::models::NamePart;

const MIDDLE_DOT: char = '・';

pub fn remove_middle_dot(value: &str) -> String {
    value.chars().filter(|c| *c != MIDDLE_DOT).collect()
}

/// True when `value` is non-empty and every char is katakana
/// (U+30A0..=U+30FF, which includes the long vowel mark, or the
/// phonetic extensions U+31F0..=U+31FF).
pub fn is_katakana_only(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| matches!(c, '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}'))
}

/// Shift ァ..=ヶ down to ぁ..=ゖ; everything else passes through.
pub fn katakana_to_hiragana(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Overwrite the reading of a katakana-only name with its hiragana form.
pub fn derive_reading(part: NamePart) -> NamePart {
    let without_dot = remove_middle_dot(&part.name);
    if !is_katakana_only(&without_dot) {
        return part;
    }
    NamePart {
        ruby: katakana_to_hiragana(&without_dot),
        ..part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, ruby: &str) -> NamePart {
        NamePart {
            name: name.to_string(),
            ruby: ruby.to_string(),
        }
    }

    #[test]
    fn test_katakana_detection() {
        assert!(is_katakana_only("サッカー"));
        assert!(is_katakana_only("ㇰ"));
        assert!(!is_katakana_only(""));
        assert!(!is_katakana_only("円堂"));
        assert!(!is_katakana_only("ゴールキーパー1"));
    }

    #[test]
    fn test_hiragana_shift() {
        assert_eq!(katakana_to_hiragana("イナズマ"), "いなずま");
        assert_eq!(katakana_to_hiragana("ヴァ"), "ゔぁ");
        // long vowel mark has no hiragana form
        assert_eq!(katakana_to_hiragana("サッカー"), "さっかー");
        assert_eq!(katakana_to_hiragana("abc"), "abc");
    }

    #[test]
    fn test_derive_reading_overwrites_katakana_names() {
        let derived = derive_reading(part("フィディオ・アルデナ", ""));
        assert_eq!(derived.name, "フィディオ・アルデナ");
        assert_eq!(derived.ruby, "ふぃでぃおあるでな");
    }

    #[test]
    fn test_derive_reading_leaves_other_names() {
        let kanji = part("円堂", "えんどう");
        assert_eq!(derive_reading(kanji.clone()), kanji);

        let dots_only = part("・", "x");
        assert_eq!(derive_reading(dots_only.clone()), dots_only);
    }
}
