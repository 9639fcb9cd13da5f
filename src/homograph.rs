//! Homograph detection.
//!
//! Flags characters from scripts whose glyphs are commonly mistaken for
//! Latin letters. Classification is by Unicode code-point range: the main
//! block of each script plus the letters of the confusable scripts that are
//! scattered through shared blocks (phonetic extensions, supplementary
//! planes).

use serde::Serialize;

/// Scripts whose characters count as suspicious in a URL.
pub const SUSPICIOUS_SCRIPTS: &[&str] = &["CYRILLIC", "GREEK", "ARMENIAN", "GEORGIAN", "CHEROKEE"];

/// A single flagged character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspiciousChar {
    /// The character itself
    pub ch: char,
    /// Script name in upper case (e.g. "CYRILLIC")
    pub script: &'static str,
}

/// Outcome of a homograph scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HomographReport {
    /// Number of suspicious characters found
    pub count: usize,
    /// Each flagged character in order of appearance
    pub chars: Vec<SuspiciousChar>,
}

impl HomographReport {
    /// True when at least one suspicious character was found.
    pub fn is_suspicious(&self) -> bool {
        self.count > 0
    }

    /// The flagged characters as a plain string, in order.
    pub fn characters(&self) -> String {
        self.chars.iter().map(|c| c.ch).collect()
    }
}

/// Returns the script of a character, or `None` for code points outside the
/// blocks we classify.
pub fn script_name(ch: char) -> Option<&'static str> {
    let cp = ch as u32;
    let script = match cp {
        0x0000..=0x024F | 0x1E00..=0x1EFF | 0x2C60..=0x2C7F | 0xA720..=0xA7FF | 0xFF21..=0xFF5A => {
            "LATIN"
        }
        0x0370..=0x03FF
        | 0x1D26..=0x1D2A
        | 0x1D5D..=0x1D61
        | 0x1D66..=0x1D6A
        | 0x1DBF
        | 0x1F00..=0x1FFF
        | 0xAB65
        | 0x10140..=0x1018F
        | 0x1D200..=0x1D24F => "GREEK",
        0x0400..=0x052F
        | 0x1C80..=0x1C8F
        | 0x1D2B
        | 0x1D78
        | 0x2DE0..=0x2DFF
        | 0xA640..=0xA69F
        | 0x1E030..=0x1E08F => "CYRILLIC",
        0x0530..=0x058F | 0xFB13..=0xFB17 => "ARMENIAN",
        0x0590..=0x05FF | 0xFB1D..=0xFB4F => "HEBREW",
        0x0600..=0x06FF | 0x0750..=0x077F | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => "ARABIC",
        0x10A0..=0x10FF | 0x1C90..=0x1CBF | 0x2D00..=0x2D2F => "GEORGIAN",
        0x13A0..=0x13FF | 0xAB70..=0xABBF => "CHEROKEE",
        0x0E00..=0x0E7F => "THAI",
        0x3040..=0x309F => "HIRAGANA",
        0x30A0..=0x30FF => "KATAKANA",
        0xAC00..=0xD7AF | 0x1100..=0x11FF => "HANGUL",
        0x4E00..=0x9FFF | 0x3400..=0x4DBF => "CJK",
        _ => return None,
    };
    Some(script)
}

/// Whether a character belongs to one of [`SUSPICIOUS_SCRIPTS`].
pub fn is_suspicious_char(ch: char) -> bool {
    script_name(ch).is_some_and(|s| SUSPICIOUS_SCRIPTS.contains(&s))
}

/// Scans text for characters from confusable scripts.
///
/// Only characters whose script can be determined are considered; unknown
/// code points are skipped.
pub fn detect(text: &str) -> HomographReport {
    let chars: Vec<SuspiciousChar> = text
        .chars()
        .filter_map(|ch| {
            script_name(ch)
                .filter(|s| SUSPICIOUS_SCRIPTS.contains(s))
                .map(|script| SuspiciousChar { ch, script })
        })
        .collect();

    if !chars.is_empty() {
        log::debug!(
            "Found {} homograph character(s) in {}",
            chars.len(),
            text
        );
    }

    HomographReport {
        count: chars.len(),
        chars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_url_is_clean() {
        let report = detect("https://www.paypal.com/signin?x=1");
        assert_eq!(report.count, 0);
        assert!(!report.is_suspicious());
    }

    #[test]
    fn test_cyrillic_a_is_flagged() {
        // "аpple.com" with a Cyrillic 'а' (U+0430)
        let report = detect("http://\u{0430}pple.com");
        assert_eq!(report.count, 1);
        assert_eq!(report.chars[0].script, "CYRILLIC");
        assert_eq!(report.characters(), "\u{0430}");
    }

    #[test]
    fn test_mixed_scripts_counted() {
        // Greek omicron, Armenian o, Georgian letter, Cherokee letter
        let report = detect("g\u{03BF}\u{0585}gle\u{10D0}\u{13A0}");
        assert_eq!(report.count, 4);
        let scripts: Vec<_> = report.chars.iter().map(|c| c.script).collect();
        assert_eq!(scripts, vec!["GREEK", "ARMENIAN", "GEORGIAN", "CHEROKEE"]);
    }

    #[test]
    fn test_letters_outside_main_blocks_are_flagged() {
        let cases = [
            ('\u{1D2B}', "CYRILLIC"), // small capital el
            ('\u{1D78}', "CYRILLIC"), // modifier letter en
            ('\u{1E030}', "CYRILLIC"), // modifier letter small a
            ('\u{1D26}', "GREEK"),    // small capital gamma
            ('\u{1D67}', "GREEK"),    // subscript gamma
            ('\u{AB65}', "GREEK"),    // small capital omega
            ('\u{10140}', "GREEK"),   // acrophonic numeral
        ];
        for (ch, script) in cases {
            assert_eq!(script_name(ch), Some(script), "U+{:04X}", ch as u32);
            assert!(is_suspicious_char(ch), "U+{:04X}", ch as u32);
        }

        let report = detect("http://p\u{1D2B}ypal.com");
        assert_eq!(report.count, 1);
        assert_eq!(report.chars[0].script, "CYRILLIC");
    }

    #[test]
    fn test_latin_phonetic_letters_not_flagged() {
        // Latin small capital A and subscript i share the phonetic blocks
        assert!(!is_suspicious_char('\u{1D00}'));
        assert!(!is_suspicious_char('\u{1D62}'));
    }

    #[test]
    fn test_non_confusable_scripts_ignored() {
        // Han and Arabic are non-Latin but not on the confusable list
        assert_eq!(detect("http://\u{4E2D}\u{6587}.com").count, 0);
        assert_eq!(detect("http://\u{0645}\u{062B}\u{0627}\u{0644}.com").count, 0);
    }

    #[test]
    fn test_latin_accents_not_flagged() {
        assert_eq!(detect("http://caf\u{00E9}.fr").count, 0);
        assert_eq!(script_name('\u{00E9}'), Some("LATIN"));
    }

    #[test]
    fn test_unknown_code_points_skipped() {
        assert_eq!(script_name('\u{1F600}'), None);
        assert!(!is_suspicious_char('\u{1F600}'));
    }
}
