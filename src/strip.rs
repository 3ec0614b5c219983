//! Entity stripping: recover a serial-number search key from raw message
//! text by removing mention and tag spans.

use crate::message::Span;

/// The key a sender uses to say their bike has no serial number. Messages
/// reducing to this skip the lookup entirely.
pub const NO_SERIAL_SENTINEL: &str = "absent";

/// Remove every span from `text` and trim the result.
///
/// Spans are expressed against the original text, so removal is computed in
/// one pass: mark the characters covered by any span, keep the rest. This
/// stays correct for any number of spans in any order, including overlapping
/// ones. Out-of-range spans are clamped, inverted spans ignored.
pub fn strip_entities(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut keep = vec![true; chars.len()];

    for span in spans {
        let start = span.start.min(chars.len());
        let end = span.end.min(chars.len());
        if start >= end {
            continue;
        }
        for flag in &mut keep[start..end] {
            *flag = false;
        }
    }

    let stripped: String = chars
        .iter()
        .zip(&keep)
        .filter_map(|(c, &kept)| kept.then_some(*c))
        .collect();
    stripped.trim().to_string()
}

/// True if the search key, case-insensitively, is the no-serial sentinel.
pub fn is_absent(key: &str) -> bool {
    key.eq_ignore_ascii_case(NO_SERIAL_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SpanKind;

    fn mention(start: usize, end: usize) -> Span {
        Span::new(start, end, SpanKind::Mention)
    }

    fn tag(start: usize, end: usize) -> Span {
        Span::new(start, end, SpanKind::Tag)
    }

    #[test]
    fn no_spans_returns_trimmed_original() {
        assert_eq!(strip_entities("  XJ12345  ", &[]), "XJ12345");
    }

    #[test]
    fn leading_mention_leaves_suffix() {
        // "@isitstolen XJ12345" — mention covers [0, 11)
        let text = "@isitstolen XJ12345";
        assert_eq!(strip_entities(text, &[mention(0, 11)]), "XJ12345");
    }

    #[test]
    fn trailing_mention_leaves_prefix() {
        let text = "XJ12345 @isitstolen";
        assert_eq!(strip_entities(text, &[mention(8, 19)]), "XJ12345");
    }

    #[test]
    fn mention_and_tag_both_removed() {
        // Spans in ascending order — the legacy sequential splice corrupted
        // this case; the one-pass removal does not.
        let text = "@isitstolen XJ12345 #stolen";
        let spans = [mention(0, 11), tag(20, 27)];
        assert_eq!(strip_entities(text, &spans), "XJ12345");
    }

    #[test]
    fn spans_in_any_order() {
        let text = "@isitstolen XJ12345 #stolen";
        let spans = [tag(20, 27), mention(0, 11)];
        assert_eq!(strip_entities(text, &spans), "XJ12345");
    }

    #[test]
    fn overlapping_spans_remove_union() {
        let text = "abcdefgh";
        let spans = [mention(0, 4), mention(2, 6)];
        assert_eq!(strip_entities(text, &spans), "gh");
    }

    #[test]
    fn out_of_range_span_is_clamped() {
        let text = "short";
        assert_eq!(strip_entities(text, &[mention(3, 999)]), "sho");
    }

    #[test]
    fn inverted_span_is_ignored() {
        let text = "XJ12345";
        assert_eq!(strip_entities(text, &[mention(5, 2)]), "XJ12345");
    }

    #[test]
    fn multibyte_text_uses_character_offsets() {
        // Mention covers the first 5 characters, not bytes.
        let text = "@vélo XJ12345";
        assert_eq!(strip_entities(text, &[mention(0, 5)]), "XJ12345");
    }

    #[test]
    fn absent_sentinel_is_case_insensitive() {
        assert!(is_absent("absent"));
        assert!(is_absent("ABSENT"));
        assert!(is_absent("Absent"));
        assert!(!is_absent("absentee"));
        assert!(!is_absent(""));
    }
}
