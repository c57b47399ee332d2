use crate::language::Language;

const HEADING_MARKER: &str = "==";

/// Returns the 1-based ordinal of the heading that opens `language`'s section.
///
/// Every line starting with `==` counts, whichever language it belongs to, so the
/// result is directly usable as the parse API's `section` parameter. Headings are
/// compared with all whitespace removed, and only exact matches count.
pub fn locate(text: &str, language: Language) -> Option<u32> {
    let mut ordinal = 0u32;
    for line in text.split('\n') {
        if !line.starts_with(HEADING_MARKER) {
            continue;
        }
        ordinal += 1;
        let normalized = strip_whitespace(line);
        if language
            .headings()
            .iter()
            .any(|heading| strip_whitespace(heading) == normalized)
        {
            return Some(ordinal);
        }
    }
    None
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_heading() {
        let text = "==English==\n===Noun===\nfoo";
        assert_eq!(locate(text, Language::EnEn), Some(1));
    }

    #[test]
    fn counts_unrelated_headings() {
        let text = "==Chinese==\nx\n===Etymology===\ny\n==English==\nz";
        assert_eq!(locate(text, Language::EnEn), Some(3));
    }

    #[test]
    fn returns_none_without_match() {
        let text = "==Chinese==\n==German==\nplain text";
        assert_eq!(locate(text, Language::EnKo), None);
    }

    #[test]
    fn empty_text_has_no_section() {
        assert_eq!(locate("", Language::EnEn), None);
    }

    #[test]
    fn ignores_whitespace() {
        assert_eq!(locate("== Korean ==  ", Language::EnKo), Some(1));
        assert_eq!(locate("==Korean==", Language::EnKo), Some(1));
        assert_eq!(locate("==\tKorean\t==\r", Language::EnKo), Some(1));
    }

    #[test]
    fn no_prefix_match() {
        assert_eq!(locate("=={{kor-extended}}==", Language::JaKo), None);
        assert_eq!(locate("==Koreanic==", Language::EnKo), None);
    }

    #[test]
    fn alternate_headings_match() {
        let text = "=={{ja}}==\nfoo\n=={{kor}}==\nbar";
        assert_eq!(locate(text, Language::JaKo), Some(2));
        assert_eq!(locate("==朝鮮語==", Language::JaKo), Some(1));
    }

    #[test]
    fn both_kor_kr_spellings_match() {
        assert_eq!(locate("==x==\n=={{kor-KR}}==", Language::JaKo), Some(2));
        assert_eq!(locate("==x==\n=={{kor-KR}==", Language::JaKo), Some(2));
    }

    #[test]
    fn heading_must_start_the_line() {
        let text = "see ==English== inline\n==English==";
        assert_eq!(locate(text, Language::EnEn), Some(1));
    }

    #[test]
    fn ordinal_within_heading_count_and_deterministic() {
        let text = "==A==\n==B==\n==C==\n==German==\n==E==";
        let first = locate(text, Language::EnDe);
        assert_eq!(first, Some(4));
        assert_eq!(locate(text, Language::EnDe), first);
        let headings = text.lines().filter(|l| l.starts_with("==")).count() as u32;
        assert!((1..=headings).contains(&first.unwrap()));
    }

    #[test]
    fn first_match_wins() {
        let text = "==Spanish==\n==Spanish==";
        assert_eq!(locate(text, Language::EnEs), Some(1));
    }
}
