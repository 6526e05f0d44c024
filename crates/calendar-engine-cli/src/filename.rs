//! File names for exported `.ics` documents.

/// Longest file stem kept from an event title, in characters.
pub const MAX_FILE_STEM_CHARS: usize = 80;

const FALLBACK_STEM: &str = "event";

/// Characters no common filesystem accepts in a file name.
const ILLEGAL: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Turn an event title into a safe `<stem>.ics` file name.
///
/// Illegal and control characters become `_`, whitespace runs collapse to a
/// single space, leading/trailing dots and spaces are dropped, and the stem is
/// capped at [`MAX_FILE_STEM_CHARS`].
pub fn ics_file_name(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    let mut prev_space = false;
    for ch in title.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                stem.push(' ');
            }
            prev_space = true;
            continue;
        }
        prev_space = false;
        if ch.is_control() || ILLEGAL.contains(&ch) {
            stem.push('_');
        } else {
            stem.push(ch);
        }
    }

    let stem: String = stem
        .trim_matches(|c: char| c == '.' || c == ' ')
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .collect();
    let stem = stem.trim_end_matches(|c: char| c == '.' || c == ' ');

    if stem.is_empty() {
        format!("{FALLBACK_STEM}.ics")
    } else {
        format!("{stem}.ics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_title() {
        assert_eq!(ics_file_name("Team sync"), "Team sync.ics");
    }

    #[test]
    fn test_illegal_characters_replaced() {
        assert_eq!(ics_file_name("Q&A: 1/2 <draft>?"), "Q&A_ 1_2 _draft__.ics");
    }

    #[test]
    fn test_whitespace_and_controls() {
        assert_eq!(ics_file_name("  a \n\t b\u{7}c  "), "a b_c.ics");
    }

    #[test]
    fn test_dots_trimmed() {
        assert_eq!(ics_file_name("..hidden.."), "hidden.ics");
    }

    #[test]
    fn test_length_capped_on_characters() {
        let name = ics_file_name(&"会".repeat(200));
        assert_eq!(name.chars().count(), MAX_FILE_STEM_CHARS + ".ics".len());
    }

    #[test]
    fn test_empty_falls_back() {
        assert_eq!(ics_file_name(""), "event.ics");
        assert_eq!(ics_file_name(" . "), "event.ics");
    }
}
