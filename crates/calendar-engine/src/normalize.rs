//! Text normalization applied to every date/time string before matching.
//!
//! Extracted event times arrive in whatever shape the source page used:
//! full-width digits, typographic dashes, `+0900` offsets, Japanese
//! `10時30分` clock markers, trailing `JST` labels. [`normalize_input`]
//! rewrites all of these into the small ASCII vocabulary the pattern table
//! in [`crate::parser`] understands.
//!
//! # Pipeline
//!
//! 1. Trim, then fold full-width digits, `：`, `／`, `＋`, brackets and dash
//!    glyphs to ASCII.
//! 2. Collapse whitespace runs to a single space.
//! 3. Insert the missing colon in a trailing offset (`+0900` → `+09:00`).
//! 4. Rewrite Japanese clock markers (`10時30分` → `10:30`, `10時` → `10:00`,
//!    `10時半` → `10:30`) and drop stray `分`/`秒`.
//! 5. Strip `JST` (any case, standalone) and `日本時間`, then drop bracket pairs
//!    left empty (`10:00 (JST)` → `10:00`).
//!
//! The pipeline is re-applied until its output stops changing, so the result
//! is always a fixed point: normalizing normalized text is a no-op.

/// Dash glyphs folded to ASCII `-`.
const DASHES: &[char] = &[
    '\u{2010}', // hyphen
    '\u{2011}', // non-breaking hyphen
    '\u{2012}', // figure dash
    '\u{2013}', // en dash
    '\u{2014}', // em dash
    '\u{2015}', // horizontal bar
    '\u{2212}', // minus sign
    '\u{FE63}', // small hyphen-minus
    '\u{FF0D}', // full-width hyphen-minus
];

/// Zone labels that carry no information beyond the offset (or local zone)
/// already in effect.
const ZONE_LABEL_JA: &str = "日本時間";
const ZONE_LABEL_JST: &str = "jst";

/// Normalize a loosely formatted date/time string.
///
/// # Examples
///
/// ```
/// use calendar_engine::normalize::normalize_input;
///
/// assert_eq!(normalize_input(" ２０２５／１２／１６　１０時３０分 JST "), "2025/12/16 10:30");
/// assert_eq!(normalize_input("2025-12-16T10:00:00+0900"), "2025-12-16T10:00:00+09:00");
/// ```
pub fn normalize_input(text: &str) -> String {
    let mut current = normalize_pass(text);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(text: &str) -> String {
    let s = fold_to_ascii(text.trim());
    let s = collapse_whitespace(&s);
    let s = insert_offset_colon(&s);
    let s = rewrite_japanese_clock(&s);
    let s = strip_zone_labels(&s);
    let s = drop_empty_brackets(&s);
    // Label removal can leave doubled or trailing spaces behind.
    collapse_whitespace(&s)
}

/// Step 1: fold full-width digits and punctuation, and dash variants, to ASCII.
fn fold_to_ascii(s: &str) -> String {
    s.chars()
        .map(|ch| match ch {
            '０'..='９' => char::from_digit(ch as u32 - '０' as u32, 10).unwrap_or(ch),
            '：' => ':',
            '／' => '/',
            '＋' => '+',
            '（' => '(',
            '）' => ')',
            '［' => '[',
            '］' => ']',
            c if DASHES.contains(&c) => '-',
            c => c,
        })
        .collect()
}

/// Step 2: collapse every whitespace run (including U+3000) to one space, trimmed.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                result.push(' ');
            }
            prev_space = true;
        } else {
            result.push(ch);
            prev_space = false;
        }
    }
    result.trim().to_string()
}

/// Step 3: `+0900` → `+09:00` when it trails a clock time.
///
/// Only a trailing offset is rewritten, and only when a time (`:` or `時`)
/// precedes it, so dates such as `2025-1231` are left alone.
fn insert_offset_colon(s: &str) -> String {
    let bytes = s.as_bytes();
    let n = bytes.len();
    if n < 5 {
        return s.to_string();
    }

    let sign_idx = n - 5;
    let is_offset = matches!(bytes[sign_idx], b'+' | b'-')
        && bytes[sign_idx + 1..].iter().all(u8::is_ascii_digit)
        && (sign_idx == 0 || bytes[sign_idx - 1].is_ascii_digit() || bytes[sign_idx - 1] == b' ');
    if !is_offset || !s[..sign_idx].contains([':', '時']) {
        return s.to_string();
    }

    format!("{}:{}", &s[..n - 2], &s[n - 2..])
}

/// Step 4: Japanese clock markers to `H:MM[:SS]`; stray `分`/`秒` removed.
fn rewrite_japanese_clock(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            if !matches!(chars[i], '分' | '秒') {
                out.push(chars[i]);
            }
            i += 1;
            continue;
        }

        let hour_end = digit_run_end(&chars, i);
        if chars.get(hour_end) != Some(&'時') {
            out.extend(&chars[i..hour_end]);
            i = hour_end;
            continue;
        }

        let hour: String = chars[i..hour_end].iter().collect();
        let mut cursor = hour_end + 1;
        let mut minute = String::from("00");
        let mut second = None;

        if chars.get(cursor) == Some(&'半') {
            minute = String::from("30");
            cursor += 1;
        } else {
            let minute_end = digit_run_end(&chars, cursor);
            if minute_end > cursor && minute_end - cursor <= 2 {
                minute = pad2(&chars[cursor..minute_end]);
                cursor = minute_end;
                if chars.get(cursor) == Some(&'分') {
                    cursor += 1;
                    let second_end = digit_run_end(&chars, cursor);
                    if second_end > cursor
                        && second_end - cursor <= 2
                        && chars.get(second_end) == Some(&'秒')
                    {
                        second = Some(pad2(&chars[cursor..second_end]));
                        cursor = second_end + 1;
                    }
                }
            }
        }

        out.push_str(&hour);
        out.push(':');
        out.push_str(&minute);
        if let Some(second) = second {
            out.push(':');
            out.push_str(&second);
        }
        i = cursor;
    }

    out
}

fn digit_run_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    end
}

fn pad2(digits: &[char]) -> String {
    let s: String = digits.iter().collect();
    format!("{s:0>2}")
}

/// Step 5: drop `日本時間` everywhere and `JST` where it is not part of a word.
fn strip_zone_labels(s: &str) -> String {
    let s = s.replace(ZONE_LABEL_JA, "");
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    let mut i = 0;

    while i + ZONE_LABEL_JST.len() <= bytes.len() {
        let window = &bytes[i..i + ZONE_LABEL_JST.len()];
        let before_ok = i == 0 || !bytes[i - 1].is_ascii_alphabetic();
        let after = i + ZONE_LABEL_JST.len();
        let after_ok = after == bytes.len() || !bytes[after].is_ascii_alphabetic();
        if window.eq_ignore_ascii_case(ZONE_LABEL_JST.as_bytes()) && before_ok && after_ok {
            out.push_str(&s[last..i]);
            last = after;
            i = after;
        } else {
            i += 1;
        }
    }

    out.push_str(&s[last..]);
    out
}

/// Remove `()` and `[]` pairs holding nothing but spaces.
fn drop_empty_brackets(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let close = match chars[i] {
            '(' => ')',
            '[' => ']',
            c => {
                out.push(c);
                i += 1;
                continue;
            }
        };
        let mut j = i + 1;
        while j < chars.len() && chars[j] == ' ' {
            j += 1;
        }
        if chars.get(j) == Some(&close) {
            i = j + 1;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

// ── Tests ───────────────────────────────────────────────────────────────────
