//! Keyword highlighting for display.
//!
//! Single left-to-right pass: at each position the longest keyword that matches
//! case-insensitively is wrapped, and emitted text is never scanned again. Two
//! keywords that overlap or contain one another therefore never produce nested
//! markers.

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

/// Wraps every case-insensitive occurrence of each keyword in `<mark>` tags.
///
/// Matching is literal. Matched text keeps its original casing; everything else
/// is copied unchanged. Blank keywords are ignored.
pub fn highlight(text: &str, keywords: &[String]) -> String {
    let patterns = prepare(keywords);
    if patterns.is_empty() {
        return text.to_string();
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        match patterns.iter().find(|p| matches_at(&chars, i, p)) {
            Some(pattern) => {
                let start = chars[i].0;
                let end = chars
                    .get(i + pattern.len())
                    .map(|(byte, _)| *byte)
                    .unwrap_or(text.len());
                out.push_str(MARK_OPEN);
                out.push_str(&text[start..end]);
                out.push_str(MARK_CLOSE);
                i += pattern.len();
            }
            None => {
                out.push(chars[i].1);
                i += 1;
            }
        }
    }

    out
}

/// Keywords as char vectors, de-duplicated case-insensitively, longest first.
/// The sort is stable, so equal lengths keep list order.
fn prepare(keywords: &[String]) -> Vec<Vec<char>> {
    let mut seen = std::collections::HashSet::new();
    let mut patterns: Vec<Vec<char>> = keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(|k| k.chars().collect())
        .collect();
    patterns.sort_by(|a, b| b.len().cmp(&a.len()));
    patterns
}

fn matches_at(chars: &[(usize, char)], start: usize, pattern: &[char]) -> bool {
    if start + pattern.len() > chars.len() {
        return false;
    }
    chars[start..start + pattern.len()]
        .iter()
        .zip(pattern)
        .all(|((_, c), p)| chars_eq_ignore_case(*c, *p))
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
