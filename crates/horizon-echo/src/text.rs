//! Character-indexed string helpers.
//!
//! Every offset the engine handles is a count of Unicode scalar values, the
//! same unit the tree reports selections in. These helpers slice and search
//! strings in that unit.

use unicode_segmentation::UnicodeSegmentation;

/// Length of `s` in characters.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Characters `start..end` of `s`, clamped to the string. Empty if inverted.
pub fn substring(s: &str, start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }
    s.chars().skip(start).take(end - start).collect()
}

/// Characters from `start` to the end of `s`.
pub fn substring_from(s: &str, start: usize) -> String {
    s.chars().skip(start).collect()
}

/// The character at `index`.
pub fn char_at(s: &str, index: usize) -> Option<char> {
    s.chars().nth(index)
}

/// The character at `index` as a string, empty if out of range.
pub fn char_string_at(s: &str, index: usize) -> String {
    char_at(s, index).map(String::from).unwrap_or_default()
}

/// Whether `c` separates words for typing echo.
pub fn is_word_break(c: char) -> bool {
    !(c.is_alphanumeric() || c == '_')
}

/// Whether `s` is non-empty and consists only of whitespace.
pub fn is_whitespace_only(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_whitespace)
}

/// Length of the longest common prefix of `a` and `b`, in characters.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Length of the longest common suffix of `a` and `b`, in characters.
pub fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Convert a byte offset within `s` to a character offset.
fn char_offset(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

/// The words of `s` as character ranges, in order.
pub fn word_ranges(s: &str) -> Vec<(usize, usize)> {
    s.unicode_word_indices()
        .map(|(byte, word)| {
            let start = char_offset(s, byte);
            (start, start + char_len(word))
        })
        .collect()
}

/// The line index containing `offset`, given the sorted positions of `\n`.
pub fn line_index(line_breaks: &[usize], offset: usize) -> usize {
    line_breaks.iter().take_while(|&&b| offset > b).count()
}

/// Character positions of every `\n` in `s`.
pub fn line_breaks(s: &str) -> Vec<usize> {
    s.chars()
        .enumerate()
        .filter_map(|(i, c)| (c == '\n').then_some(i))
        .collect()
}

/// Character range `(start, end)` of line `index`, excluding its `\n`.
pub fn line_range(s: &str, line_breaks: &[usize], index: usize) -> (usize, usize) {
    let start = match index {
        0 => 0,
        _ => line_breaks.get(index - 1).map_or(char_len(s), |&b| b + 1),
    };
    let end = line_breaks.get(index).copied().unwrap_or_else(|| char_len(s));
    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_counts_chars() {
        assert_eq!(substring("héllo", 1, 3), "él");
        assert_eq!(substring("abc", 2, 1), "");
        assert_eq!(substring("abc", 1, 99), "bc");
        assert_eq!(substring_from("abc", 1), "bc");
        assert_eq!(char_string_at("abc", 5), "");
    }

    #[test]
    fn test_word_break() {
        assert!(is_word_break(' '));
        assert!(is_word_break('.'));
        assert!(!is_word_break('a'));
        assert!(!is_word_break('_'));
        assert!(!is_word_break('7'));
    }

    #[test]
    fn test_common_affixes() {
        assert_eq!(common_prefix_len("Alabama", "Alaska"), 3);
        assert_eq!(common_suffix_len("Alabama", "Alaska"), 1);
        assert_eq!(common_prefix_len("", "x"), 0);
    }

    #[test]
    fn test_word_ranges_use_char_offsets() {
        assert_eq!(word_ranges("é go, now"), vec![(0, 1), (2, 4), (6, 9)]);
    }

    #[test]
    fn test_lines() {
        let text = "ab\ncd\n\nef";
        let breaks = line_breaks(text);
        assert_eq!(breaks, vec![2, 5, 6]);
        assert_eq!(line_index(&breaks, 0), 0);
        assert_eq!(line_index(&breaks, 2), 0);
        assert_eq!(line_index(&breaks, 3), 1);
        assert_eq!(line_index(&breaks, 7), 3);
        assert_eq!(line_range(text, &breaks, 1), (3, 5));
        assert_eq!(line_range(text, &breaks, 2), (6, 6));
        assert_eq!(line_range(text, &breaks, 3), (7, 9));
    }

    #[test]
    fn test_whitespace_only() {
        assert!(is_whitespace_only("  \t"));
        assert!(!is_whitespace_only(""));
        assert!(!is_whitespace_only(" a "));
    }
}
