//! Frequency range normalization.
//!
//! Decision tables write frequency ranges in several ways: `470-512`,
//! `470/ 512`, or two ranges glued together such as `1710-17552110-2155`.
//! The text is tokenized into digit runs and separators, and each
//! `number separator number` group is classified as one range or, for the
//! glued form, two ranges.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Digits(&'a str),
    Dash,
    Slash,
    Space,
    Other,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_ascii_digit() {
            let mut end = start + 1;
            while let Some(&(i, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                end = i + 1;
                chars.next();
            }
            tokens.push(Token::Digits(&text[start..end]));
        } else if c == '-' || c == '\u{2013}' {
            tokens.push(Token::Dash);
        } else if c == '/' {
            tokens.push(Token::Slash);
        } else if c.is_whitespace() {
            tokens.push(Token::Space);
        } else {
            tokens.push(Token::Other);
        }
    }

    tokens
}

fn is_bound(digits: &str) -> bool {
    (3..=4).contains(&digits.len())
}

/// Split a glued `end``start` run into two 3-4 digit numbers.
///
/// Prefers a split whose halves match the widths of the outer bounds and
/// keep both ranges ascending, then any ascending split, then the longest
/// left part.
fn split_glued<'a>(
    run: &'a str,
    first_start: &str,
    second_end: &str,
) -> Option<(&'a str, &'a str)> {
    let candidates: Vec<(&str, &str)> = [4usize, 3]
        .iter()
        .filter_map(|&left| {
            let right = run.len().checked_sub(left)?;
            (3..=4).contains(&right).then(|| run.split_at(left))
        })
        .collect();

    let num = |s: &str| s.parse::<u32>().unwrap_or(0);
    let ascending = |&(end, start): &(&str, &str)| {
        num(end) > num(first_start) && num(start) < num(second_end)
    };
    let same_width = |&(end, start): &(&str, &str)| {
        end.len() == first_start.len() && start.len() == second_end.len()
    };

    candidates
        .iter()
        .find(|&c| same_width(c) && ascending(c))
        .or_else(|| candidates.iter().find(|&c| ascending(c)))
        .or_else(|| candidates.first())
        .copied()
}

/// Cursor over tokens that skips whitespace around separators
struct Tokens<'a, 't> {
    tokens: &'t [Token<'a>],
}

impl<'a, 't> Tokens<'a, 't> {
    /// Index of the next non-space token at or after `i`
    fn skip_space(&self, mut i: usize) -> usize {
        while matches!(self.tokens.get(i), Some(Token::Space)) {
            i += 1;
        }
        i
    }

    fn digits(&self, i: usize) -> Option<&'a str> {
        match self.tokens.get(i) {
            Some(Token::Digits(d)) => Some(*d),
            _ => None,
        }
    }
}

/// Normalize raw frequency text into `"start-end"` groups joined by a space.
///
/// Returns an empty string when nothing in the text looks like a range.
pub fn format_frequency_range(text: &str) -> String {
    let tokens = tokenize(text);
    let cursor = Tokens { tokens: &tokens };
    let mut ranges: Vec<String> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let Some(start) = cursor.digits(i).filter(|d| is_bound(d)) else {
            i += 1;
            continue;
        };

        let sep_idx = cursor.skip_space(i + 1);
        let sep = match tokens.get(sep_idx) {
            Some(t @ (Token::Dash | Token::Slash)) => t.clone(),
            _ => {
                i += 1;
                continue;
            }
        };

        let end_idx = cursor.skip_space(sep_idx + 1);
        let Some(end) = cursor.digits(end_idx) else {
            i += 1;
            continue;
        };

        if is_bound(end) {
            ranges.push(format!("{}-{}", start, end));
            i = end_idx + 1;
            continue;
        }

        // Glued form: start-END START-end, hyphens only
        if sep == Token::Dash && (6..=8).contains(&end.len()) {
            let dash_idx = cursor.skip_space(end_idx + 1);
            if tokens.get(dash_idx) == Some(&Token::Dash) {
                let last_idx = cursor.skip_space(dash_idx + 1);
                if let Some(second_end) = cursor.digits(last_idx).filter(|d| is_bound(d)) {
                    if let Some((first_end, second_start)) = split_glued(end, start, second_end) {
                        ranges.push(format!(
                            "{}-{} {}-{}",
                            start, first_end, second_start, second_end
                        ));
                        i = last_idx + 1;
                        continue;
                    }
                }
            }
        }

        i = end_idx + 1;
    }

    ranges.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphen_range() {
        assert_eq!(format_frequency_range("470-512"), "470-512");
        assert_eq!(format_frequency_range("1710- 1755"), "1710-1755");
    }

    #[test]
    fn test_slash_range() {
        assert_eq!(format_frequency_range("470/ 512"), "470-512");
        assert_eq!(format_frequency_range("470/512"), "470-512");
    }

    #[test]
    fn test_glued_ranges() {
        assert_eq!(format_frequency_range("470-512480-500"), "470-512 480-500");
        assert_eq!(
            format_frequency_range("1710-17552110-2155"),
            "1710-1755 2110-2155"
        );
    }

    #[test]
    fn test_glued_ranges_mixed_width() {
        assert_eq!(
            format_frequency_range("746-7561710-1755"),
            "746-756 1710-1755"
        );
        assert_eq!(format_frequency_range("777-787746-756"), "777-787 746-756");
        assert_eq!(format_frequency_range("824-849869-894"), "824-849 869-894");
        assert_eq!(format_frequency_range("2500-2570620-690"), "2500-2570 620-690");
    }

    #[test]
    fn test_multiple_separate_ranges() {
        assert_eq!(
            format_frequency_range("824-849 / 869-894"),
            "824-849 869-894"
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(format_frequency_range(""), "");
        assert_eq!(format_frequency_range("N/A"), "");
        assert_eq!(format_frequency_range("12-34"), "");
        assert_eq!(format_frequency_range("2500.5-2510"), "");
        assert_eq!(format_frequency_range("700 MHz band"), "");
    }

    #[test]
    fn test_surrounding_text_ignored() {
        assert_eq!(format_frequency_range("Block A: 698-704 MHz"), "698-704");
    }
}
