//! Field-delimiter detection for desired-set files.
//!
//! Operators export these sheets from whatever spreadsheet tool is at hand,
//! so the same columns arrive comma-, semicolon- or tab-separated.

use std::collections::HashMap;

/// Bytes inspected when guessing the delimiter.
pub const SNIFF_SAMPLE_BYTES: usize = 2048;

/// Minimum share of sampled lines that must agree on a delimiter count.
const MIN_CONSISTENCY: f64 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Candidates in tie-break order.
    pub const CANDIDATES: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Semicolon, Delimiter::Tab];

    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }

    pub fn as_char(self) -> char {
        self.as_byte() as char
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Tab => "tab",
        }
    }
}

/// Guess the delimiter from the leading chunk of `src`.
///
/// For each candidate the per-line count (outside double quotes) is taken
/// over the sampled lines; a candidate qualifies when its most common count
/// is non-zero and shared by at least 90% of lines. The most consistent
/// qualifier wins, ties going to comma, then semicolon, then tab. With no
/// qualifier the answer is comma.
pub fn sniff_delimiter(src: &str) -> Delimiter {
    let sample = leading_sample(src, SNIFF_SAMPLE_BYTES);
    let truncated = sample.len() < src.len();

    let mut lines: Vec<&str> = sample.lines().collect();
    if truncated && lines.len() > 1 {
        // Last line was cut mid-way.
        lines.pop();
    }
    let lines: Vec<&str> = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Delimiter::Comma;
    }

    let mut best: Option<(Delimiter, f64)> = None;
    for cand in Delimiter::CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| count_unquoted(l, cand.as_char()))
            .collect();
        let (mode, freq) = mode_of(&counts);
        if mode == 0 {
            continue;
        }
        let consistency = freq as f64 / lines.len() as f64;
        if consistency < MIN_CONSISTENCY {
            continue;
        }
        match best {
            Some((_, c)) if c >= consistency => {}
            _ => best = Some((cand, consistency)),
        }
    }

    best.map(|(d, _)| d).unwrap_or(Delimiter::Comma)
}

fn leading_sample(src: &str, max: usize) -> &str {
    if src.len() <= max {
        return src;
    }
    let mut end = max;
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    &src[..end]
}

fn count_unquoted(line: &str, delim: char) -> usize {
    let mut in_quotes = false;
    let mut n = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delim && !in_quotes {
            n += 1;
        }
    }
    n
}

/// Most frequent value and its frequency; ties prefer the larger value.
fn mode_of(counts: &[usize]) -> (usize, usize) {
    let mut freq: HashMap<usize, usize> = HashMap::new();
    for c in counts {
        *freq.entry(*c).or_default() += 1;
    }
    freq.into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_candidate() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), Delimiter::Comma);
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), Delimiter::Semicolon);
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3\n"), Delimiter::Tab);
    }

    #[test]
    fn commas_inside_values_do_not_fool_semicolon_files() {
        let src = "a;b;c\nx;servers, rack 4;1\ny;storage;2\n";
        assert_eq!(sniff_delimiter(src), Delimiter::Semicolon);
    }

    #[test]
    fn quoted_delimiters_are_ignored() {
        let src = "a,b,c\n\"x;y;z\",2,3\n\"p;q\",5,6\n";
        assert_eq!(sniff_delimiter(src), Delimiter::Comma);
    }

    #[test]
    fn inconclusive_falls_back_to_comma() {
        assert_eq!(sniff_delimiter(""), Delimiter::Comma);
        assert_eq!(sniff_delimiter("single_column\nvalue\n"), Delimiter::Comma);
        assert_eq!(sniff_delimiter("a;b\n1,2,3\nx\ty\n"), Delimiter::Comma);
    }

    #[test]
    fn only_leading_sample_is_inspected() {
        let mut src = String::from("a;b;c\n");
        while src.len() < SNIFF_SAMPLE_BYTES + 10 {
            src.push_str("1;2;3\n");
        }
        // Past the sample the file turns into commas; the guess must not move.
        src.push_str("1,2,3,4,5,6,7\n".repeat(500).as_str());
        assert_eq!(sniff_delimiter(&src), Delimiter::Semicolon);
    }

    #[test]
    fn sample_cut_respects_char_boundaries() {
        let src = "é".repeat(SNIFF_SAMPLE_BYTES);
        assert_eq!(leading_sample(&src, SNIFF_SAMPLE_BYTES + 1).len(), SNIFF_SAMPLE_BYTES);
    }
}
