//! Splits one program line into G-code words.

/// A single G-code word: a letter paired with a numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    /// Uppercase ASCII letter.
    pub letter: char,
    pub value: f64,
}

impl Word {
    pub fn new(letter: char, value: f64) -> Self {
        Word {
            letter: letter.to_ascii_uppercase(),
            value,
        }
    }
}

/// Result of lexing one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexedLine {
    /// Words in source order.
    pub words: Vec<Word>,
    /// Tokens that were not `letter + number`, in source order.
    pub rejected: Vec<String>,
}

/// Lexes one raw line.
///
/// `(...)` comments and everything after `;` are removed; an unclosed `(`
/// comments out the rest of the line. Tokens are split on whitespace and
/// packed words such as `G01X10Y5` are split at each letter. A line whose
/// first non-blank character is `%` is a program delimiter and lexes to
/// nothing.
pub fn lex_line(raw: &str) -> LexedLine {
    let mut out = LexedLine::default();
    let code = strip_comments(raw);
    if code.trim_start().starts_with('%') {
        return out;
    }

    for token in code.split_whitespace() {
        for piece in split_packed(token) {
            match parse_word(piece) {
                Some(word) => out.words.push(word),
                None => out.rejected.push(piece.to_string()),
            }
        }
    }
    out
}

fn strip_comments(raw: &str) -> String {
    let mut code = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            ';' if depth == 0 => break,
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            // Keep token boundaries intact: `X1(c)Y2` is two words.
            _ if depth > 0 => {}
            _ => code.push(ch),
        }
        if ch == '(' || ch == ')' {
            code.push(' ');
        }
    }
    code
}

/// Splits `G01X10Y5` into `G01`, `X10`, `Y5`. A token that does not start
/// with a letter is returned whole so it can be rejected as one piece.
///
/// An `E` right after a digit or `.` stays with its word, so `X1e3` reaches
/// [`parse_word`] whole and is rejected there.
fn split_packed(token: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut prev: Option<char> = None;
    for (i, c) in token.char_indices() {
        let exponent = c.eq_ignore_ascii_case(&'e')
            && prev.is_some_and(|p| p.is_ascii_digit() || p == '.');
        if i == 0 || (c.is_ascii_alphabetic() && !exponent) {
            starts.push(i);
        }
        prev = Some(c);
    }

    if !token.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return vec![token];
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(token.len());
            &token[start..end]
        })
        .collect()
}

fn parse_word(piece: &str) -> Option<Word> {
    let mut chars = piece.chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    let rest = chars.as_str();
    // `str::parse` accepts exponents and `inf`; G-code values are plain decimals.
    if rest.is_empty() || rest.contains(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let value: f64 = rest.parse().ok()?;
    value.is_finite().then(|| Word::new(letter, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(line: &LexedLine) -> String {
        line.words.iter().map(|w| w.letter).collect()
    }

    #[test]
    fn splits_on_whitespace_and_uppercases() {
        let line = lex_line("g01 x10.5 y-2 f100");
        assert_eq!(letters(&line), "GXYF");
        assert_eq!(line.words[0].value, 1.0);
        assert_eq!(line.words[1].value, 10.5);
        assert_eq!(line.words[2].value, -2.0);
        assert!(line.rejected.is_empty());
    }

    #[test]
    fn strips_parenthesized_comments() {
        let line = lex_line("G00 (rapid to start) X5 (note) Y6");
        assert_eq!(letters(&line), "GXY");
    }

    #[test]
    fn strips_semicolon_comments() {
        let line = lex_line("G01 X1 ; Y2 is ignored");
        assert_eq!(letters(&line), "GX");
    }

    #[test]
    fn unclosed_paren_comments_out_the_rest() {
        let line = lex_line("X1 (unterminated Y2");
        assert_eq!(letters(&line), "X");
    }

    #[test]
    fn comment_between_packed_words_keeps_boundary() {
        let line = lex_line("X1(c)Y2");
        assert_eq!(letters(&line), "XY");
        assert_eq!(line.words[1].value, 2.0);
    }

    #[test]
    fn packed_words_are_split() {
        let line = lex_line("G01X10Y5.5F200");
        assert_eq!(letters(&line), "GXYF");
        assert_eq!(line.words[2].value, 5.5);
    }

    #[test]
    fn malformed_tokens_are_rejected_not_fatal() {
        let line = lex_line("G01 X 10 #5 Y2");
        assert_eq!(letters(&line), "GY");
        assert_eq!(line.rejected, vec!["X", "10", "#5"]);
    }

    #[test]
    fn exponent_values_are_rejected_whole() {
        let line = lex_line("G1X1e3 Y2E-1");
        assert_eq!(letters(&line), "G");
        assert_eq!(line.rejected, vec!["X1e3", "Y2E-1"]);
    }

    #[test]
    fn percent_line_is_empty() {
        let line = lex_line("%");
        assert!(line.words.is_empty());
        assert!(line.rejected.is_empty());
    }

    #[test]
    fn duplicate_letters_keep_source_order() {
        let line = lex_line("X1 X2");
        assert_eq!(line.words, vec![Word::new('X', 1.0), Word::new('X', 2.0)]);
    }

    #[test]
    fn leading_dot_and_sign_values_parse() {
        let line = lex_line("X-.5 Y+3 Z.25");
        assert_eq!(line.words[0].value, -0.5);
        assert_eq!(line.words[1].value, 3.0);
        assert_eq!(line.words[2].value, 0.25);
    }
}
