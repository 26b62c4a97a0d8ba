//! Byte positions into source text, and the caret lines that point at them.
//!
//! Both the template parser and the config line parser report problems as a
//! [`Span`] over the text they were given. [`Location`] turns a span into the
//! human-facing form: the line it sits on plus a row of `^` under it.

use std::fmt;

/// A half-open byte range `[start, end)` into a source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Span {
            start,
            end: end.max(start),
        }
    }

    /// A span covering the single byte at `offset` (or the gap after the input).
    #[must_use]
    pub fn at(offset: usize) -> Self {
        Span::new(offset, offset + 1)
    }

    /// A span covering the last character of `source`, used for end-of-input errors.
    #[must_use]
    pub fn last_char(source: &str) -> Self {
        match source.char_indices().next_back() {
            Some((offset, c)) => Span::new(offset, offset + c.len_utf8()),
            None => Span::at(0),
        }
    }
}

/// A span resolved against its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// The full text of the line holding the span, without its newline.
    pub source_line: String,
    /// Spaces up to the span followed by one `^` per spanned character.
    pub carets: String,
}

impl Location {
    #[must_use]
    pub fn locate(source: &str, span: Span) -> Self {
        let start = floor_char_boundary(source, span.start.min(source.len()));
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[start..]
            .find('\n')
            .map_or(source.len(), |i| start + i);
        let end = floor_char_boundary(source, span.end.clamp(start, line_end));

        let column = source[line_start..start].chars().count();
        let width = source[start..end].chars().count().max(1);

        Location {
            line: source[..start].matches('\n').count() + 1,
            column: column + 1,
            source_line: source[line_start..line_end].to_string(),
            carets: format!("{}{}", " ".repeat(column), "^".repeat(width)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.source_line, self.carets)
    }
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_caret() {
        let loc = Location::locate("echo \"$MYENV\"", Span::at(7));
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 8);
        assert_eq!(loc.carets, "       ^");
    }

    #[test]
    fn test_multi_character_span() {
        let loc = Location::locate("echo \"${else}name${end}\"", Span::new(8, 12));
        assert_eq!(loc.carets, "        ^^^^");
    }

    #[test]
    fn test_span_past_end_of_input() {
        let loc = Location::locate("a $", Span::at(3));
        assert_eq!(loc.source_line, "a $");
        assert_eq!(loc.carets, "   ^");
    }

    #[test]
    fn test_span_on_second_line() {
        let loc = Location::locate("first\nsec!ond\nthird", Span::at(9));
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 4);
        assert_eq!(loc.to_string(), "sec!ond\n   ^");
    }

    #[test]
    fn test_columns_count_characters() {
        let loc = Location::locate("ÅÄÖ $x", Span::at(8));
        assert_eq!(loc.carets, "     ^");
    }

    #[test]
    fn test_last_char() {
        assert_eq!(Span::last_char("${var?"), Span::new(5, 6));
        assert_eq!(Span::last_char(""), Span::at(0));
    }
}
