use regex::Regex;

/// Cursor over an immutable input buffer.
///
/// Every pattern must be anchored with `^`; it is matched against the
/// remainder of the input starting at the cursor.
#[derive(Debug, Clone)]
pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn peek(&self, pattern: &Regex) -> bool {
        pattern.is_match(self.rest())
    }

    pub(crate) fn skip(&mut self, pattern: &Regex) -> bool {
        self.scan(pattern).is_some()
    }

    pub(crate) fn scan(&mut self, pattern: &Regex) -> Option<&'a str> {
        let rest = self.rest();
        let found = pattern.find(rest)?;
        debug_assert_eq!(found.start(), 0, "unanchored pattern {pattern}");
        self.pos += found.end();
        Some(&rest[..found.end()])
    }

    /// Text consumed between `offset` and the cursor.
    pub(crate) fn since(&self, offset: usize) -> &'a str {
        &self.input[offset..self.pos]
    }

    /// 1-based line and column (in chars) of a byte offset already passed by
    /// the cursor.
    pub(crate) fn location(&self, offset: usize) -> (u32, u32) {
        let consumed = &self.input[..offset.min(self.input.len())];
        let line = consumed.bytes().filter(|byte| *byte == b'\n').count() as u32 + 1;
        let line_start = consumed.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
        let column = consumed[line_start..].chars().count() as u32 + 1;
        (line, column)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).expect("valid pattern")
    }

    #[test]
    fn peek_does_not_move_cursor() {
        let scanner = Scanner::new("abc");
        assert!(scanner.peek(&re("^ab")));
        assert!(!scanner.peek(&re("^bc")));
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn skip_advances_only_on_match() {
        let mut scanner = Scanner::new("  x");
        assert!(!scanner.skip(&re("^x")));
        assert_eq!(scanner.position(), 0);
        assert!(scanner.skip(&re("^[ \t]*")));
        assert_eq!(scanner.position(), 2);
    }

    #[test]
    fn empty_match_counts_as_success() {
        let mut scanner = Scanner::new("x");
        assert!(scanner.skip(&re("^[ \t]*")));
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn scan_returns_matched_text() {
        let mut scanner = Scanner::new("KEY=value");
        assert_eq!(scanner.scan(&re("^[A-Z]+")), Some("KEY"));
        assert_eq!(scanner.scan(&re("^[A-Z]+")), None);
        assert_eq!(scanner.scan(&re("^=")), Some("="));
        assert_eq!(scanner.scan(&re("^.+")), Some("value"));
        assert!(scanner.at_end());
    }

    #[test]
    fn location_counts_lines_and_chars() {
        let scanner = Scanner::new("A=1\nBé=2\n");
        assert_eq!(scanner.location(0), (1, 1));
        assert_eq!(scanner.location(4), (2, 1));
        // "Bé" is three bytes but two chars.
        assert_eq!(scanner.location(7), (2, 3));
        assert_eq!(scanner.location(usize::MAX), (3, 1));
    }
}
