//! Statement boundary scanner.
//!
//! Streams raw SQL bytes and yields one statement at a time. The scanner
//! tracks quote and comment state so that a `;` inside a string literal or
//! comment never terminates a statement. Oracle escapes quotes by doubling
//! (`''`), which keeps the scanner inside the literal.

use std::io::{BufRead, BufReader, Read};

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;
pub const MEDIUM_BUFFER_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    InLiteral,
    /// Saw `'` inside a literal; the next byte decides doubled-quote vs close.
    QuoteSeen,
    /// Saw `-` in normal mode; a second `-` opens a line comment.
    DashSeen,
    /// Saw `/` in normal mode; `*` opens a block comment, a newline after a
    /// line-leading `/` is a batch separator.
    SlashSeen,
    LineComment,
    BlockComment,
    /// Saw `*` inside a block comment; `/` closes it.
    StarSeen,
}

enum Step {
    Consumed,
    Terminated,
}

/// Incremental scanner over any byte stream. Holds only the current
/// statement's bytes; never requires the whole input in memory.
pub struct StatementScanner<R: Read> {
    reader: BufReader<R>,
    stmt_buffer: Vec<u8>,
    mode: Mode,
    at_line_start: bool,
    slash_at_line_start: bool,
    unterminated_last: bool,
    unterminated_count: u64,
}

impl<R: Read> StatementScanner<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            stmt_buffer: Vec::with_capacity(32 * 1024),
            mode: Mode::Normal,
            at_line_start: true,
            slash_at_line_start: false,
            unterminated_last: false,
            unterminated_count: 0,
        }
    }

    /// True when the most recently returned statement hit end-of-input while
    /// still inside a literal or block comment.
    pub fn ended_inside_literal(&self) -> bool {
        self.unterminated_last
    }

    /// Number of unterminated trailing spans seen over the whole run.
    pub fn unterminated_count(&self) -> u64 {
        self.unterminated_count
    }

    /// Read the next statement, including its `;` terminator. A line
    /// consisting solely of `/` also ends a statement; the separator line
    /// itself is dropped. Returns `None` at clean end-of-input.
    pub fn read_statement(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        self.stmt_buffer.clear();
        self.mode = Mode::Normal;
        self.unterminated_last = false;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                self.flush_pending();
                if self.stmt_buffer.is_empty() {
                    return Ok(None);
                }
                if matches!(
                    self.mode,
                    Mode::InLiteral | Mode::BlockComment | Mode::StarSeen
                ) {
                    self.unterminated_last = true;
                    self.unterminated_count += 1;
                }
                let result = std::mem::take(&mut self.stmt_buffer);
                return Ok(Some(result));
            }

            let len = buf.len();
            let chunk = buf.to_vec();
            let mut consumed = 0;
            let mut terminated = false;

            for (i, &b) in chunk.iter().enumerate() {
                match self.step(b) {
                    Step::Consumed => {}
                    Step::Terminated => {
                        consumed = i + 1;
                        terminated = true;
                        break;
                    }
                }
            }

            if terminated {
                self.reader.consume(consumed);
                let result = std::mem::take(&mut self.stmt_buffer);
                return Ok(Some(result));
            }

            self.reader.consume(len);
        }
    }

    fn step(&mut self, b: u8) -> Step {
        // A mode change without consuming the byte loops so the byte is
        // reprocessed in the new mode.
        loop {
            match self.mode {
                Mode::Normal => match b {
                    b'\'' => {
                        self.mode = Mode::InLiteral;
                        self.push(b);
                    }
                    b'-' => {
                        self.mode = Mode::DashSeen;
                    }
                    b'/' => {
                        self.mode = Mode::SlashSeen;
                        self.slash_at_line_start = self.at_line_start;
                    }
                    b';' => {
                        self.push(b);
                        self.at_line_start = false;
                        return Step::Terminated;
                    }
                    _ => self.push(b),
                },
                Mode::InLiteral => match b {
                    b'\'' => {
                        self.mode = Mode::QuoteSeen;
                        self.push(b);
                    }
                    _ => self.push(b),
                },
                Mode::QuoteSeen => {
                    if b == b'\'' {
                        // Doubled quote: still inside the literal.
                        self.mode = Mode::InLiteral;
                        self.push(b);
                    } else {
                        self.mode = Mode::Normal;
                        continue;
                    }
                }
                Mode::DashSeen => {
                    if b == b'-' {
                        self.mode = Mode::LineComment;
                        self.push(b'-');
                        self.push(b'-');
                    } else {
                        self.mode = Mode::Normal;
                        self.push(b'-');
                        continue;
                    }
                }
                Mode::SlashSeen => {
                    if b == b'*' {
                        self.mode = Mode::BlockComment;
                        self.push(b'/');
                        self.push(b'*');
                    } else if self.slash_at_line_start && (b == b'\n' || b == b'\r') {
                        // Standalone `/` batch separator; drop the line.
                        self.mode = Mode::Normal;
                        self.at_line_start = true;
                        return Step::Terminated;
                    } else {
                        self.mode = Mode::Normal;
                        self.push(b'/');
                        continue;
                    }
                }
                Mode::LineComment => {
                    self.push(b);
                    if b == b'\n' {
                        self.mode = Mode::Normal;
                    }
                }
                Mode::BlockComment => {
                    if b == b'*' {
                        self.mode = Mode::StarSeen;
                    } else {
                        self.push(b);
                    }
                }
                Mode::StarSeen => {
                    if b == b'/' {
                        self.mode = Mode::Normal;
                        self.push(b'*');
                        self.push(b'/');
                    } else {
                        self.mode = Mode::BlockComment;
                        self.push(b'*');
                        continue;
                    }
                }
            }
            self.at_line_start = b == b'\n';
            return Step::Consumed;
        }
    }

    /// Flush bytes deferred by a one-byte lookahead state at end-of-input.
    fn flush_pending(&mut self) {
        match self.mode {
            Mode::DashSeen => {
                self.stmt_buffer.push(b'-');
                self.mode = Mode::Normal;
            }
            Mode::SlashSeen => {
                if !self.slash_at_line_start {
                    self.stmt_buffer.push(b'/');
                }
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    #[inline]
    fn push(&mut self, b: u8) {
        self.stmt_buffer.push(b);
    }
}

/// Byte ranges of single-quoted literal contents within a statement,
/// excluding the enclosing quotes. Doubled quotes stay inside their span.
/// Rewriting stages use this to keep structural text out of reach.
pub fn literal_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() {
                if bytes[j] == b'\'' {
                    if j + 1 < bytes.len() && bytes[j + 1] == b'\'' {
                        j += 2;
                        continue;
                    }
                    break;
                }
                j += 1;
            }
            spans.push((start, j.min(bytes.len())));
            i = j + 1;
        } else {
            i += 1;
        }
    }
    spans
}

/// True when byte offset `pos` falls inside one of `spans`.
pub fn in_spans(spans: &[(usize, usize)], pos: usize) -> bool {
    spans.iter().any(|&(s, e)| pos >= s && pos < e)
}

pub fn determine_buffer_size(file_size: u64) -> usize {
    if file_size > 1024 * 1024 * 1024 {
        MEDIUM_BUFFER_SIZE
    } else {
        SMALL_BUFFER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(sql: &[u8]) -> Vec<String> {
        let mut scanner = StatementScanner::new(sql, 1024);
        let mut out = Vec::new();
        while let Some(stmt) = scanner.read_statement().unwrap() {
            out.push(String::from_utf8(stmt).unwrap());
        }
        out
    }

    #[test]
    fn test_basic_split() {
        let stmts = scan_all(b"CREATE TABLE t1 (id INT); INSERT INTO t1 VALUES (1);");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "CREATE TABLE t1 (id INT);");
        assert_eq!(stmts[1], " INSERT INTO t1 VALUES (1);");
    }

    #[test]
    fn test_semicolon_in_literal() {
        let stmts = scan_all(b"INSERT INTO t1 VALUES ('hello; world');");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0], "INSERT INTO t1 VALUES ('hello; world');");
    }

    #[test]
    fn test_doubled_quote_stays_in_literal() {
        let stmts = scan_all(b"INSERT INTO t1 VALUES ('it''s; a test');");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0], "INSERT INTO t1 VALUES ('it''s; a test');");
    }

    #[test]
    fn test_semicolon_in_line_comment() {
        let stmts = scan_all(b"SELECT 1 -- not here;\nFROM dual;");
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].ends_with("FROM dual;"));
    }

    #[test]
    fn test_semicolon_in_block_comment() {
        let stmts = scan_all(b"SELECT /* nope; */ 1 FROM dual;");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0], "SELECT /* nope; */ 1 FROM dual;");
    }

    #[test]
    fn test_slash_batch_separator() {
        let stmts = scan_all(b"BEGIN NULL END\n/\nCREATE TABLE t (id INT);");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "BEGIN NULL END\n");
        assert!(stmts[1].contains("CREATE TABLE"));
    }

    #[test]
    fn test_slash_in_expression_is_not_separator() {
        let stmts = scan_all(b"INSERT INTO t VALUES (10/2);");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0], "INSERT INTO t VALUES (10/2);");
    }

    #[test]
    fn test_unterminated_literal_at_eof() {
        let mut scanner = StatementScanner::new(&b"INSERT INTO t VALUES ('oops"[..], 1024);
        let stmt = scanner.read_statement().unwrap().unwrap();
        assert_eq!(stmt, b"INSERT INTO t VALUES ('oops");
        assert!(scanner.ended_inside_literal());
        assert_eq!(scanner.unterminated_count(), 1);
        assert!(scanner.read_statement().unwrap().is_none());
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        let mut scanner = StatementScanner::new(&b"COMMIT"[..], 16);
        let stmt = scanner.read_statement().unwrap().unwrap();
        assert_eq!(stmt, b"COMMIT");
        assert!(!scanner.ended_inside_literal());
    }

    #[test]
    fn test_literal_spans_basic() {
        let text = "VALUES ('abc', 1, 'x''y')";
        let spans = literal_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].0..spans[0].1], "abc");
        assert_eq!(&text[spans[1].0..spans[1].1], "x''y");
    }

    #[test]
    fn test_literal_spans_unterminated() {
        let text = "VALUES ('abc";
        let spans = literal_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].0..spans[0].1], "abc");
    }

    #[test]
    fn test_statement_spanning_small_buffers() {
        let sql = b"INSERT INTO t VALUES ('a longer literal that spans refills');";
        let mut scanner = StatementScanner::new(&sql[..], 8);
        let stmt = scanner.read_statement().unwrap().unwrap();
        assert_eq!(stmt.as_slice(), &sql[..]);
    }
}
