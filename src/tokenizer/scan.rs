use super::cancellation::{self, CancellationToken};
use super::{Token, TokenKind};
use crate::{Cancelled, Log, Position, Range};

/// Tracks the running (line, column, byte offset) while scanning, seeded
/// from `origin` so a retokenized window can report coordinates consistent
/// with the rest of the document.
pub(crate) struct Cursor<'t> {
    pub text: &'t str,
    pub bytes: &'t [u8],
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(text: &'t str, origin: Position) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            offset: 0,
            line: origin.line,
            column: origin.column,
        }
    }

    pub fn position(&self, local_offset: usize, abs_offset_base: usize) -> Position {
        Position::new(self.line, self.column, abs_offset_base + local_offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.text[self.offset..].chars().next()
    }

    pub fn peek_at(&self, local_offset: usize) -> Option<char> {
        self.text.get(local_offset..)?.chars().next()
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.text[self.offset..].starts_with(s)
    }

    /// Advance past one character, updating line/column per the shared
    /// line-break rule: `\r\n` and lone `\r` each count as a single break.
    pub fn advance(&mut self) -> char {
        let c = self.peek().expect("advance called at eof");
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else if c == '\r' {
            if self.peek() == Some('\n') {
                let nl = self.advance_raw('\n');
                debug_assert_eq!(nl, '\n');
            }
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        c
    }

    fn advance_raw(&mut self, expected: char) -> char {
        let c = self.peek().expect("advance_raw called at eof");
        debug_assert_eq!(c, expected);
        self.offset += c.len_utf8();
        c
    }
}

const PUNCTUATION: &[(char, TokenKind)] = &[
    ('{', TokenKind::LeftBrace),
    ('}', TokenKind::RightBrace),
    ('[', TokenKind::LeftBracket),
    (']', TokenKind::RightBracket),
    (':', TokenKind::Colon),
    (',', TokenKind::Comma),
];

pub(crate) fn punctuation_kind(c: char) -> Option<TokenKind> {
    PUNCTUATION.iter().find(|(p, _)| *p == c).map(|(_, k)| *k)
}

/// `true` if `c` could start a JSON value — used by the tolerant comma
/// recovery logic shared with the sanitizer.
pub(crate) fn can_start_value(c: char) -> bool {
    c == '"' || c == '{' || c == '[' || c == 't' || c == 'f' || c == 'n' || c == '-' || c == '+' || c.is_ascii_digit()
}

pub(crate) fn scan(
    text: &str,
    origin: Position,
    token_span_limit: usize,
    log: Log<&'static str>,
    cancel: Option<&dyn CancellationToken>,
) -> Result<Vec<Token>, Cancelled> {
    #[cfg(debug_assertions)]
    if log.order() >= Log::Verbose(()).order() {
        println!("[{}; TokenizeBegin]: {} chars starting at {}", log, text.chars().count(), origin);
    }

    let mut cursor = Cursor::new(text, origin);
    let abs_base = origin.offset;
    let mut tokens = Vec::new();

    while !cursor.is_eof() {
        cancellation::check(cancel)?;
        if tokens.len() >= token_span_limit {
            break;
        }

        let c = cursor.peek().unwrap();

        if c.is_whitespace() {
            cursor.advance();
            continue;
        }

        let start = cursor.position(cursor.offset, abs_base);

        if let Some(kind) = punctuation_kind(c) {
            cursor.advance();
            let end = cursor.position(cursor.offset, abs_base);
            tokens.push(Token::new(kind, Range::new(start, end)));
            trace_token(log, tokens.last().unwrap());
            continue;
        }

        if c == '"' {
            scan_string(&mut cursor, abs_base, &mut tokens);
            trace_token(log, tokens.last().unwrap());
            continue;
        }

        if cursor.starts_with("//") {
            scan_line_comment(&mut cursor, abs_base, &mut tokens);
            trace_token(log, tokens.last().unwrap());
            continue;
        }
        if cursor.starts_with("/*") {
            scan_block_comment(&mut cursor, abs_base, &mut tokens, cancel)?;
            trace_token(log, tokens.last().unwrap());
            continue;
        }

        if c == '-' || c == '+' || c.is_ascii_digit() {
            if let Some(len) = match_number(&cursor.text[cursor.offset..]) {
                for _ in 0..len {
                    cursor.advance();
                }
                let end = cursor.position(cursor.offset, abs_base);
                tokens.push(Token::new(TokenKind::Number, Range::new(start, end)));
                trace_token(log, tokens.last().unwrap());
                continue;
            }
        }

        if let Some((word, kind)) = match_keyword(&cursor.text[cursor.offset..]) {
            for _ in 0..word.chars().count() {
                cursor.advance();
            }
            let end = cursor.position(cursor.offset, abs_base);
            tokens.push(Token::new(kind, Range::new(start, end)));
            trace_token(log, tokens.last().unwrap());
            continue;
        }

        // Unrecognized character: skip it without producing a token.
        trace_skip(log, c, start);
        cursor.advance();
    }

    Ok(tokens)
}

/// Trace a successfully produced token at the `Success` level.
#[cfg(debug_assertions)]
fn trace_token(log: Log<&'static str>, token: &Token) {
    if log.order() >= Log::Success(()).order() {
        println!("[{}; TokenSuccess]: {:?} at {}", log, token.kind, token.range.start);
    }
}
#[cfg(not(debug_assertions))]
fn trace_token(_log: Log<&'static str>, _token: &Token) {}

/// Trace a character skipped for matching no lexeme, at the `Result` level.
#[cfg(debug_assertions)]
fn trace_skip(log: Log<&'static str>, c: char, pos: Position) {
    if log.order() >= Log::Result(()).order() {
        println!("[{}; UnrecognizedChar]: skipped {:?} at {}", log, c, pos);
    }
}
#[cfg(not(debug_assertions))]
fn trace_skip(_log: Log<&'static str>, _c: char, _pos: Position) {}

fn scan_string(cursor: &mut Cursor, abs_base: usize, tokens: &mut Vec<Token>) {
    let start = cursor.position(cursor.offset, abs_base);
    cursor.advance(); // opening quote
    loop {
        match cursor.peek() {
            None => break,
            Some('"') => {
                cursor.advance();
                break;
            }
            Some('\n') | Some('\r') => break,
            Some('\\') => {
                cursor.advance();
                if cursor.peek().is_some() {
                    cursor.advance();
                }
            }
            Some(_) => {
                cursor.advance();
            }
        }
    }
    let end = cursor.position(cursor.offset, abs_base);
    tokens.push(Token::new(TokenKind::String, Range::new(start, end)));
}

fn scan_line_comment(cursor: &mut Cursor, abs_base: usize, tokens: &mut Vec<Token>) {
    let start = cursor.position(cursor.offset, abs_base);
    cursor.advance();
    cursor.advance();
    while let Some(c) = cursor.peek() {
        if c == '\n' || c == '\r' {
            break;
        }
        cursor.advance();
    }
    let end = cursor.position(cursor.offset, abs_base);
    tokens.push(Token::new(TokenKind::Comment, Range::new(start, end)));
}

fn scan_block_comment(
    cursor: &mut Cursor,
    abs_base: usize,
    tokens: &mut Vec<Token>,
    cancel: Option<&dyn CancellationToken>,
) -> Result<(), Cancelled> {
    let start = cursor.position(cursor.offset, abs_base);
    cursor.advance();
    cursor.advance();
    loop {
        cancellation::check(cancel)?;
        if cursor.starts_with("*/") {
            cursor.advance();
            cursor.advance();
            break;
        }
        if cursor.peek().is_none() {
            break;
        }
        cursor.advance();
    }
    let end = cursor.position(cursor.offset, abs_base);
    tokens.push(Token::new(TokenKind::Comment, Range::new(start, end)));
    Ok(())
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
];

pub(crate) fn match_keyword(s: &str) -> Option<(&'static str, TokenKind)> {
    KEYWORDS
        .iter()
        .find(|(word, _)| s.starts_with(word))
        .copied()
}

/// Match `-?[0-9]+ (. [0-9]+)? ([eE] [-+]? [0-9]+)?` with a leading `+`
/// additionally accepted for leniency (a tokenizer-only artifact; the
/// strict reader still rejects a leading `+` at the Initial stage). Returns
/// the matched length in bytes, or `None` if `s` does not start with a
/// number.
pub(crate) fn match_number(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }

    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }

    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        let frac_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start {
            i = j;
        }
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'-' || bytes[j] == b'+') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    Some(i)
}
