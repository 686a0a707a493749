use crate::ScanMode;
use limit_ast::span::Span;
use limit_ast::token::{Token, TokenKind, Trivia, TriviaKind};
use limit_diagnostics::{Diagnostics, ErrorMessage, Stage};
use log::trace;

/// 1-indexed column, counted in characters, of byte `offset` in `source`.
pub fn column_at(source: &str, offset: usize) -> u32 {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..offset].chars().count() as u32 + 1
}

pub(crate) struct Scanner<'a, 'd> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Exclusive end of the range being scanned. Narrowed while scanning
    /// the expression inside a string interpolation.
    end: usize,
    line: u32,
    mode: ScanMode,
    file_path: &'a str,
    diagnostics: &'d mut Diagnostics,
    tokens: Vec<Token>,
    /// Trivia waiting for the next meaningful token.
    pending: Vec<Trivia>,
}

impl<'a, 'd> Scanner<'a, 'd> {
    pub(crate) fn new(
        src: &'a str,
        mode: ScanMode,
        file_path: &'a str,
        diagnostics: &'d mut Diagnostics,
    ) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            end: src.len(),
            line: 1,
            mode,
            file_path,
            diagnostics,
            tokens: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn scan(mut self) -> Vec<Token> {
        self.scan_range();
        let at = self.src.len() as u32;
        let mut eof = Token::new(TokenKind::Eof, "", Span::empty(at), self.line);
        eof.leading_trivia = std::mem::take(&mut self.pending);
        self.tokens.push(eof);
        self.tokens
    }

    fn scan_range(&mut self) {
        while self.pos < self.end {
            self.scan_token();
        }
    }

    // ======= cursor =======

    fn peek(&self) -> Option<u8> {
        (self.pos < self.end).then(|| self.bytes[self.pos])
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        let i = self.pos + n;
        (i < self.end).then(|| self.bytes[i])
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.src.get(self.pos..self.end)?.chars().next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Jump to the end of the range, keeping the line count right.
    fn skip_to_end(&mut self) {
        let newlines = self.bytes[self.pos..self.end]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.line += newlines as u32;
        self.pos = self.end;
    }

    fn span(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    // ======= output =======

    fn push(&mut self, kind: TokenKind, start: usize, line: u32, value: Option<String>) {
        let mut token = Token::new(kind, &self.src[start..self.pos], self.span(start), line);
        token.value = value;
        if self.mode == ScanMode::Cst {
            token.leading_trivia = std::mem::take(&mut self.pending);
            // Interpolation markers sit inside a string literal.
            if !matches!(kind, TokenKind::InterpolationStart | TokenKind::InterpolationEnd) {
                self.trailing_trivia(&mut token);
            }
        }
        self.tokens.push(token);
    }

    fn trivia(&mut self, kind: TriviaKind, start: usize) {
        if self.mode == ScanMode::Cst {
            self.pending.push(Trivia {
                kind,
                text: self.src[start..self.pos].to_string(),
                span: self.span(start),
            });
        }
    }

    /// Same-line whitespace and `//` comments following a token.
    fn trailing_trivia(&mut self, token: &mut Token) {
        loop {
            let start = self.pos;
            let kind = match self.peek() {
                Some(b) if is_blank(b) => {
                    self.blanks();
                    TriviaKind::Whitespace
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    self.line_comment();
                    TriviaKind::LineComment
                }
                _ => break,
            };
            token.trailing_trivia.push(Trivia {
                kind,
                text: self.src[start..self.pos].to_string(),
                span: self.span(start),
            });
        }
    }

    fn report(&mut self, description: &str, offset: usize, line: u32, lexeme: &str) {
        let message = ErrorMessage::new(Stage::Scanning, description)
            .at(line, column_at(self.src, offset))
            .with_file(self.file_path)
            .with_token(lexeme);
        self.diagnostics.report(message, Some(self.src));
    }

    // ======= tokens =======

    fn scan_token(&mut self) {
        let start = self.pos;
        let line = self.line;
        let Some(b) = self.peek() else {
            return;
        };
        match b {
            _ if is_blank(b) => {
                self.blanks();
                self.trivia(TriviaKind::Whitespace, start);
            }
            b'\n' => {
                self.pos += 1;
                self.line += 1;
                self.trivia(TriviaKind::Newline, start);
            }
            b'/' if self.peek_at(1) == Some(b'/') => {
                self.line_comment();
                self.trivia(TriviaKind::LineComment, start);
            }
            b'/' if self.peek_at(1) == Some(b'*') => self.block_comment(start, line),
            b'"' | b'\'' => self.string(b),
            b'0'..=b'9' => self.number(start, line),
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => self.identifier(start, line),
            b'@' => self.annotation(start, line),
            _ => self.operator(start, line),
        }
    }

    fn blanks(&mut self) {
        while self.peek().is_some_and(is_blank) {
            self.pos += 1;
        }
    }

    fn line_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn block_comment(&mut self, start: usize, line: u32) {
        self.pos += 2;
        loop {
            match self.peek() {
                None => {
                    self.report("Unterminated comment.", start, line, "/*");
                    break;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.pos += 2;
                    break;
                }
                Some(b'\n') => {
                    self.pos += 1;
                    self.line += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.trivia(TriviaKind::BlockComment, start);
    }

    fn identifier(&mut self, start: usize, line: u32) {
        while self.peek().is_some_and(is_word) {
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];
        let kind = if word == "_" {
            TokenKind::Default
        } else {
            TokenKind::keyword(word).unwrap_or(TokenKind::Identifier)
        };
        self.push(kind, start, line, None);
    }

    /// `@public` and friends; any other `@` is a bare `At`.
    fn annotation(&mut self, start: usize, line: u32) {
        self.pos += 1;
        let name_start = self.pos;
        while self.peek().is_some_and(is_word) {
            self.pos += 1;
        }
        match TokenKind::annotation(&self.src[name_start..self.pos]) {
            Some(kind) => self.push(kind, start, line, None),
            None => {
                self.pos = name_start;
                self.push(TokenKind::At, start, line, None);
            }
        }
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn number(&mut self, start: usize, line: u32) {
        self.digits();
        let mut kind = TokenKind::IntLiteral;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            self.digits();
            kind = TokenKind::FloatLiteral;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.digits();
                kind = TokenKind::ScientificLiteral;
            } else {
                self.pos = mark;
            }
        }
        self.time_suffix();
        self.push(kind, start, line, None);
    }

    /// `5s`, `250ms`, `10us`, `3ns` stay one token.
    fn time_suffix(&mut self) {
        for suffix in ["ms", "us", "ns", "s"] {
            let rest = &self.bytes[self.pos..self.end];
            if rest.starts_with(suffix.as_bytes()) && !self.peek_at(suffix.len()).is_some_and(is_word) {
                self.pos += suffix.len();
                return;
            }
        }
    }

    fn operator(&mut self, start: usize, line: u32) {
        use TokenKind::*;
        let Some(c) = self.bump_char() else {
            // Not on a char boundary; step over the byte.
            self.pos += 1;
            return;
        };
        let kind = match c {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            '[' => LeftBracket,
            ']' => RightBracket,
            ',' => Comma,
            ':' => Colon,
            ';' => Semicolon,
            '?' => Question,
            '|' => Pipe,
            '&' => Ampersand,
            '^' => Caret,
            '~' => Tilde,
            '.' if self.eat(b'.') => {
                if self.eat(b'.') {
                    Ellipsis
                } else {
                    Range
                }
            }
            '.' => Dot,
            '-' if self.eat(b'>') => Arrow,
            '-' if self.eat(b'=') => MinusEqual,
            '-' => Minus,
            '=' if self.eat(b'>') => Arrow,
            '=' if self.eat(b'=') => EqualEqual,
            '=' => Equal,
            '+' if self.eat(b'=') => PlusEqual,
            '+' => Plus,
            '*' if self.eat(b'*') => Power,
            '*' if self.eat(b'=') => StarEqual,
            '*' => Star,
            '/' if self.eat(b'=') => SlashEqual,
            '/' => Slash,
            '%' if self.eat(b'=') => ModulusEqual,
            '%' => Modulus,
            '!' if self.eat(b'=') => BangEqual,
            '!' => Bang,
            '<' if self.eat(b'=') => LessEqual,
            '<' => Less,
            '>' if self.eat(b'=') => GreaterEqual,
            '>' => Greater,
            other => {
                trace!(offset = start, line = line; "unexpected character");
                let lexeme = other.to_string();
                self.report(&format!("Unexpected character '{other}'"), start, line, &lexeme);
                if self.mode == ScanMode::Cst {
                    self.push(Error, start, line, None);
                }
                return;
            }
        };
        self.push(kind, start, line, None);
    }

    // ======= strings =======

    fn string(&mut self, quote: u8) {
        let mut segment = self.pos;
        let mut segment_line = self.line;
        let mut value = String::new();
        self.pos += 1;
        loop {
            let Some(b) = self.peek() else {
                self.unterminated("Unterminated string.", segment, segment_line);
                return;
            };
            if b == quote {
                self.pos += 1;
                self.push(TokenKind::String, segment, segment_line, Some(value));
                return;
            }
            match b {
                b'\\' => self.escape(&mut value),
                b'{' if self.opens_interpolation(quote) => {
                    self.pos += 1;
                    let text = std::mem::take(&mut value);
                    self.push(TokenKind::InterpolationStart, segment, segment_line, Some(text));
                    if !self.interpolation(quote) {
                        return;
                    }
                    segment = self.pos;
                    segment_line = self.line;
                }
                _ => {
                    if let Some(c) = self.bump_char() {
                        value.push(c);
                    }
                }
            }
        }
    }

    fn escape(&mut self, value: &mut String) {
        self.pos += 1;
        let Some(c) = self.bump_char() else {
            value.push('\\');
            return;
        };
        let resolved = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'v' => '\u{0b}',
            '\\' | '\'' | '"' | '{' | '}' => c,
            other => {
                value.push('\\');
                other
            }
        };
        value.push(resolved);
    }

    /// Whether the `{` at the cursor starts an interpolation. Braces holding
    /// only digits, commas and spaces (`{2,}`) stay literal, as does `{}`.
    fn opens_interpolation(&self, quote: u8) -> bool {
        self.bytes[self.pos + 1..self.end]
            .iter()
            .take_while(|b| **b != b'}' && **b != quote)
            .any(|b| !(b.is_ascii_digit() || *b == b',' || *b == b' '))
    }

    /// Scan the expression between the `{` just consumed and its matching
    /// `}`. Returns `false` when the interpolation is never closed.
    fn interpolation(&mut self, quote: u8) -> bool {
        let expr_start = self.pos;
        let mut depth = 0usize;
        let mut close = None;
        for (i, b) in self.bytes[expr_start..self.end].iter().enumerate() {
            match *b {
                b'{' => depth += 1,
                b'}' if depth == 0 => {
                    close = Some(expr_start + i);
                    break;
                }
                b'}' => depth -= 1,
                b if b == quote => break,
                _ => {}
            }
        }
        let Some(close) = close else {
            self.unterminated("Unterminated string interpolation.", expr_start, self.line);
            return false;
        };
        trace!(start = expr_start, end = close; "string interpolation");

        let outer_end = self.end;
        self.end = close;
        self.scan_range();
        self.end = outer_end;

        let start = self.pos;
        let line = self.line;
        self.pos += 1;
        self.push(TokenKind::InterpolationEnd, start, line, None);
        true
    }

    fn unterminated(&mut self, description: &str, start: usize, line: u32) {
        let shown = self.src[start..self.end].lines().next().unwrap_or("").to_string();
        self.report(description, start, line, &shown);
        self.skip_to_end();
        self.push(TokenKind::Error, start, line, None);
    }
}

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | 0x0b | 0x0c)
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
