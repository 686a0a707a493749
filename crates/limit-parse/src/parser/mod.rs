//! Recursive-descent parser over a [`TokenStream`].
//!
//! Every grammar rule returns [`PResult`]. An `Err` means the rule already
//! reported a diagnostic and gave up; the nearest [`Parser::declaration`]
//! absorbs it, wraps whatever was consumed in an `ErrorNode` and
//! resynchronizes. The CST is recorded through [`CstSink`] as tokens are
//! consumed, so the AST and the tree always see the same token sequence.

mod cst_sink;
mod decl;
mod expr;
mod pattern;
mod stmt;
mod types;

use crate::scanner::column_at;
use crate::TokenStream;
use cst_sink::CstSink;
use limit_ast::ast::{Block, Program, Stmt};
use limit_ast::cst::{Node, NodeKind};
use limit_ast::span::Span;
use limit_ast::token::{Token, TokenKind};
use limit_diagnostics::{BlockContext, Diagnostics, ErrorMessage, Stage};
use log::{trace, warn};

/// A rule gave up after reporting. Carries nothing: the diagnostic is
/// already in [`Diagnostics`] and the description in `last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParseAborted;

pub(crate) type PResult<T> = Result<T, ParseAborted>;

pub(crate) struct Parser<'t, 'd> {
    tokens: &'t [Token],
    source: &'t str,
    file_path: &'t str,
    current: usize,
    eof: Token,
    diagnostics: &'d mut Diagnostics,
    sink: CstSink,
    /// Open `{` blocks, innermost last, for "Caused by" context.
    blocks: Vec<BlockContext>,
    reported: usize,
    max_errors: usize,
    halted: bool,
    /// Inside a `parallel` or `concurrent` body; enables `task` and `worker`.
    in_concurrent: bool,
    /// Brace nesting of declaration lists.
    depth: usize,
    last_error: Option<String>,
    /// Offset of the token where a missing `}` was last reported. Outer
    /// bodies closing at the same token stay quiet.
    unclosed_at: Option<u32>,
}

impl<'t, 'd> Parser<'t, 'd> {
    pub(crate) fn new(
        stream: &'t TokenStream,
        build_cst: bool,
        max_errors: usize,
        diagnostics: &'d mut Diagnostics,
    ) -> Self {
        let eof = match stream.tokens.last() {
            Some(last) if last.is(TokenKind::Eof) => last.clone(),
            last => {
                let end = last.map_or(0, |t| t.span.end);
                let line = last.map_or(1, |t| t.line);
                Token::new(TokenKind::Eof, "", Span::empty(end), line)
            }
        };
        Self {
            tokens: &stream.tokens,
            source: &stream.source,
            file_path: &stream.file_path,
            current: 0,
            eof,
            diagnostics,
            sink: CstSink::new(build_cst),
            blocks: Vec::new(),
            reported: 0,
            max_errors: max_errors.max(1),
            halted: false,
            in_concurrent: false,
            depth: 0,
            last_error: None,
            unclosed_at: None,
        }
    }

    pub(crate) fn parse(mut self) -> (Program, Option<Node>) {
        let mut statements = Vec::new();
        while !self.is_at_end() && !self.halted {
            let before = self.current;
            if self.check(TokenKind::RightBrace) {
                self.stray_closing_brace();
            } else if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
            if self.current == before && !self.is_at_end() {
                self.advance();
            }
        }
        // Whatever is left (after a halt, and always the Eof with its
        // leading trivia) still belongs in the tree.
        while self.current < self.tokens.len() {
            let token = self.tokens[self.current].clone();
            self.sink.token(&token);
            self.current += 1;
        }
        let len = u32::try_from(self.source.len()).unwrap_or(u32::MAX);
        let program = Program {
            statements,
            span: Span::new(0, len),
        };
        (program, self.sink.into_tree(len))
    }

    fn stray_closing_brace(&mut self) {
        self.sink.start(NodeKind::ErrorNode);
        self.report_here("Unexpected closing brace.");
        self.sink.mark_error("Unexpected closing brace.");
        self.advance();
        self.sink.finish();
    }

    // ======= cursor =======

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, k: usize) -> &Token {
        self.tokens.get(self.current + k).unwrap_or(&self.eof)
    }

    fn previous(&self) -> &Token {
        match self.current.checked_sub(1) {
            Some(i) => self.tokens.get(i).unwrap_or(&self.eof),
            None => self.peek(),
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is(kind)
    }

    fn check_at(&self, k: usize, kind: TokenKind) -> bool {
        self.peek_at(k).is(kind)
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the current token and record it in the CST. Stays on `Eof`.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is(TokenKind::Eof) {
            self.sink.token(&token);
            self.current += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    /// `consume` for a closing `}` that sits inside an open block; the
    /// error carries that block's context.
    fn consume_close(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.peek().clone();
        let block = self.blocks.last().cloned();
        self.report_with(&token, message, block);
        Err(ParseAborted)
    }

    fn consume_ident(&mut self, message: &str) -> PResult<String> {
        Ok(self.consume(TokenKind::Identifier, message)?.lexeme)
    }

    /// Step back over the last consumed token.
    fn rewind(&mut self) {
        if self.current > 0 {
            self.current -= 1;
            self.sink.pop_token();
        }
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: u32) -> Span {
        if self.current == 0 {
            return Span::empty(start);
        }
        Span::new(start, self.previous().span.end.max(start))
    }

    fn start_pos(&self) -> (u32, u32) {
        let token = self.peek();
        (token.span.start, token.line)
    }

    // ======= diagnostics =======

    /// Report at the current token and give up on the current rule.
    fn error(&mut self, message: &str) -> ParseAborted {
        self.report_here(message);
        ParseAborted
    }

    fn report_here(&mut self, message: &str) {
        let token = self.peek().clone();
        self.report_at(&token, message);
    }

    fn report_at(&mut self, token: &Token, message: &str) {
        self.report_with(token, message, None);
    }

    fn report_with(&mut self, token: &Token, message: &str, block: Option<BlockContext>) {
        self.last_error = Some(message.to_string());
        // The scanner already reported whatever produced an error token.
        if self.halted || token.is(TokenKind::Error) {
            return;
        }
        let mut msg = ErrorMessage::new(Stage::Syntax, message)
            .at(token.line, column_at(self.source, token.span.start as usize))
            .with_file(self.file_path)
            .with_token(token.lexeme.as_str());
        if let Some(block) = block {
            msg = msg.with_block_context(block);
        }
        if !self.diagnostics.report(msg, Some(self.source)) {
            return;
        }
        self.reported += 1;
        if self.reported >= self.max_errors {
            self.halted = true;
            warn!(file = self.file_path, errors = self.reported; "too many syntax errors, parse halted");
            let stop = ErrorMessage::new(Stage::Syntax, "Too many syntax errors; aborting parse.")
                .at(token.line, column_at(self.source, token.span.start as usize))
                .with_file(self.file_path);
            self.diagnostics.report(stop, Some(self.source));
        }
    }

    fn push_block(&mut self, kind: &str, open: &Token) {
        trace!(kind = kind, line = open.line; "enter block");
        self.blocks.push(BlockContext::new(
            kind,
            open.line,
            column_at(self.source, open.span.start as usize),
            open.lexeme.as_str(),
        ));
    }

    fn pop_block(&mut self) {
        self.blocks.pop();
    }

    /// Eat the `}` that closes the innermost open block. When it is
    /// missing, report with that block's context and carry on; the caller
    /// keeps what it parsed. Returns whether the brace was there.
    fn close_block(&mut self, message: &str) -> bool {
        if self.eat(TokenKind::RightBrace) {
            return true;
        }
        let token = self.peek().clone();
        if self.unclosed_at == Some(token.span.start) {
            self.last_error = Some(message.to_string());
            return false;
        }
        self.unclosed_at = Some(token.span.start);
        let block = self.blocks.last().cloned();
        self.report_with(&token, message, block);
        false
    }

    // ======= blocks and recovery =======

    /// `{ declarations }` recorded as a `BlockStatement` node.
    fn block(&mut self, kind: &str, message: &str) -> PResult<Block> {
        self.sink.start(NodeKind::BlockStatement);
        let open = self.consume(TokenKind::LeftBrace, message)?;
        let block = self.block_body(&open, kind);
        self.sink.finish();
        Ok(block)
    }

    /// Declarations up to the closing brace. A missing `}` is reported
    /// with the block's context but does not abort the enclosing rule.
    fn block_body(&mut self, open: &Token, kind: &str) -> Block {
        self.push_block(kind, open);
        self.depth += 1;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() && !self.halted {
            let before = self.current;
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
            if self.current == before && !self.check(TokenKind::RightBrace) {
                self.advance();
            }
        }
        self.close_block("Expected '}' after block.");
        self.depth -= 1;
        self.pop_block();
        Block {
            statements,
            span: self.span_from(open.span.start),
            line: open.line,
        }
    }

    /// One declaration or statement. `None` when it failed and was
    /// replaced by an `ErrorNode` in the CST.
    fn declaration(&mut self) -> Option<Stmt> {
        let sink_depth = self.sink.depth();
        let checkpoint = self.sink.checkpoint();
        let blocks = self.blocks.len();
        let depth = self.depth;
        let in_concurrent = self.in_concurrent;
        let start = self.current;

        match self.declaration_inner() {
            Ok(stmt) => Some(stmt),
            Err(ParseAborted) => {
                self.sink.unwind_to(sink_depth);
                self.blocks.truncate(blocks);
                self.depth = depth;
                self.in_concurrent = in_concurrent;
                self.sink.start_at(checkpoint, NodeKind::ErrorNode);
                if let Some(error) = &self.last_error {
                    let error = error.clone();
                    self.sink.mark_error(&error);
                }
                if !self.halted {
                    self.synchronize(self.current > start);
                }
                self.sink.finish();
                None
            }
        }
    }

    /// Skip to a likely statement boundary.
    fn synchronize(&mut self, consumed: bool) {
        use TokenKind::*;
        let closes_enclosing = self.depth > 0 && self.check(RightBrace);
        if !(consumed && closes_enclosing) {
            self.advance();
        }
        while !self.is_at_end() {
            if self.previous().is(Semicolon) && self.current > 0 {
                return;
            }
            match self.peek().kind {
                Class | Fn | Var | For | If | While | Print | Return => return,
                RightBrace if self.depth > 0 => return,
                _ => {}
            }
            self.advance();
        }
    }
}
