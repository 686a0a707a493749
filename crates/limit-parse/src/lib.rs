//! Scanner and parser for the Limit language.
//!
//! [`scan`] turns source text into a [`TokenStream`]; [`parse`] turns a token
//! stream into a [`Program`] and, when asked, a lossless CST. Both report
//! into a caller-owned [`Diagnostics`] and always return a best-effort result.

#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

mod parser;
mod scanner;

use limit_ast::ast::Program;
use limit_ast::cst::Node;
use limit_ast::token::{self, Token};
use limit_diagnostics::{Diagnostics, ErrorMessage};
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

pub use scanner::column_at;

/// Default cap on syntax errors before the parser gives up.
pub const MAX_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ScanMode {
    /// Trivia is dropped; unexpected characters are reported and skipped.
    #[default]
    Lossy,
    /// Trivia is attached to tokens; unexpected characters become `Error` tokens.
    Cst,
}

/// The output of [`scan`]: tokens ending in a single `Eof`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub mode: ScanMode,
    #[serde(skip)]
    pub source: String,
    pub file_path: String,
}

impl TokenStream {
    /// Source text rebuilt from the tokens. Equal to the input in CST mode.
    pub fn reconstruct(&self) -> String {
        token::reconstruct(&self.tokens)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Build a CST alongside the AST. Needs tokens scanned in [`ScanMode::Cst`].
    pub build_cst: bool,
    pub max_errors: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            build_cst: false,
            max_errors: MAX_ERRORS,
        }
    }
}

impl ParserConfig {
    pub fn with_cst() -> Self {
        Self {
            build_cst: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseResult {
    pub program: Program,
    pub cst: Option<Node>,
    /// Diagnostics reported during this call, in source order.
    pub errors: Vec<ErrorMessage>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Failure of the one-shot [`parse_str`] helper.
#[derive(Debug, Error)]
#[error("{file_path}: {} error(s), first: {}", .errors.len(), first_description(.errors))]
pub struct ParseError {
    pub file_path: String,
    pub errors: Vec<ErrorMessage>,
}

fn first_description(errors: &[ErrorMessage]) -> &str {
    errors.first().map_or("", |e| e.description.as_str())
}

pub fn scan(
    source: &str,
    mode: ScanMode,
    file_path: &str,
    diagnostics: &mut Diagnostics,
) -> TokenStream {
    let before = diagnostics.len();
    let tokens = scanner::Scanner::new(source, mode, file_path, diagnostics).scan();
    debug!(
        file = file_path,
        mode:? = mode,
        tokens = tokens.len(),
        errors = diagnostics.len() - before;
        "scan finished"
    );
    TokenStream {
        tokens,
        mode,
        source: source.to_string(),
        file_path: file_path.to_string(),
    }
}

pub fn parse(tokens: &TokenStream, config: ParserConfig, diagnostics: &mut Diagnostics) -> ParseResult {
    let before = diagnostics.len();
    let build_cst = config.build_cst && tokens.mode == ScanMode::Cst;
    if config.build_cst && !build_cst {
        warn!(file = tokens.file_path.as_str(); "CST requested for lossy tokens; building the AST only");
    }
    let (program, cst) = parser::Parser::new(tokens, build_cst, config.max_errors, diagnostics).parse();
    let errors = diagnostics.messages()[before..].to_vec();
    debug!(
        file = tokens.file_path.as_str(),
        statements = program.statements.len(),
        errors = errors.len();
        "parse finished"
    );
    ParseResult {
        program,
        cst,
        errors,
    }
}

/// Scan and parse in one go. The scan mode follows `config.build_cst`, and
/// `errors` holds the scanner's diagnostics as well as the parser's.
pub fn parse_source(
    source: &str,
    file_path: &str,
    config: ParserConfig,
    diagnostics: &mut Diagnostics,
) -> ParseResult {
    let before = diagnostics.len();
    let mode = if config.build_cst {
        ScanMode::Cst
    } else {
        ScanMode::Lossy
    };
    let tokens = scan(source, mode, file_path, diagnostics);
    let mut result = parse(&tokens, config, diagnostics);
    result.errors = diagnostics.messages()[before..].to_vec();
    result
}

pub fn parse_str(file_path: &str, source: &str) -> Result<Program, ParseError> {
    let mut diagnostics = Diagnostics::new();
    let result = parse_source(source, file_path, ParserConfig::default(), &mut diagnostics);
    if result.has_errors() {
        return Err(ParseError {
            file_path: file_path.to_string(),
            errors: result.errors,
        });
    }
    Ok(result.program)
}
