use crate::code::{self, ErrorCode};
use crate::context;
use crate::hints;
use crate::stage::{ErrorType, Stage};
use serde::Serialize;

/// The opening of a brace-delimited construct the parser is inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockContext {
    /// `"function"`, `"class"`, `"if"`, `"while"`, `"block"`, ...
    pub block_type: String,
    pub start_line: u32,
    pub start_column: u32,
    pub start_lexeme: String,
}

impl BlockContext {
    pub fn new(
        block_type: impl Into<String>,
        start_line: u32,
        start_column: u32,
        start_lexeme: impl Into<String>,
    ) -> Self {
        Self {
            block_type: block_type.into(),
            start_line,
            start_column,
            start_lexeme: start_lexeme.into(),
        }
    }

    /// Multi-line "Caused by" text pointing at the opening brace.
    pub fn caused_by(&self) -> String {
        let line = self.start_line.to_string();
        let gutter = line.len().max(2);
        format!(
            "Unterminated {} starting at line {}:\n{:>gutter$} | {}\n{:gutter$} | {} unclosed block starts here",
            self.block_type,
            self.start_line,
            line,
            self.start_lexeme,
            "",
            "-".repeat(9),
        )
    }
}

/// A single reported error, fully assembled for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    pub error_code: ErrorCode,
    pub error_type: ErrorType,
    pub description: String,
    pub file_path: String,
    pub line: u32,
    /// 1-indexed, in characters.
    pub column: u32,
    pub problematic_token: String,
    pub stage: Stage,
    pub context_lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_context: Option<BlockContext>,
}

impl ErrorMessage {
    /// Start a message; code, type, hint and suggestion derive from the
    /// stage and description.
    pub fn new(stage: Stage, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            error_code: code::generate(stage, &description),
            error_type: stage.error_type(),
            hint: hints::hint_for(&description).map(str::to_string),
            suggestion: hints::suggestion_for(&description, ""),
            description,
            file_path: String::new(),
            line: 0,
            column: 0,
            problematic_token: String::new(),
            stage,
            context_lines: Vec::new(),
            caused_by: None,
            block_context: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_path = path.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.problematic_token = token.into();
        self.suggestion = hints::suggestion_for(&self.description, &self.problematic_token);
        self
    }

    pub fn with_block_context(mut self, block: BlockContext) -> Self {
        self.caused_by = Some(block.caused_by());
        self.block_context = Some(block);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Slice `before`/`after` lines of `source` around the error position.
    pub fn with_source(mut self, source: &str, before: usize, after: usize) -> Self {
        self.context_lines = context::context_lines(
            source,
            self.line,
            self.column,
            &self.problematic_token,
            before,
            after,
        );
        self
    }
}
