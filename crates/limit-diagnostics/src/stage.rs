use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

/// The compiler phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Scanning,
    Parsing,
    Syntax,
    Semantic,
    Bytecode,
    Interpreting,
    Compiling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorType {
    LexicalError,
    SyntaxError,
    SemanticError,
    RuntimeError,
    BytecodeError,
    CompilationError,
}

impl Stage {
    pub const fn error_type(self) -> ErrorType {
        match self {
            Stage::Scanning => ErrorType::LexicalError,
            Stage::Parsing | Stage::Syntax => ErrorType::SyntaxError,
            Stage::Semantic => ErrorType::SemanticError,
            Stage::Bytecode => ErrorType::BytecodeError,
            Stage::Interpreting => ErrorType::RuntimeError,
            Stage::Compiling => ErrorType::CompilationError,
        }
    }

    /// Numeric range of the `Exxx` codes owned by this stage.
    pub const fn code_range(self) -> RangeInclusive<u16> {
        match self {
            Stage::Scanning => 1..=99,
            Stage::Parsing | Stage::Syntax => 100..=199,
            Stage::Semantic => 200..=299,
            Stage::Bytecode => 300..=399,
            Stage::Interpreting => 400..=499,
            Stage::Compiling => 500..=599,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
