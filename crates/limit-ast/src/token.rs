//! Lexical tokens and the trivia attached to them.

use crate::span::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,
    Range,    // ..
    Ellipsis, // ...
    Arrow,    // -> and =>

    // operators
    Plus,
    Minus,
    Star,
    Slash,
    Modulus,
    Power, // **
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    ModulusEqual,
    Pipe,
    Ampersand,
    Caret,
    Tilde,
    At,

    // literals
    Identifier,
    IntLiteral,
    FloatLiteral,
    ScientificLiteral,
    String,
    InterpolationStart,
    InterpolationEnd,
    True,
    False,
    Nil,

    // type keywords
    IntType,
    Int8Type,
    Int16Type,
    Int32Type,
    Int64Type,
    Int128Type,
    UintType,
    Uint8Type,
    Uint16Type,
    Uint32Type,
    Uint64Type,
    Uint128Type,
    FloatType,
    Float32Type,
    Float64Type,
    StrType,
    BoolType,
    AnyType,
    ListType,
    ArrayType,
    DictType,
    OptionType,
    FunctionType,

    // structural keywords
    And,
    Or,
    Fn,
    Var,
    If,
    Elif,
    Else,
    While,
    For,
    Iter,
    In,
    Match,
    Class,
    Trait,
    Interface,
    Module,
    Enum,
    Type,
    Import,
    As,
    Show,
    Hide,
    Where,
    Parallel,
    Concurrent,
    Unsafe,
    Contract,
    Comptime,
    Ok,
    Err,
    Val,
    Print,
    Return,
    Break,
    Continue,
    This,
    SelfKw,
    Super,
    Default, // `_`

    // modifiers
    Pub,
    Prot,
    Const,
    Static,
    Abstract,
    Final,
    Data,

    // annotations
    AtPublic,
    AtPrivate,
    AtProtected,
    AtOpen,
    AtProperty,
    AtCache,

    // synthetic
    Error,
    Missing,
    Eof,
}

impl TokenKind {
    /// Map an identifier-shaped word to its keyword kind.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match word {
            "and" => And,
            "or" => Or,
            "fn" => Fn,
            "var" => Var,
            "if" => If,
            "elif" => Elif,
            "else" => Else,
            "while" => While,
            "for" => For,
            "iter" => Iter,
            "in" => In,
            "match" => Match,
            "class" => Class,
            "trait" => Trait,
            "interface" => Interface,
            "module" => Module,
            "enum" => Enum,
            "type" => Type,
            "import" => Import,
            "as" => As,
            "show" => Show,
            "hide" => Hide,
            "where" => Where,
            "parallel" => Parallel,
            "concurrent" => Concurrent,
            "unsafe" => Unsafe,
            "contract" => Contract,
            "comptime" => Comptime,
            "ok" => Ok,
            "err" => Err,
            "val" => Val,
            "print" => Print,
            "return" => Return,
            "break" => Break,
            "continue" => Continue,
            "this" => This,
            "self" => SelfKw,
            "super" => Super,
            "true" => True,
            "false" => False,
            "nil" => Nil,
            "pub" => Pub,
            "prot" => Prot,
            "const" => Const,
            "static" => Static,
            "abstract" => Abstract,
            "final" => Final,
            "data" => Data,
            "int" => IntType,
            "i8" => Int8Type,
            "i16" => Int16Type,
            "i32" => Int32Type,
            "i64" => Int64Type,
            "i128" => Int128Type,
            "uint" => UintType,
            "u8" => Uint8Type,
            "u16" => Uint16Type,
            "u32" => Uint32Type,
            "u64" => Uint64Type,
            "u128" => Uint128Type,
            "float" => FloatType,
            "f32" => Float32Type,
            "f64" => Float64Type,
            "str" => StrType,
            "bool" => BoolType,
            "any" => AnyType,
            "list" => ListType,
            "array" => ArrayType,
            "dict" => DictType,
            "option" => OptionType,
            "function" => FunctionType,
            _ => return None,
        };
        Some(kind)
    }

    /// Map the name after `@` to an annotation kind.
    pub fn annotation(name: &str) -> Option<TokenKind> {
        match name {
            "public" => Some(TokenKind::AtPublic),
            "private" => Some(TokenKind::AtPrivate),
            "protected" => Some(TokenKind::AtProtected),
            "open" => Some(TokenKind::AtOpen),
            "property" => Some(TokenKind::AtProperty),
            "cache" => Some(TokenKind::AtCache),
            _ => None,
        }
    }

    /// Primitive type keywords usable directly in type position.
    pub const fn is_primitive_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntType
                | Int8Type
                | Int16Type
                | Int32Type
                | Int64Type
                | Int128Type
                | UintType
                | Uint8Type
                | Uint16Type
                | Uint32Type
                | Uint64Type
                | Uint128Type
                | FloatType
                | Float32Type
                | Float64Type
                | StrType
                | BoolType
                | AnyType
                | Nil
        )
    }

    pub const fn is_number(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::ScientificLiteral
        )
    }

    pub const fn is_modifier(self) -> bool {
        use TokenKind::*;
        matches!(self, Pub | Prot | Const | Static | Abstract | Final | Data)
    }

    /// Canonical spelling of keywords and punctuation; `None` for
    /// literal-like kinds whose text lives in the lexeme.
    pub fn text(self) -> Option<&'static str> {
        use TokenKind::*;
        let text = match self {
            LeftParen => "(",
            RightParen => ")",
            LeftBrace => "{",
            RightBrace => "}",
            LeftBracket => "[",
            RightBracket => "]",
            Comma => ",",
            Dot => ".",
            Colon => ":",
            Semicolon => ";",
            Question => "?",
            Range => "..",
            Ellipsis => "...",
            Arrow => "->",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Modulus => "%",
            Power => "**",
            Bang => "!",
            BangEqual => "!=",
            Equal => "=",
            EqualEqual => "==",
            Greater => ">",
            GreaterEqual => ">=",
            Less => "<",
            LessEqual => "<=",
            PlusEqual => "+=",
            MinusEqual => "-=",
            StarEqual => "*=",
            SlashEqual => "/=",
            ModulusEqual => "%=",
            Pipe => "|",
            Ampersand => "&",
            Caret => "^",
            Tilde => "~",
            At => "@",
            True => "true",
            False => "false",
            Nil => "nil",
            IntType => "int",
            Int8Type => "i8",
            Int16Type => "i16",
            Int32Type => "i32",
            Int64Type => "i64",
            Int128Type => "i128",
            UintType => "uint",
            Uint8Type => "u8",
            Uint16Type => "u16",
            Uint32Type => "u32",
            Uint64Type => "u64",
            Uint128Type => "u128",
            FloatType => "float",
            Float32Type => "f32",
            Float64Type => "f64",
            StrType => "str",
            BoolType => "bool",
            AnyType => "any",
            ListType => "list",
            ArrayType => "array",
            DictType => "dict",
            OptionType => "option",
            FunctionType => "function",
            And => "and",
            Or => "or",
            Fn => "fn",
            Var => "var",
            If => "if",
            Elif => "elif",
            Else => "else",
            While => "while",
            For => "for",
            Iter => "iter",
            In => "in",
            Match => "match",
            Class => "class",
            Trait => "trait",
            Interface => "interface",
            Module => "module",
            Enum => "enum",
            Type => "type",
            Import => "import",
            As => "as",
            Show => "show",
            Hide => "hide",
            Where => "where",
            Parallel => "parallel",
            Concurrent => "concurrent",
            Unsafe => "unsafe",
            Contract => "contract",
            Comptime => "comptime",
            Ok => "ok",
            Err => "err",
            Val => "val",
            Print => "print",
            Return => "return",
            Break => "break",
            Continue => "continue",
            This => "this",
            SelfKw => "self",
            Super => "super",
            Default => "_",
            Pub => "pub",
            Prot => "prot",
            Const => "const",
            Static => "static",
            Abstract => "abstract",
            Final => "final",
            Data => "data",
            AtPublic => "@public",
            AtPrivate => "@private",
            AtProtected => "@protected",
            AtOpen => "@open",
            AtProperty => "@property",
            AtCache => "@cache",
            Identifier | IntLiteral | FloatLiteral | ScientificLiteral | String
            | InterpolationStart | InterpolationEnd | Error | Missing | Eof => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "'{text}'"),
            None => write!(f, "{self:?}"),
        }
    }
}

/// The kind of a piece of trivia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriviaKind {
    /// A run of spaces, tabs and carriage returns.
    Whitespace,
    /// A single `\n`.
    Newline,
    /// `// ...` up to (not including) the newline.
    LineComment,
    /// `/* ... */`, possibly unterminated at end of input.
    BlockComment,
}

impl TriviaKind {
    pub const fn is_comment(self) -> bool {
        matches!(self, TriviaKind::LineComment | TriviaKind::BlockComment)
    }

    pub const fn is_whitespace(self) -> bool {
        matches!(self, TriviaKind::Whitespace | TriviaKind::Newline)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text of the token.
    pub lexeme: String,
    /// Processed content for string-like tokens (escapes resolved).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub span: Span,
    /// 1-indexed line of the first byte.
    pub line: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading_trivia: Vec<Trivia>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailing_trivia: Vec<Trivia>,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            value: None,
            span,
            line,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }
    }

    /// A zero-width placeholder for a token the parser expected but did not find.
    pub fn missing(at: u32, line: u32) -> Self {
        Self::new(TokenKind::Missing, "", Span::empty(at), line)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Span covering the leading trivia, the lexeme and the trailing trivia.
    pub fn full_span(&self) -> Span {
        let start = self
            .leading_trivia
            .first()
            .map_or(self.span.start, |t| t.span.start);
        let end = self
            .trailing_trivia
            .last()
            .map_or(self.span.end, |t| t.span.end);
        Span::new(start, end)
    }

    /// Append the exact source bytes this token covers, trivia included.
    pub fn write_source(&self, out: &mut String) {
        for trivia in &self.leading_trivia {
            out.push_str(&trivia.text);
        }
        out.push_str(&self.lexeme);
        for trivia in &self.trailing_trivia {
            out.push_str(&trivia.text);
        }
    }

    pub fn comments(&self) -> impl Iterator<Item = &Trivia> {
        self.leading_trivia
            .iter()
            .chain(&self.trailing_trivia)
            .filter(|t| t.kind.is_comment())
    }
}

/// Concatenate the source text of a token sequence.
pub fn reconstruct(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.write_source(&mut out);
    }
    out
}
