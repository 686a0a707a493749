//! Deterministic `Exxx` error codes.
//!
//! Well-known descriptions map to fixed codes through [`KNOWN_CODES`]. Any
//! other description hashes into the upper half of its stage's range, so
//! the same `(stage, description)` pair yields the same code in every run.

use crate::stage::Stage;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Reserved for the parser's error-cap diagnostic.
    pub const TOO_MANY_ERRORS: ErrorCode = ErrorCode(199);

    pub const fn new(number: u16) -> Self {
        Self(number)
    }

    pub const fn number(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", self.0)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Substring to code, checked in order; the first entry inside the stage's
/// range wins.
///
/// Only these codes are unique. A description with no entry gets a hashed
/// code from [`generate`], and two different descriptions in the same stage
/// may hash to the same one.
const KNOWN_CODES: &[(&str, u16)] = &[
    // scanning
    ("Invalid character", 1),
    ("Unexpected character", 1),
    ("Unterminated string interpolation", 6),
    ("Unterminated string", 2),
    ("Unterminated comment", 3),
    ("Invalid number format", 4),
    ("Invalid escape sequence", 5),
    // syntax
    ("Too many syntax errors", 199),
    ("Expected '}'", 102),
    ("Unexpected closing brace", 102),
    ("Unexpected token", 100),
    ("Missing opening brace", 103),
    ("Missing closing brace", 104),
    ("Invalid factor", 105),
    ("Missing semicolon", 106),
    ("Expected expression", 107),
    ("Invalid expression", 107),
    ("Invalid statement", 108),
    ("Unexpected end of file", 109),
    ("Invalid function declaration", 110),
    ("Invalid parameter", 111),
    ("Invalid variable declaration", 112),
    ("Invalid tuple index", 113),
    ("Unknown parameter", 114),
    ("Invalid assignment target", 115),
    ("Expected", 101),
    // semantic
    ("Variable/function not found", 200),
    // E200 is the lookup catch-all; a named undefined variable is E201.
    ("Undefined variable", 201),
    ("Undefined function", 202),
    ("Variable already declared", 203),
    ("Function already declared", 204),
    ("Type mismatch", 205),
    ("Invalid assignment", 206),
    ("Invalid function call", 207),
    ("Wrong number of arguments", 208),
    ("Invalid return type", 209),
    // bytecode
    ("Invalid bytecode instruction", 300),
    ("Bytecode generation failed", 301),
    ("Invalid opcode", 302),
    ("Bytecode optimization error", 303),
    ("Type mismatch", 304),
    // runtime
    ("Division by zero", 400),
    ("Modulo by zero", 401),
    ("Invalid value stack for unary operation", 402),
    ("Invalid value stack for binary operation", 403),
    ("Unsupported type for NEGATE operation", 404),
    ("Unsupported type for NOT operation", 405),
    ("Unsupported types for binary operation", 406),
    ("Insufficient value stack for logical operation", 407),
    ("Unsupported types for logical operation", 408),
    ("Insufficient value stack for comparison operation", 409),
    ("Unsupported types for comparison operation", 410),
    ("Invalid variable index", 411),
    ("value stack underflow", 412),
    ("Invalid jump offset type", 413),
    ("JUMP_IF_FALSE requires a boolean condition", 414),
    ("Stack overflow", 415),
    ("Null reference", 416),
    ("Out of bounds access", 417),
    // compiling
    ("Compilation failed", 500),
    ("Linker error", 501),
    ("Missing dependency", 502),
];

/// Code for `(stage, description)`. Pure: equal inputs give equal codes,
/// but fallback codes are not unique across descriptions.
pub fn generate(stage: Stage, description: &str) -> ErrorCode {
    let range = stage.code_range();
    let known = KNOWN_CODES
        .iter()
        .filter(|(_, code)| range.contains(code))
        .find(|(pattern, _)| description.contains(pattern));
    if let Some(&(_, code)) = known {
        return ErrorCode(code);
    }

    // Upper half of the range, minus the last slot.
    let start = range.start() + 50;
    let width = u64::from(range.end() - start);
    let offset = fnv1a(description.as_bytes()) % width;
    ErrorCode(start + offset as u16)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn well_known_codes() {
        assert_eq!(generate(Stage::Scanning, "Unexpected character '$'").to_string(), "E001");
        assert_eq!(generate(Stage::Syntax, "Expected '}' after block.").to_string(), "E102");
        assert_eq!(generate(Stage::Parsing, "Expected ';' after value.").to_string(), "E101");
        assert_eq!(generate(Stage::Semantic, "Undefined variable 'x'").to_string(), "E201");
        assert_eq!(generate(Stage::Interpreting, "Division by zero").to_string(), "E400");
        assert_eq!(
            generate(Stage::Syntax, "Too many syntax errors; aborting parse."),
            ErrorCode::TOO_MANY_ERRORS
        );
    }

    #[test]
    fn undefined_variable_is_distinct_from_lookup_catch_all() {
        let undefined = generate(Stage::Semantic, "Undefined variable");
        assert_eq!(undefined.to_string(), "E201");
        assert_eq!(
            generate(Stage::Semantic, "Variable/function not found: x").to_string(),
            "E200"
        );
        assert_ne!(undefined, generate(Stage::Semantic, "Undefined function 'f'"));
    }

    #[test]
    fn unknown_descriptions_hash_into_upper_half() {
        let code = generate(Stage::Syntax, "Something nobody listed.").number();
        assert!((150..199).contains(&code), "{code}");
    }

    #[test]
    fn shared_descriptions_respect_stage_range() {
        assert_eq!(generate(Stage::Semantic, "Type mismatch").number(), 205);
        assert_eq!(generate(Stage::Bytecode, "Type mismatch").number(), 304);
    }

    #[test]
    fn interpolation_is_not_a_plain_unterminated_string() {
        assert_eq!(
            generate(Stage::Scanning, "Unterminated string interpolation").number(),
            6
        );
    }

    proptest! {
        #[test]
        fn generation_is_idempotent_and_in_range(desc in "[ -~]{0,40}", stage_index in 0usize..7) {
            let stage = [
                Stage::Scanning,
                Stage::Parsing,
                Stage::Syntax,
                Stage::Semantic,
                Stage::Bytecode,
                Stage::Interpreting,
                Stage::Compiling,
            ][stage_index];
            let first = generate(stage, &desc);
            prop_assert_eq!(first, generate(stage, &desc));
            prop_assert!(stage.code_range().contains(&first.number()));
        }
    }
}
