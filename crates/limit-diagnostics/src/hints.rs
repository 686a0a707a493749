//! Static hint and suggestion table, keyed by description substrings.

struct Entry {
    patterns: &'static [&'static str],
    hint: &'static str,
    /// `{token}` is replaced by the problematic token.
    suggestion: &'static str,
}

const TABLE: &[Entry] = &[
    Entry {
        patterns: &["Invalid character", "Unexpected character"],
        hint: "This character is not part of the Limit language.",
        suggestion: "Remove '{token}' or replace it with a valid token.",
    },
    Entry {
        patterns: &["Unterminated string interpolation"],
        hint: "An interpolation `{...}` inside a string must be closed before the string ends.",
        suggestion: "Close the interpolation with '}' and the string with '\"'.",
    },
    Entry {
        patterns: &["Unterminated string"],
        hint: "String literals must be enclosed in matching double quotes.",
        suggestion: "Add a closing quote (\") at the end of the string literal.",
    },
    Entry {
        patterns: &["Unterminated comment"],
        hint: "Block comments opened with `/*` must be closed with `*/`.",
        suggestion: "Add `*/` where the comment should end.",
    },
    Entry {
        patterns: &["Invalid number format"],
        hint: "Numbers are integers (123), decimals (1.5) or use an exponent (1e9).",
        suggestion: "Check the digits of '{token}'.",
    },
    Entry {
        patterns: &["Too many syntax errors"],
        hint: "Parsing stops after too many errors to avoid cascading reports.",
        suggestion: "Fix the first errors and run again.",
    },
    Entry {
        patterns: &["Unexpected closing brace"],
        hint: "This closing brace '}' has no matching opening brace '{'.",
        suggestion: "Either remove this extra '}' or add a matching '{' before it.",
    },
    Entry {
        patterns: &["Expected '}'", "Missing closing brace"],
        hint: "Every block opened with '{' must be closed with a matching '}'.",
        suggestion: "Add a closing brace '}' to end the block.",
    },
    Entry {
        patterns: &["Expected '{'", "Missing opening brace"],
        hint: "Functions, classes, loops and conditionals need a body in braces.",
        suggestion: "Add an opening brace '{' to start the block.",
    },
    Entry {
        patterns: &["Expected ';'", "Missing semicolon"],
        hint: "Statements must end with a semicolon.",
        suggestion: "Add a semicolon `;` at the end of the statement.",
    },
    Entry {
        patterns: &["Expected ')'"],
        hint: "Every '(' needs a matching ')'.",
        suggestion: "Add ')' to close the parenthesis.",
    },
    Entry {
        patterns: &["Expected ']'"],
        hint: "Every '[' needs a matching ']'.",
        suggestion: "Add ']' to close the bracket.",
    },
    Entry {
        patterns: &["Expected expression", "Invalid expression", "Invalid factor"],
        hint: "An expression is a value, a variable, a call or an operation between them.",
        suggestion: "Write an expression before '{token}'.",
    },
    Entry {
        patterns: &["Invalid assignment target"],
        hint: "Only variables, fields and indexed elements can be assigned to.",
        suggestion: "Assign to a variable, a field or an index expression.",
    },
    Entry {
        patterns: &["Invalid tuple index"],
        hint: "Tuple elements are accessed with a non-negative integer such as `t.0`.",
        suggestion: "Use an integer index after the dot.",
    },
    Entry {
        patterns: &["Invalid parameter name"],
        hint: "Type names are reserved and cannot name a parameter.",
        suggestion: "Rename the parameter '{token}'.",
    },
    Entry {
        patterns: &["Unknown parameter"],
        hint: "Concurrency blocks accept ch, mode, cores, on_error, timeout, grace and on_timeout.",
        suggestion: "Remove '{token}' or use one of the supported parameters.",
    },
    Entry {
        patterns: &["Undefined variable", "Variable/function not found"],
        hint: "Variables must be declared before they are used.",
        suggestion: "Check the spelling of '{token}' or declare it with `var {token}: type = value;`.",
    },
    Entry {
        patterns: &["Undefined function"],
        hint: "Functions must be defined or imported before they are called.",
        suggestion: "Define the function '{token}' or import the module that provides it.",
    },
    Entry {
        patterns: &["Type mismatch"],
        hint: "Both sides of an operation must have compatible types.",
        suggestion: "Convert one of the values explicitly.",
    },
    Entry {
        patterns: &["Division by zero", "Modulo by zero"],
        hint: "Dividing by zero has no defined result.",
        suggestion: "Check that the divisor is not zero before dividing.",
    },
];

fn lookup(description: &str) -> Option<&'static Entry> {
    TABLE
        .iter()
        .find(|e| e.patterns.iter().any(|p| description.contains(p)))
}

pub fn hint_for(description: &str) -> Option<&'static str> {
    lookup(description).map(|e| e.hint)
}

pub fn suggestion_for(description: &str, token: &str) -> Option<String> {
    lookup(description).map(|e| e.suggestion.replace("{token}", token))
}
