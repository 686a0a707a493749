use limit_ast::token::{TokenKind, TriviaKind};
use limit_diagnostics::Diagnostics;
use limit_parse::{scan, ScanMode, TokenStream};

fn lossy(src: &str) -> (TokenStream, Diagnostics) {
    let mut diags = Diagnostics::new();
    let tokens = scan(src, ScanMode::Lossy, "<mem>", &mut diags);
    (tokens, diags)
}

fn kinds(src: &str) -> Vec<TokenKind> {
    lossy(src).0.tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn stream_ends_with_single_eof() {
    let (stream, diags) = lossy("var x = 1;");
    assert!(diags.is_empty());
    let eofs = stream.tokens.iter().filter(|t| t.is(TokenKind::Eof)).count();
    assert_eq!(eofs, 1);
    assert!(stream.tokens.last().is_some_and(|t| t.is(TokenKind::Eof)));

    let (empty, _) = lossy("");
    assert_eq!(empty.tokens.len(), 1);
}

#[test]
fn keywords_types_and_identifiers() {
    use TokenKind::*;
    assert_eq!(
        kinds("var name: str = nil"),
        vec![Var, Identifier, Colon, StrType, Equal, Nil, Eof]
    );
    assert_eq!(
        kinds("task worker self this _"),
        vec![Identifier, Identifier, SelfKw, This, Default, Eof]
    );
    assert_eq!(kinds("i8 u64 f32 uint"), vec![Int8Type, Uint64Type, Float32Type, UintType, Eof]);
}

#[test]
fn numbers_keep_their_spelling() {
    let (stream, _) = lossy("42 3.14 1e10 2.5E-3 250ms 5s 7 .5");
    let toks: Vec<(TokenKind, &str)> = stream
        .tokens
        .iter()
        .map(|t| (t.kind, t.lexeme.as_str()))
        .collect();
    use TokenKind::*;
    assert_eq!(
        toks,
        vec![
            (IntLiteral, "42"),
            (FloatLiteral, "3.14"),
            (ScientificLiteral, "1e10"),
            (ScientificLiteral, "2.5E-3"),
            (IntLiteral, "250ms"),
            (IntLiteral, "5s"),
            (IntLiteral, "7"),
            (Dot, "."),
            (IntLiteral, "5"),
            (Eof, ""),
        ]
    );
}

#[test]
fn exponent_without_digits_backs_off() {
    use TokenKind::*;
    assert_eq!(kinds("1e"), vec![IntLiteral, Identifier, Eof]);
    assert_eq!(kinds("2sec"), vec![IntLiteral, Identifier, Eof]);
}

#[test]
fn operators_and_punctuation() {
    use TokenKind::*;
    assert_eq!(
        kinds("== != <= >= += -= *= /= %= ** .. ... -> => ? | & ^ ~"),
        vec![
            EqualEqual,
            BangEqual,
            LessEqual,
            GreaterEqual,
            PlusEqual,
            MinusEqual,
            StarEqual,
            SlashEqual,
            ModulusEqual,
            Power,
            Range,
            Ellipsis,
            Arrow,
            Arrow,
            Question,
            Pipe,
            Ampersand,
            Caret,
            Tilde,
            Eof,
        ]
    );
}

#[test]
fn annotations() {
    use TokenKind::*;
    assert_eq!(
        kinds("@public @private @protected @open @property @cache"),
        vec![AtPublic, AtPrivate, AtProtected, AtOpen, AtProperty, AtCache, Eof]
    );
    assert_eq!(kinds("@inline"), vec![At, Identifier, Eof]);
}

#[test]
fn string_escapes() {
    let (stream, diags) = lossy(r#""a\tb\n\"q\" \{x\} \q""#);
    assert!(diags.is_empty());
    let tok = &stream.tokens[0];
    assert!(tok.is(TokenKind::String));
    assert_eq!(tok.value.as_deref(), Some("a\tb\n\"q\" {x} \\q"));
}

#[test]
fn single_quoted_strings() {
    let (stream, _) = lossy("'hi'");
    assert!(stream.tokens[0].is(TokenKind::String));
    assert_eq!(stream.tokens[0].value.as_deref(), Some("hi"));
}

#[test]
fn lines_are_counted() {
    let (stream, _) = lossy("a\n\nb /* x\ny */ c");
    let lines: Vec<u32> = stream.tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, vec![1, 3, 4, 4]);
}

#[test]
fn comments_are_dropped_in_lossy_mode() {
    let (stream, _) = lossy("// lead\nx // tail\n/* block */ y");
    assert_eq!(stream.tokens.len(), 3);
    assert!(stream.tokens.iter().all(|t| t.leading_trivia.is_empty()));
}

#[test]
fn unterminated_comment_is_reported() {
    let (_, diags) = lossy("x /* never closed");
    assert_eq!(diags.len(), 1);
    let msg = &diags.messages()[0];
    assert_eq!(msg.description, "Unterminated comment.");
    assert_eq!(msg.error_type.to_string(), "LexicalError");
    assert_eq!(msg.error_code.to_string(), "E003");
}

#[test]
fn unterminated_string_is_reported_once() {
    let (stream, diags) = lossy("var s = \"abc");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags.messages()[0].description, "Unterminated string.");
    assert!(stream.tokens.iter().any(|t| t.is(TokenKind::Error)));
}

#[test]
fn unexpected_character_depends_on_mode() {
    let (stream, diags) = lossy("a $ b");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags.messages()[0].description, "Unexpected character '$'");
    assert_eq!(diags.messages()[0].column, 3);
    assert!(!stream.tokens.iter().any(|t| t.is(TokenKind::Error)));

    let mut diags = Diagnostics::new();
    let stream = scan("a $ b", ScanMode::Cst, "<mem>", &mut diags);
    let error = stream.tokens.iter().find(|t| t.is(TokenKind::Error));
    assert_eq!(error.map(|t| t.lexeme.as_str()), Some("$"));
}

#[test]
fn cst_mode_attaches_trivia() {
    let mut diags = Diagnostics::new();
    let src = "// header\nvar x = 1; // trailing\n";
    let stream = scan(src, ScanMode::Cst, "<mem>", &mut diags);
    let var = &stream.tokens[0];
    let lead: Vec<TriviaKind> = var.leading_trivia.iter().map(|t| t.kind).collect();
    assert_eq!(lead, vec![TriviaKind::LineComment, TriviaKind::Newline]);
    assert_eq!(var.trailing_trivia[0].kind, TriviaKind::Whitespace);

    let semi = &stream.tokens[4];
    assert!(semi.is(TokenKind::Semicolon));
    assert!(semi.comments().any(|c| c.text == "// trailing"));

    let eof = stream.tokens.last().map(|t| t.leading_trivia.len());
    assert_eq!(eof, Some(1), "final newline hangs off Eof");
    assert_eq!(stream.reconstruct(), src);
}

#[test]
fn spans_cover_lexemes() {
    let (stream, _) = lossy("fn  add(a)");
    for tok in &stream.tokens {
        let text = &"fn  add(a)"[tok.span.range()];
        assert_eq!(text, tok.lexeme);
    }
}
