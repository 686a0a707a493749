use limit_ast::ast::{BinaryOp, ExprKind, Literal, StmtKind, StringPart, TypeKind};
use limit_diagnostics::{Diagnostics, ErrorMessage, ErrorType, Stage};
use limit_parse::{parse_source, parse_str, ParserConfig};

#[test]
fn simple_assignment_round_trip() {
    let src = "var x: int = 1 + 2;";
    let mut diags = Diagnostics::new();
    let result = parse_source(src, "<mem>", ParserConfig::with_cst(), &mut diags);
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let [stmt] = result.program.statements.as_slice() else {
        panic!("expected one statement");
    };
    let StmtKind::Var(decl) = &stmt.kind else {
        panic!("expected var declaration");
    };
    assert_eq!(decl.name, "x");
    assert_eq!(
        decl.ty.as_ref().map(|t| &t.kind),
        Some(&TypeKind::Primitive("int".into()))
    );
    let Some(ExprKind::Binary { left, op, right }) = decl.initializer.as_ref().map(|e| &e.kind)
    else {
        panic!("expected binary initializer");
    };
    assert_eq!(left.kind, ExprKind::Literal(Literal::Int("1".into())));
    assert_eq!(*op, BinaryOp::Add);
    assert_eq!(op.symbol(), "+");
    assert_eq!(right.kind, ExprKind::Literal(Literal::Int("2".into())));

    assert_eq!(result.cst.map(|c| c.reconstruct()).as_deref(), Some(src));
}

#[test]
fn interpolated_string_parts() {
    let program = parse_str("<mem>", r#"var s = "a={a}, b={b + 1}";"#).unwrap();
    let StmtKind::Var(decl) = &program.statements[0].kind else {
        panic!("expected var declaration");
    };
    let Some(ExprKind::InterpolatedString(parts)) = decl.initializer.as_ref().map(|e| &e.kind)
    else {
        panic!("expected interpolated string");
    };
    let shape: Vec<String> = parts
        .iter()
        .map(|p| match p {
            StringPart::Str(s) => format!("{s:?}"),
            StringPart::Expr(e) => e.kind.name().to_string(),
        })
        .collect();
    assert_eq!(
        shape,
        ["\"a=\"", "VariableExpr", "\", b=\"", "BinaryExpr", "\"\""]
    );
}

#[test]
fn unterminated_function() {
    let mut diags = Diagnostics::new();
    let result = parse_source(
        "fn f() {\n  var x = 1;\n",
        "<mem>",
        ParserConfig::default(),
        &mut diags,
    );
    assert_eq!(result.errors.len(), 1);
    let e = &result.errors[0];
    assert_eq!(e.error_type, ErrorType::SyntaxError);
    assert_eq!(e.error_type.to_string(), "SyntaxError");
    assert!(e.description.contains("Expected '}'"), "{}", e.description);
    let caused_by = e.caused_by.as_deref().expect("caused by");
    assert!(caused_by.contains("line 1"), "{caused_by}");
    assert_eq!(e.block_context.as_ref().map(|b| b.start_line), Some(1));

    let StmtKind::Function(f) = &result.program.statements[0].kind else {
        panic!("expected function declaration");
    };
    assert_eq!(f.name, "f");
    assert_eq!(f.body.as_ref().map(|b| b.statements.len()), Some(1));
}

#[test]
fn optional_and_fallible_return_types() {
    let program = parse_str("<mem>", "fn g(): int? ParseError { return ok(0); }").unwrap();
    let StmtKind::Function(f) = &program.statements[0].kind else {
        panic!("expected function declaration");
    };
    let ret = f.return_type.as_ref().expect("return type");
    assert!(ret.fallible);
    assert!(!ret.optional);
    assert_eq!(ret.error_types, ["ParseError"]);
    assert!(f.can_fail);
    assert_eq!(f.declared_error_types, ["ParseError"]);
}

#[test]
fn brace_types_split_into_dict_and_structural() {
    let program = parse_str("<mem>", "type M = { str: int };\ntype R = { name: str };").unwrap();
    let aliases: Vec<_> = program
        .statements
        .iter()
        .map(|s| match &s.kind {
            StmtKind::TypeAlias { ty, .. } => ty.clone(),
            other => panic!("expected type alias, got {other:?}"),
        })
        .collect();

    let m = &aliases[0];
    assert!(m.is_dict());
    assert_eq!(m.key_type().map(|t| t.type_name()), Some("str"));
    assert_eq!(m.value_type().map(|t| t.type_name()), Some("int"));

    let r = &aliases[1];
    assert!(r.is_structural());
    let fields = r.structural_fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "name");
    assert_eq!(fields[0].ty.type_name(), "str");
}

#[test]
fn duplicate_reports_are_dropped() {
    let mut diags = Diagnostics::new();
    let message = ErrorMessage::new(Stage::Syntax, "Expected ';' after value.")
        .at(3, 7)
        .with_file("main.lm");
    assert!(diags.report(message.clone(), None));
    assert!(!diags.report(message, None));
    assert_eq!(diags.len(), 1);
}
