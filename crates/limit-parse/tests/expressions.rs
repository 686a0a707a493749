use limit_ast::ast::{
    AssignOp, AssignTarget, BinaryOp, Expr, ExprKind, Literal, StmtKind, UnaryOp,
};
use limit_diagnostics::Diagnostics;
use limit_parse::{parse_source, parse_str, ParserConfig};

fn val(src: &str) -> Expr {
    let program = parse_str("<mem>", &format!("var v = {src};")).unwrap();
    let StmtKind::Var(decl) = &program.statements[0].kind else {
        panic!("expected var declaration");
    };
    decl.initializer.clone().expect("initializer")
}

fn stmt_expr(src: &str) -> Expr {
    let program = parse_str("<mem>", src).unwrap();
    let StmtKind::Expression(expr) = &program.statements[0].kind else {
        panic!("expected expression statement");
    };
    expr.clone()
}

fn int(e: &Expr) -> &str {
    match &e.kind {
        ExprKind::Literal(Literal::Int(s)) => s,
        other => panic!("expected int literal, got {other:?}"),
    }
}

fn bin(e: &Expr) -> (&Expr, BinaryOp, &Expr) {
    match &e.kind {
        ExprKind::Binary { left, op, right } => (left, *op, right),
        other => panic!("expected binary, got {other:?}"),
    }
}

#[test]
fn precedence_layers() {
    // ((1 + (2 * 3)) == 7 and 4 < 5) or false
    let e = val("1 + 2 * 3 == 7 and 4 < 5 or false");
    let (lhs, op, rhs) = bin(&e);
    assert_eq!(op, BinaryOp::Or);
    assert!(matches!(rhs.kind, ExprKind::Literal(Literal::Bool(false))));

    let (eq, op, lt) = bin(lhs);
    assert_eq!(op, BinaryOp::And);
    assert_eq!(bin(lt).1, BinaryOp::Lt);

    let (sum, op, seven) = bin(eq);
    assert_eq!(op, BinaryOp::Eq);
    assert_eq!(int(seven), "7");

    let (one, op, product) = bin(sum);
    assert_eq!(op, BinaryOp::Add);
    assert_eq!(int(one), "1");
    assert_eq!(bin(product).1, BinaryOp::Mul);
}

#[test]
fn arithmetic_is_left_associative() {
    let e = val("10 - 3 - 2");
    let (lhs, op, rhs) = bin(&e);
    assert_eq!(op, BinaryOp::Sub);
    assert_eq!(int(rhs), "2");
    assert_eq!(bin(lhs).1, BinaryOp::Sub);
}

#[test]
fn power_is_right_associative() {
    let e = val("2 ** 3 ** 2");
    let (base, op, exponent) = bin(&e);
    assert_eq!(op, BinaryOp::Pow);
    assert_eq!(int(base), "2");
    let (three, op, two) = bin(exponent);
    assert_eq!(op, BinaryOp::Pow);
    assert_eq!((int(three), int(two)), ("3", "2"));
}

#[test]
fn power_binds_tighter_than_factor_and_takes_unary_base() {
    let e = val("2 * 3 ** 2");
    let (_, op, rhs) = bin(&e);
    assert_eq!(op, BinaryOp::Mul);
    assert_eq!(bin(rhs).1, BinaryOp::Pow);

    let e = val("-2 ** 2");
    let (base, op, _) = bin(&e);
    assert_eq!(op, BinaryOp::Pow);
    assert!(matches!(base.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
}

#[test]
fn unary_nests() {
    let e = val("!-x");
    let ExprKind::Unary { op, operand } = &e.kind else {
        panic!("expected unary");
    };
    assert_eq!(*op, UnaryOp::Not);
    assert!(matches!(operand.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
}

#[test]
fn assignment_is_right_associative() {
    let e = stmt_expr("a = b = 1;");
    let ExprKind::Assign { target, op, value } = &e.kind else {
        panic!("expected assignment");
    };
    assert_eq!(*target, AssignTarget::Variable("a".into()));
    assert_eq!(*op, AssignOp::Assign);
    assert!(matches!(
        &value.kind,
        ExprKind::Assign { target: AssignTarget::Variable(b), .. } if b == "b"
    ));
}

#[test]
fn compound_assignment_to_member_and_index() {
    let e = stmt_expr("obj.count += 1;");
    assert!(matches!(
        &e.kind,
        ExprKind::Assign { target: AssignTarget::Member { name, .. }, op: AssignOp::AddAssign, .. }
            if name == "count"
    ));

    let e = stmt_expr("xs[0] %= 2;");
    assert!(matches!(
        &e.kind,
        ExprKind::Assign { target: AssignTarget::Index { .. }, op: AssignOp::ModAssign, .. }
    ));
}

#[test]
fn invalid_assignment_target_keeps_both_sides() {
    let src = "1 + 2 = 3;";
    let mut diags = Diagnostics::new();
    let result = parse_source(src, "<mem>", ParserConfig::with_cst(), &mut diags);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].description, "Invalid assignment target.");
    let StmtKind::Expression(expr) = &result.program.statements[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign {
        target: AssignTarget::Invalid(target),
        op: AssignOp::Assign,
        value,
    } = &expr.kind
    else {
        panic!("expected assignment over an invalid target, got {:?}", expr.kind);
    };
    assert_eq!(bin(target).1, BinaryOp::Add);
    assert_eq!(value.kind, ExprKind::Literal(Literal::Int("3".into())));
    assert_eq!(&src[expr.span.range()], "1 + 2 = 3");

    let cst = result.cst.expect("cst");
    let assign = cst.descendants(limit_ast::cst::NodeKind::AssignExpr);
    assert_eq!(assign.len(), 1);
    assert_eq!(assign[0].text(), "1+2=3");
}

#[test]
fn calls_with_named_arguments() {
    let e = val("f(1, name = 2)");
    let ExprKind::Call {
        callee,
        args,
        named_args,
    } = &e.kind
    else {
        panic!("expected call");
    };
    assert!(matches!(&callee.kind, ExprKind::Variable(n) if n == "f"));
    assert_eq!(args.len(), 1);
    assert_eq!(named_args.len(), 1);
    assert_eq!(named_args[0].0, "name");
    assert_eq!(int(&named_args[0].1), "2");
}

#[test]
fn postfix_chain() {
    // ((a.b)(x))[0]
    let e = val("a.b(x)[0]");
    let ExprKind::Index { object, index } = &e.kind else {
        panic!("expected index");
    };
    assert_eq!(int(index), "0");
    let ExprKind::Call { callee, .. } = &object.kind else {
        panic!("expected call");
    };
    assert!(matches!(&callee.kind, ExprKind::Member { name, .. } if name == "b"));
}

#[test]
fn tuple_index_uses_integer_key() {
    let e = val("pair.0");
    let ExprKind::Index { object, index } = &e.kind else {
        panic!("expected index");
    };
    assert!(matches!(&object.kind, ExprKind::Variable(n) if n == "pair"));
    assert_eq!(int(index), "0");
}

#[test]
fn tuple_index_must_be_an_integer() {
    let mut diags = Diagnostics::new();
    let result = parse_source("var v = t.1.5;", "<mem>", ParserConfig::default(), &mut diags);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].description, "Invalid tuple index: 1.5");
}

#[test]
fn self_and_this_are_the_same_receiver() {
    for src in ["self.x", "this.x"] {
        let e = val(src);
        let ExprKind::Member { object, .. } = &e.kind else {
            panic!("expected member");
        };
        assert_eq!(object.kind, ExprKind::This);
    }
}

#[test]
fn fallible_postfix_and_else_handler() {
    let e = val("read()?");
    assert!(matches!(
        &e.kind,
        ExprKind::Fallible { else_var: None, else_handler: None, .. }
    ));

    let e = val("read()? else e { print(e); }");
    let ExprKind::Fallible {
        expr,
        else_var,
        else_handler,
    } = &e.kind
    else {
        panic!("expected fallible");
    };
    assert!(matches!(expr.kind, ExprKind::Call { .. }));
    assert_eq!(else_var.as_deref(), Some("e"));
    assert!(matches!(
        else_handler.as_deref().map(|s| &s.kind),
        Some(StmtKind::Block(_))
    ));
}

#[test]
fn fallible_else_without_variable() {
    let program = parse_str("<mem>", "var v = read()? else return 0;").unwrap();
    let StmtKind::Var(decl) = &program.statements[0].kind else {
        panic!("expected var declaration");
    };
    let Some(ExprKind::Fallible {
        else_var,
        else_handler,
        ..
    }) = decl.initializer.as_ref().map(|e| &e.kind)
    else {
        panic!("expected fallible");
    };
    assert!(else_var.is_none());
    assert!(matches!(
        else_handler.as_deref().map(|s| &s.kind),
        Some(StmtKind::Return(Some(_)))
    ));
}

#[test]
fn range_is_inclusive() {
    let e = val("1..n + 1");
    let ExprKind::Range {
        start,
        end,
        step,
        inclusive,
    } = &e.kind
    else {
        panic!("expected range");
    };
    assert_eq!(int(start), "1");
    assert_eq!(bin(end).1, BinaryOp::Add);
    assert!(step.is_none());
    assert!(*inclusive);
}

#[test]
fn numeric_literals_keep_spelling() {
    assert!(matches!(val("250ms").kind, ExprKind::Literal(Literal::Int(ref s)) if s == "250ms"));
    assert!(matches!(val("1.50").kind, ExprKind::Literal(Literal::Float(ref s)) if s == "1.50"));
    assert!(
        matches!(val("6e2").kind, ExprKind::Literal(Literal::Scientific(ref s)) if s == "6e2")
    );
    assert_eq!(val("nil").kind, ExprKind::Literal(Literal::Nil));
}

#[test]
fn tuples_groupings_and_collections() {
    assert_eq!(val("()").kind, ExprKind::Tuple(Vec::new()));
    assert!(matches!(val("(1)").kind, ExprKind::Grouping(_)));
    assert!(matches!(val("(1, 2,)").kind, ExprKind::Tuple(ref v) if v.len() == 2));
    assert!(matches!(val("[1, 2, 3]").kind, ExprKind::List(ref v) if v.len() == 3));
    assert!(matches!(val("[]").kind, ExprKind::List(ref v) if v.is_empty()));

    let e = val(r#"{"a": 1, "b": 2}"#);
    let ExprKind::Dict(entries) = &e.kind else {
        panic!("expected dict");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0.kind, ExprKind::Literal(Literal::Str("a".into())));
}

#[test]
fn identifier_before_brace_is_object_literal() {
    let e = val("Point { x: 1, y: 2 }");
    let ExprKind::Object {
        constructor,
        fields,
    } = &e.kind
    else {
        panic!("expected object literal");
    };
    assert_eq!(constructor, "Point");
    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["x", "y"]);
}

#[test]
fn lambda_with_typed_and_default_params() {
    let e = val("fn (a: int, b = 2): int { return a + b; }");
    let ExprKind::Lambda {
        params,
        return_type,
        body,
    } = &e.kind
    else {
        panic!("expected lambda");
    };
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(return_type.as_ref().map(|t| t.type_name()), Some("int"));
    assert_eq!(body.statements.len(), 1);
}

#[test]
fn ok_and_err_construction() {
    assert!(matches!(val("ok(1)").kind, ExprKind::OkConstruct(_)));

    let e = val(r#"err(ParseError("bad", 3))"#);
    let ExprKind::ErrorConstruct { error_type, args } = &e.kind else {
        panic!("expected err construct");
    };
    assert_eq!(error_type, "ParseError");
    assert_eq!(args.len(), 2);

    let e = val("err(Error)");
    assert!(matches!(e.kind, ExprKind::ErrorConstruct { ref args, .. } if args.is_empty()));
}

#[test]
fn spans_cover_operands() {
    let src = "var v = 1 + 2;";
    let e = val("1 + 2");
    assert_eq!(&src[e.span.range()], "1 + 2");
    let (lhs, _, rhs) = bin(&e);
    assert_eq!(&src[lhs.span.range()], "1");
    assert_eq!(&src[rhs.span.range()], "2");
}
