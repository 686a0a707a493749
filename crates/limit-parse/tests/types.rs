use limit_ast::ast::{StmtKind, TypeAnnotation, TypeKind};
use limit_diagnostics::Diagnostics;
use limit_parse::{parse_source, parse_str, ParserConfig};

fn alias(src: &str) -> TypeAnnotation {
    let program = parse_str("<mem>", &format!("type T = {src};")).unwrap();
    let StmtKind::TypeAlias { ty, .. } = &program.statements[0].kind else {
        panic!("expected type alias");
    };
    ty.clone()
}

fn names(members: &[TypeAnnotation]) -> Vec<&str> {
    members.iter().map(|t| t.type_name()).collect()
}

#[test]
fn primitives_and_named() {
    assert_eq!(alias("int").kind, TypeKind::Primitive("int".into()));
    assert_eq!(alias("u64").kind, TypeKind::Primitive("u64".into()));
    assert_eq!(alias("nil").kind, TypeKind::Primitive("nil".into()));
    assert_eq!(alias("Point").kind, TypeKind::Named("Point".into()));
    assert_eq!(alias("option").kind, TypeKind::Named("option".into()));
    assert!(alias("Point").is_user_defined());
}

#[test]
fn literal_string_type_keeps_quotes() {
    let ty = alias(r#""Some""#);
    assert_eq!(ty.kind, TypeKind::Literal("\"Some\"".into()));
    assert!(ty.is_primitive());
}

#[test]
fn union_and_intersection_are_flat() {
    let ty = alias("int | str | nil");
    let TypeKind::Union(members) = &ty.kind else {
        panic!("expected union");
    };
    assert_eq!(names(members), ["int", "str", "nil"]);

    let ty = alias("Named and Sized");
    let TypeKind::Intersection(members) = &ty.kind else {
        panic!("expected intersection");
    };
    assert_eq!(names(members), ["Named", "Sized"]);
}

#[test]
fn refinement_wraps_the_base_type() {
    let ty = alias("int where x > 0");
    assert!(ty.is_refined());
    assert_eq!(ty.type_name(), "int");
}

#[test]
fn optional_suffix() {
    let program = parse_str("<mem>", "var x: int? = nil;").unwrap();
    let StmtKind::Var(decl) = &program.statements[0].kind else {
        panic!("expected var");
    };
    let ty = decl.ty.as_ref().expect("type");
    assert!(ty.optional);
    assert!(!ty.fallible);
}

#[test]
fn fallible_suffix_collects_error_types() {
    let program = parse_str("<mem>", "var r: int? IOError, ParseError = 0;").unwrap();
    let StmtKind::Var(decl) = &program.statements[0].kind else {
        panic!("expected var");
    };
    let ty = decl.ty.as_ref().expect("type");
    assert!(ty.fallible);
    assert!(!ty.optional);
    assert_eq!(ty.error_types, ["IOError", "ParseError"]);
}

#[test]
fn fallible_parameter_type_leaves_next_parameter_alone() {
    let program = parse_str("<mem>", "fn f(a: int? E, b: int) { }").unwrap();
    let StmtKind::Function(f) = &program.statements[0].kind else {
        panic!("expected function");
    };
    let names: Vec<&str> = f.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(
        f.params[0].ty.as_ref().map(|t| t.error_types.clone()),
        Some(vec!["E".to_string()])
    );
}

#[test]
fn list_types() {
    let ty = alias("[int]");
    assert!(ty.is_list());
    assert_eq!(ty.element_type().map(|t| t.type_name()), Some("int"));

    let ty = alias("[]");
    assert!(ty.is_list());
    assert!(ty.element_type().is_none());

    assert_eq!(alias("array").type_name(), "array");
    assert_eq!(alias("list").type_name(), "list");
}

#[test]
fn dict_types() {
    let ty = alias("{str: [int]}");
    assert!(ty.is_dict());
    assert_eq!(ty.key_type().map(|t| t.type_name()), Some("str"));
    assert!(ty.value_type().is_some_and(TypeAnnotation::is_list));

    let ty = alias("dict");
    assert!(ty.is_dict());
    assert!(ty.key_type().is_none());
}

#[test]
fn tuple_and_grouped_types() {
    let ty = alias("(int, str)");
    assert!(ty.is_tuple());
    let TypeKind::Tuple(members) = &ty.kind else {
        panic!("expected tuple");
    };
    assert_eq!(names(members), ["int", "str"]);

    assert_eq!(alias("(int)").kind, TypeKind::Primitive("int".into()));
    assert!(alias("(int,)").is_tuple());
}

#[test]
fn function_types() {
    let ty = alias("fn(a: int, b?: str): bool");
    let TypeKind::Function {
        params,
        return_type,
    } = &ty.kind
    else {
        panic!("expected function type");
    };
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].name.as_deref(), Some("a"));
    assert!(!params[0].optional);
    assert!(params[1].optional);
    assert_eq!(return_type.as_ref().map(|t| t.type_name()), Some("bool"));

    let ty = alias("fn(int)");
    let TypeKind::Function {
        params,
        return_type,
    } = &ty.kind
    else {
        panic!("expected function type");
    };
    assert!(params[0].name.is_none());
    assert_eq!(return_type.as_ref().map(|t| t.type_name()), Some("nil"));

    let ty = alias("function");
    assert!(matches!(ty.kind, TypeKind::Function { return_type: None, .. }));
}

#[test]
fn reserved_parameter_name_in_function_type() {
    let mut diags = Diagnostics::new();
    let result = parse_source(
        "type F = fn(channel: int): nil;",
        "<mem>",
        ParserConfig::default(),
        &mut diags,
    );
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].description, "Invalid parameter name: channel");
    assert_eq!(result.program.statements.len(), 1);
}

#[test]
fn structural_types() {
    let ty = alias(r#"{ name: str, "full name": str ...Base, ...Other }"#);
    let TypeKind::Structural {
        fields,
        has_rest,
        base_records,
    } = &ty.kind
    else {
        panic!("expected structural type");
    };
    let field_names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, ["name", "full name"]);
    assert!(*has_rest);
    assert_eq!(base_records, &["Base", "Other"]);
}

#[test]
fn keyword_field_names_are_structural() {
    let ty = alias("{ type: str }");
    assert!(ty.is_structural());
    assert_eq!(ty.structural_fields()[0].name, "type");
}

#[test]
fn user_type_key_reads_as_structural() {
    // Only builtin names mark a dictionary key.
    let ty = alias("{ Foo: Bar }");
    assert!(ty.is_structural());
}

#[test]
fn type_spans() {
    let src = "type T = [int]?;";
    let program = parse_str("<mem>", src).unwrap();
    let StmtKind::TypeAlias { ty, .. } = &program.statements[0].kind else {
        panic!("expected type alias");
    };
    assert_eq!(&src[ty.span.range()], "[int]?");
    assert!(ty.optional);
}
