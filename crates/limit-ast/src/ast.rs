use crate::span::Span;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

// ======= statements =======

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    Var(VarDecl),
    Destructuring {
        names: Vec<String>,
        initializer: Expr,
    },
    Function(FunctionDecl),
    Class(ClassDecl),
    Enum(EnumDecl),
    TypeAlias {
        name: String,
        ty: TypeAnnotation,
    },
    Trait(TraitDecl),
    Interface(TraitDecl),
    Module(ModuleDecl),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    For(ForLoop),
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Iter {
        vars: Vec<String>,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Match {
        scrutinee: Expr,
        cases: Vec<MatchCase>,
    },
    Block(Block),
    Expression(Expr),
    Return(Option<Expr>),
    Break,
    Continue,
    Print(Vec<Expr>),
    Import(Import),
    Parallel(ConcurrencyBlock),
    Concurrent(ConcurrencyBlock),
    /// `task(v in iterable) { }`; only inside parallel/concurrent bodies.
    Task {
        var: Option<String>,
        iterable: Expr,
        body: Block,
    },
    /// `worker(param) { }`; only inside parallel/concurrent bodies.
    Worker {
        param: Option<String>,
        body: Block,
    },
    Unsafe(Block),
    Contract {
        condition: Expr,
        message: Option<Expr>,
    },
    Comptime(Box<Stmt>),
}

impl StmtKind {
    /// Short, stable name of the statement kind.
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Var(_) => "VarDeclaration",
            StmtKind::Destructuring { .. } => "DestructuringDeclaration",
            StmtKind::Function(_) => "FunctionDeclaration",
            StmtKind::Class(_) => "ClassDeclaration",
            StmtKind::Enum(_) => "EnumDeclaration",
            StmtKind::TypeAlias { .. } => "TypeDeclaration",
            StmtKind::Trait(_) => "TraitDeclaration",
            StmtKind::Interface(_) => "InterfaceDeclaration",
            StmtKind::Module(_) => "ModuleDeclaration",
            StmtKind::If { .. } => "IfStatement",
            StmtKind::For(_) => "ForStatement",
            StmtKind::While { .. } => "WhileStatement",
            StmtKind::Iter { .. } => "IterStatement",
            StmtKind::Match { .. } => "MatchStatement",
            StmtKind::Block(_) => "BlockStatement",
            StmtKind::Expression(_) => "ExpressionStatement",
            StmtKind::Return(_) => "ReturnStatement",
            StmtKind::Break => "BreakStatement",
            StmtKind::Continue => "ContinueStatement",
            StmtKind::Print(_) => "PrintStatement",
            StmtKind::Import(_) => "ImportStatement",
            StmtKind::Parallel(_) => "ParallelStatement",
            StmtKind::Concurrent(_) => "ConcurrentStatement",
            StmtKind::Task { .. } => "TaskStatement",
            StmtKind::Worker { .. } => "WorkerStatement",
            StmtKind::Unsafe(_) => "UnsafeStatement",
            StmtKind::Contract { .. } => "ContractStatement",
            StmtKind::Comptime(_) => "ComptimeStatement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Visibility {
    Public,
    #[default]
    Private,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    pub initializer: Option<Expr>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeAnnotation>,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub generics: Vec<String>,
    pub params: Vec<Param>,
    /// Parameters with a default value or an optional type, in source order.
    pub optional_params: Vec<Param>,
    pub return_type: Option<TypeAnnotation>,
    /// `None` for abstract and trait signatures ending in `;`.
    pub body: Option<Block>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub can_fail: bool,
    pub declared_error_types: Vec<String>,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub super_args: Vec<Expr>,
    pub ctor_params: Vec<Param>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<FunctionDecl>,
    pub field_visibility: BTreeMap<String, Visibility>,
    pub method_visibility: BTreeMap<String, Visibility>,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_data: bool,
    pub static_members: BTreeSet<String>,
    pub read_only_fields: BTreeSet<String>,
    pub abstract_methods: BTreeSet<String>,
    pub final_methods: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumVariant {
    pub name: String,
    pub payload: Option<TypeAnnotation>,
}

/// Shared shape of `trait` and `interface` declarations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitDecl {
    pub name: String,
    pub is_open: bool,
    pub methods: Vec<FunctionDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleDecl {
    pub name: String,
    pub public_members: Vec<Stmt>,
    pub protected_members: Vec<Stmt>,
    pub private_members: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ForLoop {
    /// `for (init; cond; step) body`
    Traditional {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    /// `for (a, b in expr) body`
    Iterable {
        vars: Vec<String>,
        iterable: Expr,
        body: Box<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub path: ImportPath,
    pub alias: Option<String>,
    pub filter: Option<ImportFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImportPath {
    Dotted(Vec<String>),
    File(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFilter {
    pub kind: FilterKind,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterKind {
    Show,
    Hide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcurrencyBlock {
    pub config: ConcurrencyConfig,
    pub body: Block,
}

/// Keyword arguments of a `parallel(...)` / `concurrent(...)` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcurrencyConfig {
    pub channel: Option<String>,
    pub mode: String,
    pub cores: String,
    pub on_error: String,
    pub timeout: String,
    pub grace: String,
    pub on_timeout: String,
}

impl ConcurrencyConfig {
    pub fn parallel() -> Self {
        Self::with_mode("fork-join")
    }

    pub fn concurrent() -> Self {
        Self::with_mode("batch")
    }

    fn with_mode(mode: &str) -> Self {
        Self {
            channel: None,
            mode: mode.to_string(),
            cores: "auto".to_string(),
            on_error: "stop".to_string(),
            timeout: "0".to_string(),
            grace: "0".to_string(),
            on_timeout: "partial".to_string(),
        }
    }
}

// ======= expressions =======

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Literal(Literal),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    /// `Name { key: value, ... }`
    Object {
        constructor: String,
        fields: Vec<(String, Expr)>,
    },
    Variable(String),
    This,
    Super,
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        named_args: Vec<(String, Expr)>,
    },
    Member {
        object: Box<Expr>,
        name: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Assign {
        target: AssignTarget,
        op: AssignOp,
        value: Box<Expr>,
    },
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        inclusive: bool,
    },
    InterpolatedString(Vec<StringPart>),
    Lambda {
        params: Vec<Param>,
        return_type: Option<TypeAnnotation>,
        body: Block,
    },
    /// `expr?` with an optional `else [name] stmt` handler.
    Fallible {
        expr: Box<Expr>,
        else_var: Option<String>,
        else_handler: Option<Box<Stmt>>,
    },
    /// `err(TypeName[(args)])`
    ErrorConstruct {
        error_type: String,
        args: Vec<Expr>,
    },
    /// `ok(value)`
    OkConstruct(Box<Expr>),
    /// Placeholder produced by error recovery.
    Missing,
}

impl ExprKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "LiteralExpr",
            ExprKind::Tuple(_) => "TupleExpr",
            ExprKind::List(_) => "ListExpr",
            ExprKind::Dict(_) => "DictExpr",
            ExprKind::Object { .. } => "ObjectLiteralExpr",
            ExprKind::Variable(_) => "VariableExpr",
            ExprKind::This => "ThisExpr",
            ExprKind::Super => "SuperExpr",
            ExprKind::Binary { .. } => "BinaryExpr",
            ExprKind::Unary { .. } => "UnaryExpr",
            ExprKind::Grouping(_) => "GroupingExpr",
            ExprKind::Call { .. } => "CallExpr",
            ExprKind::Member { .. } => "MemberExpr",
            ExprKind::Index { .. } => "IndexExpr",
            ExprKind::Assign { .. } => "AssignExpr",
            ExprKind::Range { .. } => "RangeExpr",
            ExprKind::InterpolatedString(_) => "InterpolatedStringExpr",
            ExprKind::Lambda { .. } => "LambdaExpr",
            ExprKind::Fallible { .. } => "FallibleExpr",
            ExprKind::ErrorConstruct { .. } => "ErrorConstructExpr",
            ExprKind::OkConstruct(_) => "OkConstructExpr",
            ExprKind::Missing => "Missing",
        }
    }
}

/// Numeric literals keep their source spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Literal {
    Int(String),
    Float(String),
    Scientific(String),
    Str(String),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StringPart {
    Str(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssignTarget {
    Variable(String),
    Member { object: Box<Expr>, name: String },
    Index { object: Box<Expr>, index: Box<Expr> },
    /// A target that cannot be assigned to; kept so the value survives.
    Invalid(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    // logical
    Or,
    And,
    // equality
    Eq,
    Ne,
    // relational
    Lt,
    Le,
    Gt,
    Ge,
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

// ======= patterns =======

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PatternKind {
    /// `val name`
    Val(String),
    /// `err name` or `err ErrorType`
    Err {
        name: String,
        error_type: Option<String>,
    },
    /// `ErrorType` or `ErrorType(field, ...)`
    ErrorType {
        error_type: String,
        params: Vec<String>,
    },
    Wildcard,
    List {
        elements: Vec<Pattern>,
        rest: Option<String>,
    },
    Dict {
        fields: Vec<DictPatternField>,
        has_rest: bool,
        rest_binding: Option<String>,
    },
    Tuple(Vec<Pattern>),
    /// `Some(x)`
    Binding {
        type_name: String,
        variable: String,
    },
    Type(TypeAnnotation),
    Literal(Literal),
    Identifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictPatternField {
    pub key: String,
    pub binding: String,
}

// ======= type annotations =======

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAnnotation {
    pub kind: TypeKind,
    /// `T?` followed by a non-identifier.
    pub optional: bool,
    /// `T? E1, E2`
    pub fallible: bool,
    pub error_types: Vec<String>,
    /// `T where <condition>`
    pub refinement: Option<Box<Expr>>,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeKind {
    /// Keyword primitives: `int`, `i8`..`u128`, `float`, `f32`, `f64`, `str`, `bool`, `any`, `nil`.
    Primitive(String),
    /// A user-defined name, or a builtin without structure such as `option`.
    Named(String),
    /// A string literal type such as `"Some"`.
    Literal(String),
    /// `[T]`, or the bare `list`/`array` keyword when the element is `None`.
    List {
        keyword: &'static str,
        element: Option<Box<TypeAnnotation>>,
    },
    /// `{K: V}`, or the bare `dict` keyword when both are `None`.
    Dict {
        key: Option<Box<TypeAnnotation>>,
        value: Option<Box<TypeAnnotation>>,
    },
    Tuple(Vec<TypeAnnotation>),
    Function {
        params: Vec<FunctionTypeParam>,
        return_type: Option<Box<TypeAnnotation>>,
    },
    Union(Vec<TypeAnnotation>),
    Intersection(Vec<TypeAnnotation>),
    Structural {
        fields: Vec<StructField>,
        has_rest: bool,
        base_records: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionTypeParam {
    pub name: Option<String>,
    pub ty: TypeAnnotation,
    /// `name?: T`
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructField {
    pub name: String,
    pub ty: TypeAnnotation,
}

impl TypeAnnotation {
    pub fn new(kind: TypeKind, span: Span, line: u32) -> Self {
        Self {
            kind,
            optional: false,
            fallible: false,
            error_types: Vec::new(),
            refinement: None,
            span,
            line,
        }
    }

    pub fn type_name(&self) -> &str {
        match &self.kind {
            TypeKind::Primitive(name) | TypeKind::Named(name) | TypeKind::Literal(name) => name,
            TypeKind::List { keyword, .. } => keyword,
            TypeKind::Dict { .. } => "dict",
            TypeKind::Tuple(_) => "tuple",
            TypeKind::Function { .. } => "function",
            TypeKind::Union(_) => "union",
            TypeKind::Intersection(_) => "intersection",
            TypeKind::Structural { .. } => "struct",
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_) | TypeKind::Literal(_))
    }

    pub fn is_user_defined(&self) -> bool {
        matches!(self.kind, TypeKind::Named(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, TypeKind::List { .. })
    }

    pub fn is_dict(&self) -> bool {
        matches!(self.kind, TypeKind::Dict { .. })
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self.kind, TypeKind::Tuple(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function { .. })
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, TypeKind::Union(_))
    }

    pub fn is_intersection(&self) -> bool {
        matches!(self.kind, TypeKind::Intersection(_))
    }

    pub fn is_structural(&self) -> bool {
        matches!(self.kind, TypeKind::Structural { .. })
    }

    pub fn is_refined(&self) -> bool {
        self.refinement.is_some()
    }

    pub fn key_type(&self) -> Option<&TypeAnnotation> {
        match &self.kind {
            TypeKind::Dict { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    pub fn value_type(&self) -> Option<&TypeAnnotation> {
        match &self.kind {
            TypeKind::Dict { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&TypeAnnotation> {
        match &self.kind {
            TypeKind::List { element, .. } => element.as_deref(),
            _ => None,
        }
    }

    pub fn structural_fields(&self) -> &[StructField] {
        match &self.kind {
            TypeKind::Structural { fields, .. } => fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(name: &str) -> TypeAnnotation {
        TypeAnnotation::new(TypeKind::Primitive(name.into()), Span::default(), 1)
    }

    #[test]
    fn dict_accessors() {
        let dict = TypeAnnotation::new(
            TypeKind::Dict {
                key: Some(Box::new(prim("str"))),
                value: Some(Box::new(prim("int"))),
            },
            Span::default(),
            1,
        );
        assert!(dict.is_dict());
        assert_eq!(dict.type_name(), "dict");
        assert_eq!(dict.key_type().map(|t| t.type_name()), Some("str"));
        assert_eq!(dict.value_type().map(|t| t.type_name()), Some("int"));
        assert!(dict.structural_fields().is_empty());
    }

    #[test]
    fn concurrency_defaults() {
        assert_eq!(ConcurrencyConfig::parallel().mode, "fork-join");
        assert_eq!(ConcurrencyConfig::concurrent().mode, "batch");
        assert_eq!(ConcurrencyConfig::concurrent().on_timeout, "partial");
    }
}
