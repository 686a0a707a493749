//! Concrete syntax tree.
//!
//! Every node owns an ordered list of [`Element`]s. Tokens keep their
//! leading and trailing trivia, so writing out every token of the tree in
//! order reproduces the source byte for byte.

use crate::span::Span;
use crate::token::Token;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Program,

    // declarations
    VarDeclaration,
    DestructuringDeclaration,
    FunctionDeclaration,
    ClassDeclaration,
    EnumDeclaration,
    TypeDeclaration,
    TraitDeclaration,
    InterfaceDeclaration,
    ModuleDeclaration,
    ImportStatement,

    // statements
    BlockStatement,
    IfStatement,
    ForStatement,
    WhileStatement,
    IterStatement,
    MatchStatement,
    MatchCase,
    ExpressionStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    PrintStatement,
    ParallelStatement,
    ConcurrentStatement,
    TaskStatement,
    WorkerStatement,
    UnsafeStatement,
    ContractStatement,
    ComptimeStatement,

    // declaration parts
    Parameter,
    ParameterList,
    ArgumentList,
    EnumVariant,
    Annotation,

    // expressions
    LiteralExpr,
    TupleExpr,
    ListExpr,
    DictExpr,
    ObjectLiteralExpr,
    VariableExpr,
    ThisExpr,
    SuperExpr,
    BinaryExpr,
    UnaryExpr,
    GroupingExpr,
    CallExpr,
    MemberExpr,
    IndexExpr,
    AssignExpr,
    RangeExpr,
    InterpolatedStringExpr,
    LambdaExpr,
    FallibleExpr,
    ErrorConstructExpr,
    OkConstructExpr,

    // types
    PrimitiveType,
    NamedType,
    LiteralType,
    ListType,
    DictType,
    TupleType,
    FunctionType,
    UnionType,
    IntersectionType,
    StructuralType,
    RefinedType,

    // patterns
    ValPattern,
    ErrPattern,
    ErrorTypePattern,
    WildcardPattern,
    ListPattern,
    DictPattern,
    TuplePattern,
    BindingPattern,
    TypePattern,
    LiteralPattern,
    IdentifierPattern,

    // recovery
    ErrorNode,
    Missing,
}

impl NodeKind {
    pub fn is_statement(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            BlockStatement
                | IfStatement
                | ForStatement
                | WhileStatement
                | IterStatement
                | MatchStatement
                | ExpressionStatement
                | ReturnStatement
                | BreakStatement
                | ContinueStatement
                | PrintStatement
                | ParallelStatement
                | ConcurrentStatement
                | TaskStatement
                | WorkerStatement
                | UnsafeStatement
                | ContractStatement
                | ComptimeStatement
        )
    }

    pub fn is_expression(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            LiteralExpr
                | TupleExpr
                | ListExpr
                | DictExpr
                | ObjectLiteralExpr
                | VariableExpr
                | ThisExpr
                | SuperExpr
                | BinaryExpr
                | UnaryExpr
                | GroupingExpr
                | CallExpr
                | MemberExpr
                | IndexExpr
                | AssignExpr
                | RangeExpr
                | InterpolatedStringExpr
                | LambdaExpr
                | FallibleExpr
                | ErrorConstructExpr
                | OkConstructExpr
        )
    }

    pub fn is_declaration(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            VarDeclaration
                | DestructuringDeclaration
                | FunctionDeclaration
                | ClassDeclaration
                | EnumDeclaration
                | TypeDeclaration
                | TraitDeclaration
                | InterfaceDeclaration
                | ModuleDeclaration
                | ImportStatement
        )
    }

    pub fn is_type(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            PrimitiveType
                | NamedType
                | LiteralType
                | ListType
                | DictType
                | TupleType
                | FunctionType
                | UnionType
                | IntersectionType
                | StructuralType
                | RefinedType
        )
    }

    pub fn is_error_recovery(self) -> bool {
        matches!(self, NodeKind::ErrorNode | NodeKind::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Element {
    Node(Node),
    Token(Token),
}

impl Element {
    pub fn span(&self) -> Span {
        match self {
            Element::Node(node) => node.span,
            Element::Token(token) => token.full_span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Covers the children including their trivia.
    pub span: Span,
    pub elements: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            elements: Vec::new(),
            description: None,
            error: None,
        }
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.elements.iter().filter_map(|e| match e {
            Element::Node(n) => Some(n),
            Element::Token(_) => None,
        })
    }

    /// Tokens owned directly by this node.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.elements.iter().filter_map(|e| match e {
            Element::Token(t) => Some(t),
            Element::Node(_) => None,
        })
    }

    /// Every token in the subtree, in source order.
    pub fn all_tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        for element in &self.elements {
            match element {
                Element::Token(t) => out.push(t),
                Element::Node(n) => n.collect_tokens(out),
            }
        }
    }

    pub fn find_child(&self, kind: NodeKind) -> Option<&Node> {
        self.child_nodes().find(|n| n.kind == kind)
    }

    pub fn find_children(&self, kind: NodeKind) -> Vec<&Node> {
        self.child_nodes().filter(|n| n.kind == kind).collect()
    }

    /// Preorder search of the whole subtree, including `self`.
    pub fn descendants(&self, kind: NodeKind) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_descendants(kind, &mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, kind: NodeKind, out: &mut Vec<&'a Node>) {
        if self.kind == kind {
            out.push(self);
        }
        for child in self.child_nodes() {
            child.collect_descendants(kind, out);
        }
    }

    /// Concatenated lexemes, trivia dropped.
    pub fn text(&self) -> String {
        self.all_tokens().iter().map(|t| t.lexeme.as_str()).collect()
    }

    /// Exact source text of the subtree, trivia included.
    pub fn reconstruct(&self) -> String {
        let mut out = String::with_capacity(self.span.len() as usize);
        for token in self.all_tokens() {
            token.write_source(&mut out);
        }
        out
    }

    pub fn has_errors(&self) -> bool {
        self.kind == NodeKind::ErrorNode
            || self.error.is_some()
            || self.child_nodes().any(Node::has_errors)
    }

    pub fn error_messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_errors(&mut out);
        out
    }

    fn collect_errors(&self, out: &mut Vec<String>) {
        if let Some(message) = &self.error {
            out.push(message.clone());
        }
        for child in self.child_nodes() {
            child.collect_errors(out);
        }
    }

    /// Indented, one-line-per-element rendering of the tree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let _ = write!(out, "{pad}{:?}@{}..{}", self.kind, self.span.start, self.span.end);
        if let Some(description) = &self.description {
            let _ = write!(out, " ({description})");
        }
        if let Some(error) = &self.error {
            let _ = write!(out, " [error: {error}]");
        }
        out.push('\n');
        for element in &self.elements {
            match element {
                Element::Node(n) => n.dump_into(out, depth + 1),
                Element::Token(t) => {
                    let _ = writeln!(out, "{pad}  {:?} {:?}", t.kind, t.lexeme);
                }
            }
        }
    }
}

// ======= builder =======

/// Position inside the currently open node, used to wrap already-built
/// elements into a new parent after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    depth: usize,
    index: usize,
}

/// Stack-based tree builder. The bottom of the stack is the `Program` root.
#[derive(Debug)]
pub struct Builder {
    stack: Vec<Node>,
    offset: u32,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            stack: vec![Node::new(NodeKind::Program, Span::empty(0))],
            offset: 0,
        }
    }

    /// Number of open nodes, the root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn start_node(&mut self, kind: NodeKind) {
        self.stack.push(Node::new(kind, Span::empty(self.offset)));
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            depth: self.stack.len(),
            index: self.stack.last().map_or(0, |n| n.elements.len()),
        }
    }

    /// Open a node that adopts every element added to the current node
    /// since `checkpoint`. Falls back to [`Builder::start_node`] when the
    /// checkpoint belongs to a different node.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        let offset = self.offset;
        let depth = self.stack.len();
        let available = self.stack.last().map_or(0, |n| n.elements.len());
        if checkpoint.depth != depth || checkpoint.index > available {
            self.start_node(kind);
            return;
        }
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        let adopted: Vec<Element> = parent.elements.drain(checkpoint.index..).collect();
        let start = adopted.first().map_or(offset, |e| e.span().start);
        let mut node = Node::new(kind, Span::empty(start));
        node.elements = adopted;
        self.stack.push(node);
    }

    pub fn token(&mut self, token: Token) {
        self.offset = token.full_span().end;
        if let Some(node) = self.stack.last_mut() {
            node.elements.push(Element::Token(token));
        }
    }

    /// Remove the most recent token of the current node, if it is the last
    /// element. Used when the parser rewinds its cursor.
    pub fn pop_token(&mut self) -> Option<Token> {
        let node = self.stack.last_mut()?;
        match node.elements.last() {
            Some(Element::Token(_)) => {}
            _ => return None,
        }
        let Some(Element::Token(token)) = node.elements.pop() else {
            return None;
        };
        self.offset = token.full_span().start;
        Some(token)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        if let Some(node) = self.stack.last_mut() {
            node.description = Some(description.into());
        }
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        if let Some(node) = self.stack.last_mut() {
            node.error = Some(error.into());
        }
    }

    /// Close the current node and attach it to its parent. The root is
    /// never closed here.
    pub fn finish_node(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(mut node) = self.stack.pop() {
            node.span = Self::covering_span(&node, self.offset);
            if let Some(parent) = self.stack.last_mut() {
                parent.elements.push(Element::Node(node));
            }
        }
    }

    /// Close nodes until `depth` nodes remain open.
    pub fn unwind_to(&mut self, depth: usize) {
        while self.stack.len() > depth.max(1) {
            self.finish_node();
        }
    }

    /// Close everything and return the root spanning `[0, source_len)`.
    pub fn finish(mut self, source_len: u32) -> Node {
        self.unwind_to(1);
        let mut root = self
            .stack
            .pop()
            .unwrap_or_else(|| Node::new(NodeKind::Program, Span::empty(0)));
        root.span = Span::new(0, source_len);
        root
    }

    fn covering_span(node: &Node, offset: u32) -> Span {
        match (node.elements.first(), node.elements.last()) {
            (Some(first), Some(last)) => first.span().to(last.span()),
            _ => Span::empty(node.span.start.min(offset)),
        }
    }
}
