use super::{PResult, ParseAborted, Parser};
use limit_ast::ast::{
    AssignOp, AssignTarget, Block, ClassDecl, EnumDecl, EnumVariant, Expr, ExprKind, FilterKind,
    FunctionDecl, Import, ImportFilter, ImportPath, ModuleDecl, Param, Stmt, StmtKind, TraitDecl,
    VarDecl, Visibility,
};
use limit_ast::cst::NodeKind;
use limit_ast::span::Span;
use limit_ast::token::TokenKind;

/// Modifier keywords and annotations in front of a declaration.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_const: bool,
    pub is_data: bool,
    pub is_open: bool,
}

impl<'t, 'd> Parser<'t, 'd> {
    pub(super) fn declaration_inner(&mut self) -> PResult<Stmt> {
        use TokenKind::{
            Class, Enum, Fn, Identifier, Import, Interface, LeftParen, Module, Trait, Type, Var,
        };
        let (start, line) = self.start_pos();
        let checkpoint = self.sink.checkpoint();
        let mods = self.modifiers();
        let node = match self.peek().kind {
            Class => NodeKind::ClassDeclaration,
            Fn => NodeKind::FunctionDeclaration,
            Var if self.check_at(1, LeftParen) => NodeKind::DestructuringDeclaration,
            Var => NodeKind::VarDeclaration,
            Identifier if mods.is_const => NodeKind::VarDeclaration,
            Enum => NodeKind::EnumDeclaration,
            Import => NodeKind::ImportStatement,
            Type => NodeKind::TypeDeclaration,
            Trait => NodeKind::TraitDeclaration,
            Interface => NodeKind::InterfaceDeclaration,
            Module => NodeKind::ModuleDeclaration,
            _ => return self.statement(),
        };
        self.sink.start_at(checkpoint, node);
        let kind = match node {
            NodeKind::ClassDeclaration => StmtKind::Class(self.class_declaration(&mods)?),
            NodeKind::FunctionDeclaration => {
                StmtKind::Function(self.function_declaration(&mods)?)
            }
            NodeKind::DestructuringDeclaration => self.destructuring()?,
            NodeKind::VarDeclaration => StmtKind::Var(self.var_declaration(&mods)?),
            NodeKind::EnumDeclaration => StmtKind::Enum(self.enum_declaration()?),
            NodeKind::ImportStatement => StmtKind::Import(self.import()?),
            NodeKind::TypeDeclaration => self.type_declaration()?,
            NodeKind::TraitDeclaration => StmtKind::Trait(self.trait_declaration(&mods, "trait")?),
            NodeKind::InterfaceDeclaration => {
                StmtKind::Interface(self.trait_declaration(&mods, "interface")?)
            }
            _ => StmtKind::Module(self.module_declaration()?),
        };
        self.sink.finish();
        Ok(Stmt {
            kind,
            span: self.span_from(start),
            line,
        })
    }

    fn modifiers(&mut self) -> Modifiers {
        use TokenKind::*;
        let mut mods = Modifiers::default();
        loop {
            let kind = self.peek().kind;
            match kind {
                Pub | AtPublic => mods.visibility = Visibility::Public,
                AtPrivate => mods.visibility = Visibility::Private,
                Prot | AtProtected => mods.visibility = Visibility::Protected,
                Const => mods.is_const = true,
                Static => mods.is_static = true,
                Abstract => mods.is_abstract = true,
                Final => mods.is_final = true,
                Data => {
                    mods.is_data = true;
                    mods.is_final = true;
                }
                AtOpen => mods.is_open = true,
                AtProperty | AtCache => {}
                _ => return mods,
            }
            let annotation = matches!(
                kind,
                AtPublic | AtPrivate | AtProtected | AtOpen | AtProperty | AtCache
            );
            if annotation {
                self.sink.start(NodeKind::Annotation);
            }
            self.advance();
            if annotation {
                self.sink.finish();
            }
        }
    }

    // ======= variables =======

    /// `var name[: T][= init][;]`, or `const name = init` without `var`.
    pub(super) fn var_declaration(&mut self, mods: &Modifiers) -> PResult<VarDecl> {
        self.eat(TokenKind::Var);
        let name = self.consume_ident("Expected variable name.")?;
        self.sink.describe(name.as_str());
        let ty = if self.eat(TokenKind::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        let initializer = if self.eat(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.eat(TokenKind::Semicolon);
        Ok(VarDecl {
            name,
            ty,
            initializer,
            visibility: mods.visibility,
            is_static: mods.is_static,
            is_const: mods.is_const,
        })
    }

    /// `var (a, b) = expr`
    fn destructuring(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.advance();
        let mut names = vec![self.consume_ident("Expected variable name in destructuring.")?];
        while self.eat(TokenKind::Comma) {
            names.push(self.consume_ident("Expected variable name in destructuring.")?);
        }
        self.consume(TokenKind::RightParen, "Expected ')' after destructuring names.")?;
        self.consume(TokenKind::Equal, "Expected '=' after destructuring pattern.")?;
        let initializer = self.expression()?;
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::Destructuring { names, initializer })
    }

    // ======= functions =======

    pub(super) fn function_declaration(&mut self, mods: &Modifiers) -> PResult<FunctionDecl> {
        let (start, line) = self.start_pos();
        self.advance();
        let name = self.consume_ident("Expected function name.")?;
        self.sink.describe(name.as_str());

        let mut generics = Vec::new();
        if self.eat(TokenKind::LeftBracket) {
            generics.push(self.consume_ident("Expected generic parameter name.")?);
            while self.eat(TokenKind::Comma) {
                generics.push(self.consume_ident("Expected generic parameter name.")?);
            }
            self.consume(TokenKind::RightBracket, "Expected ']' after generic parameters.")?;
        }

        if !self.check(TokenKind::LeftParen) {
            return Err(self.error("Expected '(' after function name."));
        }
        let (params, optional_params) = self.parameters()?;
        let return_type = if self.eat(TokenKind::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        let body = if self.eat(TokenKind::Semicolon) {
            None
        } else {
            Some(self.block("function", "Expected '{' before function body.")?)
        };

        let (can_fail, declared_error_types) = match &return_type {
            Some(ty) if ty.fallible => (true, ty.error_types.clone()),
            _ => (false, Vec::new()),
        };
        Ok(FunctionDecl {
            name,
            generics,
            params,
            optional_params,
            return_type,
            body,
            visibility: mods.visibility,
            is_static: mods.is_static,
            is_abstract: mods.is_abstract,
            is_final: mods.is_final,
            can_fail,
            declared_error_types,
            span: self.span_from(start),
            line,
        })
    }

    /// `(name[: T][= default], ...)`. Returns required and optional
    /// parameters separately; a default value or an optional type makes a
    /// parameter optional.
    pub(super) fn parameters(&mut self) -> PResult<(Vec<Param>, Vec<Param>)> {
        self.sink.start(NodeKind::ParameterList);
        self.consume(TokenKind::LeftParen, "Expected '(' before parameters.")?;
        let mut required = Vec::new();
        let mut optional = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param = self.parameter()?;
                let is_optional =
                    param.default.is_some() || param.ty.as_ref().is_some_and(|t| t.optional);
                if is_optional {
                    optional.push(param);
                } else {
                    required.push(param);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters.")?;
        self.sink.finish();
        Ok((required, optional))
    }

    fn parameter(&mut self) -> PResult<Param> {
        let (start, _) = self.start_pos();
        self.sink.start(NodeKind::Parameter);
        let name = self.consume_ident("Expected parameter name.")?;
        let ty = if self.eat(TokenKind::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        let default = if self.eat(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.sink.finish();
        Ok(Param {
            name,
            ty,
            default,
            span: self.span_from(start),
        })
    }

    // ======= classes =======

    fn class_declaration(&mut self, mods: &Modifiers) -> PResult<ClassDecl> {
        let (start, line) = self.start_pos();
        self.advance();
        let mut class = ClassDecl {
            name: self.consume_ident("Expected class name.")?,
            is_abstract: mods.is_abstract,
            is_final: mods.is_final,
            is_data: mods.is_data,
            ..ClassDecl::default()
        };
        self.sink.describe(class.name.as_str());

        let inline_ctor = self.check(TokenKind::LeftParen);
        if inline_ctor {
            let (required, optional) = self.parameters()?;
            class.ctor_params = required.into_iter().chain(optional).collect();
        }
        if self.eat(TokenKind::Colon) {
            class.superclass = Some(self.consume_ident("Expected superclass name.")?);
            if self.check(TokenKind::LeftParen) {
                class.super_args = self.arguments()?;
            }
        }

        let open = self.consume(TokenKind::LeftBrace, "Expected '{' before class body.")?;
        self.push_block("class", &open);
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() && !self.halted {
            self.class_member(&mut class)?;
        }
        self.close_block("Expected '}' after class body.");
        self.pop_block();

        if inline_ctor {
            let init = synthesized_init(&class, self.span_from(start), line);
            class.method_visibility.insert(init.name.clone(), Visibility::Public);
            class.methods.push(init);
        }
        Ok(class)
    }

    fn class_member(&mut self, class: &mut ClassDecl) -> PResult<()> {
        use TokenKind::{Colon, Equal, Fn, Identifier, LeftParen, Var};
        let checkpoint = self.sink.checkpoint();
        let mods = self.modifiers();
        match self.peek().kind {
            Var | Identifier
                if self.check(Var)
                    || self.check_at(1, Colon)
                    || (mods.is_const && self.check_at(1, Equal)) =>
            {
                self.sink.start_at(checkpoint, NodeKind::VarDeclaration);
                let field = self.var_declaration(&mods)?;
                self.sink.finish();
                class.field_visibility.insert(field.name.clone(), field.visibility);
                if field.is_static {
                    class.static_members.insert(field.name.clone());
                }
                if field.is_const {
                    class.read_only_fields.insert(field.name.clone());
                }
                class.fields.push(field);
            }
            Fn => {
                self.sink.start_at(checkpoint, NodeKind::FunctionDeclaration);
                let method = self.function_declaration(&mods)?;
                self.sink.finish();
                self.add_method(class, method);
            }
            Identifier if self.peek().lexeme == class.name && self.check_at(1, LeftParen) => {
                self.sink.start_at(checkpoint, NodeKind::FunctionDeclaration);
                let (start, line) = self.start_pos();
                self.advance();
                let (params, optional_params) = self.parameters()?;
                let body = self.block("function", "Expected '{' before constructor body.")?;
                self.sink.finish();
                let ctor = FunctionDecl {
                    name: "init".to_string(),
                    generics: Vec::new(),
                    params,
                    optional_params,
                    return_type: None,
                    body: Some(body),
                    visibility: Visibility::Public,
                    is_static: false,
                    is_abstract: false,
                    is_final: false,
                    can_fail: false,
                    declared_error_types: Vec::new(),
                    span: self.span_from(start),
                    line,
                };
                self.add_method(class, ctor);
            }
            _ => return Err(self.error("Expected class member declaration.")),
        }
        Ok(())
    }

    fn add_method(&mut self, class: &mut ClassDecl, method: FunctionDecl) {
        class.method_visibility.insert(method.name.clone(), method.visibility);
        if method.is_static {
            class.static_members.insert(method.name.clone());
        }
        if method.is_abstract {
            class.abstract_methods.insert(method.name.clone());
        }
        if method.is_final {
            class.final_methods.insert(method.name.clone());
        }
        class.methods.push(method);
    }

    // ======= enums, aliases, traits, modules =======

    fn enum_declaration(&mut self) -> PResult<EnumDecl> {
        self.advance();
        let name = self.consume_ident("Expected enum name.")?;
        self.sink.describe(name.as_str());
        let open = self.consume(TokenKind::LeftBrace, "Expected '{' before enum body.")?;
        self.push_block("enum", &open);
        let mut variants = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            self.sink.start(NodeKind::EnumVariant);
            let variant = self.consume_ident("Expected enum variant name.")?;
            let payload = if self.eat(TokenKind::LeftParen) {
                let ty = self.type_annotation()?;
                self.consume(TokenKind::RightParen, "Expected ')' after variant type.")?;
                Some(ty)
            } else {
                None
            };
            self.sink.finish();
            variants.push(EnumVariant {
                name: variant,
                payload,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        // A stray token between variants still aborts the enum.
        if !self.close_block("Expected '}' after enum body.") && !self.is_at_end() {
            return Err(ParseAborted);
        }
        self.pop_block();
        Ok(EnumDecl { name, variants })
    }

    fn type_declaration(&mut self) -> PResult<StmtKind> {
        self.advance();
        let name = self.consume_ident("Expected type name.")?;
        self.consume(TokenKind::Equal, "Expected '=' after type name.")?;
        let ty = self.type_annotation()?;
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::TypeAlias { name, ty })
    }

    /// `trait [@open] Name { fn m(...)[: R] (; | { ... }) }`; interfaces
    /// share the shape.
    fn trait_declaration(&mut self, mods: &Modifiers, keyword: &str) -> PResult<TraitDecl> {
        self.advance();
        let mut is_open = mods.is_open;
        if self.check(TokenKind::AtOpen) {
            self.sink.start(NodeKind::Annotation);
            self.advance();
            self.sink.finish();
            is_open = true;
        }
        let name = self.consume_ident(&format!("Expected {keyword} name."))?;
        self.sink.describe(name.as_str());
        let open = self.consume(
            TokenKind::LeftBrace,
            &format!("Expected '{{' before {keyword} body."),
        )?;
        self.push_block(keyword, &open);
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() && !self.halted {
            if !self.check(TokenKind::Fn) {
                return Err(self.error(&format!("Expected method declaration in {keyword}.")));
            }
            self.sink.start(NodeKind::FunctionDeclaration);
            let method = self.function_declaration(&Modifiers::default())?;
            self.sink.finish();
            methods.push(method);
        }
        self.close_block(&format!("Expected '}}' after {keyword} body."));
        self.pop_block();
        Ok(TraitDecl {
            name,
            is_open,
            methods,
        })
    }

    /// Members land in a bucket chosen by a leading `@public` or
    /// `@protected`; everything else is private.
    fn module_declaration(&mut self) -> PResult<ModuleDecl> {
        self.advance();
        let mut module = ModuleDecl {
            name: self.consume_ident("Expected module name.")?,
            ..ModuleDecl::default()
        };
        self.sink.describe(module.name.as_str());
        let open = self.consume(TokenKind::LeftBrace, "Expected '{' before module body.")?;
        self.push_block("module", &open);
        self.depth += 1;
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() && !self.halted {
            let before = self.current;
            let bucket = match self.peek().kind {
                TokenKind::AtPublic => &mut module.public_members,
                TokenKind::AtProtected => &mut module.protected_members,
                _ => &mut module.private_members,
            };
            if let Some(member) = self.declaration() {
                bucket.push(member);
            }
            if self.current == before && !self.check(TokenKind::RightBrace) {
                self.advance();
            }
        }
        self.depth -= 1;
        self.close_block("Expected '}' after module body.");
        self.pop_block();
        Ok(module)
    }

    // ======= imports =======

    /// `import a.b.c [as x] [show|hide n, ...]` or `import("file.lm")`.
    fn import(&mut self) -> PResult<Import> {
        self.advance();
        let path = if self.eat(TokenKind::LeftParen) {
            let file = self.consume(
                TokenKind::String,
                "Expected module path or string literal after 'import'.",
            )?;
            self.consume(TokenKind::RightParen, "Expected ')' after import path.")?;
            ImportPath::File(file.value.unwrap_or_default())
        } else if self.check(TokenKind::String) {
            ImportPath::File(self.advance().value.unwrap_or_default())
        } else if self.check(TokenKind::Identifier) {
            let mut parts = vec![self.advance().lexeme];
            while self.eat(TokenKind::Dot) {
                parts.push(self.consume_ident("Expected module path component.")?);
            }
            ImportPath::Dotted(parts)
        } else {
            return Err(self.error("Expected module path or string literal after 'import'."));
        };

        let alias = if self.eat(TokenKind::As) {
            Some(self.consume_ident("Expected alias name after 'as'.")?)
        } else {
            None
        };

        let filter_kind = match self.peek().kind {
            TokenKind::Show => Some(FilterKind::Show),
            TokenKind::Hide => Some(FilterKind::Hide),
            _ => None,
        };
        let filter = match filter_kind {
            Some(kind) => {
                let keyword = self.advance().lexeme;
                let message = format!("Expected identifier after '{keyword}'.");
                let mut names = vec![self.consume_ident(&message)?];
                while self.eat(TokenKind::Comma) {
                    names.push(self.consume_ident(&message)?);
                }
                Some(ImportFilter { kind, names })
            }
            None => None,
        };
        self.eat(TokenKind::Semicolon);
        Ok(Import {
            path,
            alias,
            filter,
        })
    }
}

/// `init` for a class with inline constructor parameters: forwards the
/// super arguments, then assigns each parameter to the field of the same
/// name.
fn synthesized_init(class: &ClassDecl, span: Span, line: u32) -> FunctionDecl {
    let expr = |kind| Expr { kind, span, line };
    let stmt = |e: Expr| Stmt {
        kind: StmtKind::Expression(e),
        span,
        line,
    };

    let mut statements = Vec::new();
    if class.superclass.is_some() && !class.super_args.is_empty() {
        let callee = expr(ExprKind::Member {
            object: Box::new(expr(ExprKind::Super)),
            name: "init".to_string(),
        });
        statements.push(stmt(expr(ExprKind::Call {
            callee: Box::new(callee),
            args: class.super_args.clone(),
            named_args: Vec::new(),
        })));
    }
    for param in &class.ctor_params {
        statements.push(stmt(expr(ExprKind::Assign {
            target: AssignTarget::Member {
                object: Box::new(expr(ExprKind::This)),
                name: param.name.clone(),
            },
            op: AssignOp::Assign,
            value: Box::new(expr(ExprKind::Variable(param.name.clone()))),
        })));
    }

    let (params, optional_params): (Vec<Param>, Vec<Param>) = class
        .ctor_params
        .iter()
        .cloned()
        .partition(|p| p.default.is_none() && !p.ty.as_ref().is_some_and(|t| t.optional));
    FunctionDecl {
        name: "init".to_string(),
        generics: Vec::new(),
        params,
        optional_params,
        return_type: None,
        body: Some(Block {
            statements,
            span,
            line,
        }),
        visibility: Visibility::Public,
        is_static: false,
        is_abstract: false,
        is_final: false,
        can_fail: false,
        declared_error_types: Vec::new(),
        span,
        line,
    }
}
