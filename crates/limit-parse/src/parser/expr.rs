use super::{PResult, ParseAborted, Parser};
use limit_ast::ast::{
    AssignOp, AssignTarget, BinaryOp, Expr, ExprKind, Literal, StringPart, UnaryOp,
};
use limit_ast::cst::NodeKind;
use limit_ast::span::Span;
use limit_ast::token::{Token, TokenKind};

fn equality_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::EqualEqual => Some(BinaryOp::Eq),
        TokenKind::BangEqual => Some(BinaryOp::Ne),
        _ => None,
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Less => Some(BinaryOp::Lt),
        TokenKind::LessEqual => Some(BinaryOp::Le),
        TokenKind::Greater => Some(BinaryOp::Gt),
        TokenKind::GreaterEqual => Some(BinaryOp::Ge),
        _ => None,
    }
}

fn term_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

fn factor_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Modulus => Some(BinaryOp::Mod),
        _ => None,
    }
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Equal => Some(AssignOp::Assign),
        TokenKind::PlusEqual => Some(AssignOp::AddAssign),
        TokenKind::MinusEqual => Some(AssignOp::SubAssign),
        TokenKind::StarEqual => Some(AssignOp::MulAssign),
        TokenKind::SlashEqual => Some(AssignOp::DivAssign),
        TokenKind::ModulusEqual => Some(AssignOp::ModAssign),
        _ => None,
    }
}

/// Literal value of a literal token, if it is one.
pub(super) fn literal_of(token: &Token) -> Option<Literal> {
    let literal = match token.kind {
        TokenKind::True => Literal::Bool(true),
        TokenKind::False => Literal::Bool(false),
        TokenKind::Nil => Literal::Nil,
        TokenKind::IntLiteral => Literal::Int(token.lexeme.clone()),
        TokenKind::FloatLiteral => Literal::Float(token.lexeme.clone()),
        TokenKind::ScientificLiteral => Literal::Scientific(token.lexeme.clone()),
        TokenKind::String => Literal::Str(token.value.clone().unwrap_or_default()),
        _ => return None,
    };
    Some(literal)
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    let span = left.span.to(right.span);
    let line = left.line;
    Expr {
        kind: ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
        line,
    }
}

impl<'t, 'd> Parser<'t, 'd> {
    pub(super) fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn expr_from(&self, kind: ExprKind, start: u32, line: u32) -> Expr {
        Expr {
            kind,
            span: self.span_from(start),
            line,
        }
    }

    /// Right-associative; the target must be a variable, member or index.
    fn assignment(&mut self) -> PResult<Expr> {
        let checkpoint = self.sink.checkpoint();
        let target = self.logical_or()?;
        let Some(op) = assign_op(self.peek().kind) else {
            return Ok(target);
        };
        self.sink.start_at(checkpoint, NodeKind::AssignExpr);
        let op_token = self.advance();
        let value = self.assignment()?;
        self.sink.finish();

        let span = target.span.to(value.span);
        let line = target.line;
        let target = match target.kind {
            ExprKind::Variable(name) => AssignTarget::Variable(name),
            ExprKind::Member { object, name } => AssignTarget::Member { object, name },
            ExprKind::Index { object, index } => AssignTarget::Index { object, index },
            kind => {
                self.report_at(&op_token, "Invalid assignment target.");
                AssignTarget::Invalid(Box::new(Expr {
                    kind,
                    span: target.span,
                    line,
                }))
            }
        };
        Ok(Expr {
            kind: ExprKind::Assign {
                target,
                op,
                value: Box::new(value),
            },
            span,
            line,
        })
    }

    fn logical_or(&mut self) -> PResult<Expr> {
        self.left_assoc(|k| (k == TokenKind::Or).then_some(BinaryOp::Or), Self::logical_and)
    }

    fn logical_and(&mut self) -> PResult<Expr> {
        self.left_assoc(|k| (k == TokenKind::And).then_some(BinaryOp::And), Self::equality)
    }

    fn equality(&mut self) -> PResult<Expr> {
        self.left_assoc(equality_op, Self::comparison)
    }

    /// Relational operators, or a single inclusive `start..end` range.
    fn comparison(&mut self) -> PResult<Expr> {
        let checkpoint = self.sink.checkpoint();
        let (start, line) = self.start_pos();
        let mut left = self.term()?;
        if self.check(TokenKind::Range) {
            self.sink.start_at(checkpoint, NodeKind::RangeExpr);
            self.advance();
            let end = self.term()?;
            self.sink.finish();
            let range = ExprKind::Range {
                start: Box::new(left),
                end: Box::new(end),
                step: None,
                inclusive: true,
            };
            return Ok(self.expr_from(range, start, line));
        }
        while let Some(op) = comparison_op(self.peek().kind) {
            self.sink.start_at(checkpoint, NodeKind::BinaryExpr);
            self.advance();
            let right = self.term()?;
            self.sink.finish();
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> PResult<Expr> {
        self.left_assoc(term_op, Self::factor)
    }

    fn factor(&mut self) -> PResult<Expr> {
        self.left_assoc(factor_op, Self::power)
    }

    fn left_assoc(
        &mut self,
        op_of: fn(TokenKind) -> Option<BinaryOp>,
        operand: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        let checkpoint = self.sink.checkpoint();
        let mut left = operand(self)?;
        while let Some(op) = op_of(self.peek().kind) {
            self.sink.start_at(checkpoint, NodeKind::BinaryExpr);
            self.advance();
            let right = operand(self)?;
            self.sink.finish();
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `**` is right-associative. Its base is a unary expression, so
    /// `-2 ** 2` groups as `(-2) ** 2`.
    fn power(&mut self) -> PResult<Expr> {
        let checkpoint = self.sink.checkpoint();
        let base = self.unary()?;
        if !self.check(TokenKind::Power) {
            return Ok(base);
        }
        self.sink.start_at(checkpoint, NodeKind::BinaryExpr);
        self.advance();
        let exponent = self.power()?;
        self.sink.finish();
        Ok(binary(base, BinaryOp::Pow, exponent))
    }

    fn unary(&mut self) -> PResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.call(),
        };
        let (start, line) = self.start_pos();
        self.sink.start(NodeKind::UnaryExpr);
        self.advance();
        let operand = self.unary()?;
        self.sink.finish();
        let kind = ExprKind::Unary {
            op,
            operand: Box::new(operand),
        };
        Ok(self.expr_from(kind, start, line))
    }

    // ======= postfix =======

    fn call(&mut self) -> PResult<Expr> {
        use TokenKind::{Dot, Else, Identifier, LeftBrace, LeftBracket, LeftParen, Question};
        let checkpoint = self.sink.checkpoint();
        let (start, line) = self.start_pos();
        let mut expr = self.primary()?;
        loop {
            let kind = match self.peek().kind {
                LeftParen => {
                    self.sink.start_at(checkpoint, NodeKind::CallExpr);
                    let (args, named_args) = self.call_arguments()?;
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                        named_args,
                    }
                }
                Dot if self.peek_at(1).kind.is_number() => {
                    self.sink.start_at(checkpoint, NodeKind::IndexExpr);
                    self.advance();
                    let index = self.tuple_index()?;
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                Dot => {
                    self.sink.start_at(checkpoint, NodeKind::MemberExpr);
                    self.advance();
                    let name = self.consume_ident("Expected property name after '.'.")?;
                    ExprKind::Member {
                        object: Box::new(expr),
                        name,
                    }
                }
                LeftBracket => {
                    self.sink.start_at(checkpoint, NodeKind::IndexExpr);
                    self.advance();
                    let index = self.expression()?;
                    self.consume(TokenKind::RightBracket, "Expected ']' after index.")?;
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                Question => {
                    self.sink.start_at(checkpoint, NodeKind::FallibleExpr);
                    self.advance();
                    let (else_var, else_handler) = if self.eat(Else) {
                        let var = if self.check(Identifier) && self.check_at(1, LeftBrace) {
                            Some(self.advance().lexeme)
                        } else {
                            None
                        };
                        (var, Some(Box::new(self.statement()?)))
                    } else {
                        (None, None)
                    };
                    ExprKind::Fallible {
                        expr: Box::new(expr),
                        else_var,
                        else_handler,
                    }
                }
                _ => return Ok(expr),
            };
            self.sink.finish();
            expr = self.expr_from(kind, start, line);
        }
    }

    /// The number after `.` in `tuple.0`.
    fn tuple_index(&mut self) -> PResult<Expr> {
        let token = self.advance();
        if !token.is(TokenKind::IntLiteral) || token.lexeme.parse::<u64>().is_err() {
            self.report_at(&token, &format!("Invalid tuple index: {}", token.lexeme));
        }
        Ok(Expr {
            kind: ExprKind::Literal(Literal::Int(token.lexeme)),
            span: token.span,
            line: token.line,
        })
    }

    /// `(args)` where an argument written `name = value` is named.
    fn call_arguments(&mut self) -> PResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        self.sink.start(NodeKind::ArgumentList);
        self.advance();
        let mut args = Vec::new();
        let mut named = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if self.check(TokenKind::Identifier) && self.check_at(1, TokenKind::Equal) {
                    let name = self.advance().lexeme;
                    self.advance();
                    named.push((name, self.expression()?));
                } else {
                    args.push(self.expression()?);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after arguments.")?;
        self.sink.finish();
        Ok((args, named))
    }

    /// Positional `(args)` for `class C : Base(args)`.
    pub(super) fn arguments(&mut self) -> PResult<Vec<Expr>> {
        self.sink.start(NodeKind::ArgumentList);
        self.advance();
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            args.push(self.expression()?);
            while self.eat(TokenKind::Comma) {
                args.push(self.expression()?);
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after arguments.")?;
        self.sink.finish();
        Ok(args)
    }

    // ======= primary =======

    fn primary(&mut self) -> PResult<Expr> {
        use TokenKind::{
            Eof, Fn, Identifier, InterpolationStart, LeftBrace, LeftBracket, LeftParen,
            RightBrace, RightBracket, RightParen, SelfKw, Semicolon, Super, This,
        };
        let (start, line) = self.start_pos();
        let token = self.peek().clone();
        if let Some(literal) = literal_of(&token) {
            self.sink.start(NodeKind::LiteralExpr);
            self.advance();
            self.sink.finish();
            return Ok(self.expr_from(ExprKind::Literal(literal), start, line));
        }
        let kind = match token.kind {
            InterpolationStart => {
                self.sink.start(NodeKind::InterpolatedStringExpr);
                self.interpolated_string()?
            }
            This | SelfKw => {
                self.sink.start(NodeKind::ThisExpr);
                self.advance();
                ExprKind::This
            }
            Super => {
                self.sink.start(NodeKind::SuperExpr);
                self.advance();
                ExprKind::Super
            }
            Identifier if self.check_at(1, LeftBrace) => {
                self.sink.start(NodeKind::ObjectLiteralExpr);
                self.object_literal()?
            }
            Identifier => {
                self.sink.start(NodeKind::VariableExpr);
                self.advance();
                ExprKind::Variable(token.lexeme)
            }
            TokenKind::Err => {
                self.sink.start(NodeKind::ErrorConstructExpr);
                self.error_construct()?
            }
            TokenKind::Ok => {
                self.sink.start(NodeKind::OkConstructExpr);
                self.advance();
                self.consume(LeftParen, "Expected '(' after 'ok'.")?;
                let value = self.expression()?;
                self.consume(RightParen, "Expected ')' after ok value.")?;
                ExprKind::OkConstruct(Box::new(value))
            }
            Fn => {
                self.sink.start(NodeKind::LambdaExpr);
                self.lambda()?
            }
            LeftParen => return self.paren_expr(),
            LeftBracket => {
                self.sink.start(NodeKind::ListExpr);
                self.list_literal()?
            }
            LeftBrace => {
                self.sink.start(NodeKind::DictExpr);
                self.dict_literal()?
            }
            // Already reported by the scanner.
            TokenKind::Error => {
                self.last_error = Some(format!("Unexpected token '{}'", token.lexeme));
                return Err(ParseAborted);
            }
            Semicolon | RightParen | RightBrace | RightBracket | Eof => {
                self.report_here("Expected expression.");
                self.sink.start(NodeKind::Missing);
                self.sink.finish();
                return Ok(Expr {
                    kind: ExprKind::Missing,
                    span: Span::empty(start),
                    line,
                });
            }
            _ => return Err(self.error("Expected expression.")),
        };
        self.sink.finish();
        Ok(self.expr_from(kind, start, line))
    }

    /// `"text{expr}text{expr}text"`: alternating text and expression parts,
    /// always starting and ending with text.
    fn interpolated_string(&mut self) -> PResult<ExprKind> {
        let mut parts = Vec::new();
        while self.check(TokenKind::InterpolationStart) {
            let open = self.advance();
            parts.push(StringPart::Str(open.value.unwrap_or_default()));
            parts.push(StringPart::Expr(self.expression()?));
            self.consume_close(
                TokenKind::InterpolationEnd,
                "Expected '}' after interpolation expression.",
            )?;
        }
        if self.check(TokenKind::String) {
            let tail = self.advance();
            parts.push(StringPart::Str(tail.value.unwrap_or_default()));
        }
        Ok(ExprKind::InterpolatedString(parts))
    }

    /// `Name { field: value, ... }`
    fn object_literal(&mut self) -> PResult<ExprKind> {
        let constructor = self.advance().lexeme;
        self.advance();
        let mut fields = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let name = self.consume_ident("Expected field name in object literal.")?;
            self.consume(TokenKind::Colon, "Expected ':' after field name.")?;
            fields.push((name, self.expression()?));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume_close(TokenKind::RightBrace, "Expected '}' after object literal fields.")?;
        Ok(ExprKind::Object {
            constructor,
            fields,
        })
    }

    /// `err(Type[(args)])`
    fn error_construct(&mut self) -> PResult<ExprKind> {
        self.advance();
        self.consume(TokenKind::LeftParen, "Expected '(' after 'err'.")?;
        let error_type = self.consume_ident("Expected error type name.")?;
        let args = if self.check(TokenKind::LeftParen) {
            self.arguments()?
        } else {
            Vec::new()
        };
        self.consume(TokenKind::RightParen, "Expected ')' after error construction.")?;
        Ok(ExprKind::ErrorConstruct { error_type, args })
    }

    /// `fn (params)[: R] { body }`
    fn lambda(&mut self) -> PResult<ExprKind> {
        self.advance();
        if !self.check(TokenKind::LeftParen) {
            return Err(self.error("Expected '(' after 'fn' in lambda."));
        }
        let (required, optional) = self.parameters()?;
        let return_type = if self.eat(TokenKind::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };
        let body = self.block("function", "Expected '{' before lambda body.")?;
        Ok(ExprKind::Lambda {
            params: required.into_iter().chain(optional).collect(),
            return_type,
            body,
        })
    }

    /// `()` and `(a, b)` are tuples, `(a)` is a grouping.
    fn paren_expr(&mut self) -> PResult<Expr> {
        let checkpoint = self.sink.checkpoint();
        let (start, line) = self.start_pos();
        self.advance();
        if self.eat(TokenKind::RightParen) {
            self.sink.start_at(checkpoint, NodeKind::TupleExpr);
            self.sink.finish();
            return Ok(self.expr_from(ExprKind::Tuple(Vec::new()), start, line));
        }
        let first = self.expression()?;
        if !self.check(TokenKind::Comma) {
            self.sink.start_at(checkpoint, NodeKind::GroupingExpr);
            self.consume(TokenKind::RightParen, "Expected ')' after expression.")?;
            self.sink.finish();
            return Ok(self.expr_from(ExprKind::Grouping(Box::new(first)), start, line));
        }
        self.sink.start_at(checkpoint, NodeKind::TupleExpr);
        let mut elements = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RightParen) {
                break;
            }
            elements.push(self.expression()?);
        }
        self.consume(TokenKind::RightParen, "Expected ')' after tuple elements.")?;
        self.sink.finish();
        Ok(self.expr_from(ExprKind::Tuple(elements), start, line))
    }

    fn list_literal(&mut self) -> PResult<ExprKind> {
        self.advance();
        let mut elements = Vec::new();
        while !self.check(TokenKind::RightBracket) && !self.is_at_end() {
            elements.push(self.expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightBracket, "Expected ']' after list elements.")?;
        Ok(ExprKind::List(elements))
    }

    fn dict_literal(&mut self) -> PResult<ExprKind> {
        self.advance();
        let mut entries = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let key = self.expression()?;
            self.consume(TokenKind::Colon, "Expected ':' after dictionary key.")?;
            let value = self.expression()?;
            entries.push((key, value));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume_close(TokenKind::RightBrace, "Expected '}' after dictionary entries.")?;
        Ok(ExprKind::Dict(entries))
    }
}
