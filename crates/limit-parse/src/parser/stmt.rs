use super::{PResult, Parser};
use limit_ast::ast::{
    ConcurrencyBlock, ConcurrencyConfig, Expr, ForLoop, MatchCase, Stmt, StmtKind,
};
use limit_ast::cst::NodeKind;
use limit_ast::token::TokenKind;

impl<'t, 'd> Parser<'t, 'd> {
    pub(super) fn statement(&mut self) -> PResult<Stmt> {
        use TokenKind::{
            Break, Comptime, Concurrent, Continue, Contract, For, Identifier, If, Iter, LeftBrace,
            LeftParen, Match, Parallel, Print, Return, Semicolon, Unsafe, While,
        };
        let (start, line) = self.start_pos();
        let node = match self.peek().kind {
            Print => NodeKind::PrintStatement,
            If => NodeKind::IfStatement,
            For => NodeKind::ForStatement,
            While => NodeKind::WhileStatement,
            Iter => NodeKind::IterStatement,
            LeftBrace => NodeKind::BlockStatement,
            Return => NodeKind::ReturnStatement,
            Break => NodeKind::BreakStatement,
            Continue => NodeKind::ContinueStatement,
            Parallel => NodeKind::ParallelStatement,
            Concurrent => NodeKind::ConcurrentStatement,
            Match => NodeKind::MatchStatement,
            Unsafe => NodeKind::UnsafeStatement,
            Contract => NodeKind::ContractStatement,
            Comptime => NodeKind::ComptimeStatement,
            Identifier if self.in_concurrent && self.check_at(1, LeftParen) => {
                match self.peek().lexeme.as_str() {
                    "task" => NodeKind::TaskStatement,
                    "worker" => NodeKind::WorkerStatement,
                    _ => NodeKind::ExpressionStatement,
                }
            }
            _ => NodeKind::ExpressionStatement,
        };

        self.sink.start(node);
        let kind = match node {
            NodeKind::PrintStatement => self.print_statement()?,
            NodeKind::IfStatement => self.if_statement()?,
            NodeKind::ForStatement => self.for_statement()?,
            NodeKind::WhileStatement => self.while_statement()?,
            NodeKind::IterStatement => self.iter_statement()?,
            NodeKind::BlockStatement => {
                let open = self.advance();
                StmtKind::Block(self.block_body(&open, "block"))
            }
            NodeKind::ReturnStatement => self.return_statement()?,
            NodeKind::BreakStatement => {
                self.advance();
                self.consume(Semicolon, "Expected ';' after 'break'.")?;
                StmtKind::Break
            }
            NodeKind::ContinueStatement => {
                self.advance();
                self.consume(Semicolon, "Expected ';' after 'continue'.")?;
                StmtKind::Continue
            }
            NodeKind::ParallelStatement => {
                StmtKind::Parallel(self.concurrency_block("parallel", ConcurrencyConfig::parallel())?)
            }
            NodeKind::ConcurrentStatement => StmtKind::Concurrent(
                self.concurrency_block("concurrent", ConcurrencyConfig::concurrent())?,
            ),
            NodeKind::TaskStatement => self.task_statement()?,
            NodeKind::WorkerStatement => self.worker_statement()?,
            NodeKind::MatchStatement => self.match_statement()?,
            NodeKind::UnsafeStatement => {
                self.advance();
                StmtKind::Unsafe(self.block("unsafe", "Expected '{' after 'unsafe'.")?)
            }
            NodeKind::ContractStatement => self.contract_statement()?,
            NodeKind::ComptimeStatement => {
                self.advance();
                StmtKind::Comptime(Box::new(self.declaration_inner()?))
            }
            _ => {
                let expr = self.expression()?;
                self.eat(Semicolon);
                StmtKind::Expression(expr)
            }
        };
        self.sink.finish();
        Ok(Stmt {
            kind,
            span: self.span_from(start),
            line,
        })
    }

    /// Body of `if`/`for`/`while`: a block carrying `kind` as its context,
    /// or a single statement.
    fn body_statement(&mut self, kind: &str) -> PResult<Stmt> {
        if !self.check(TokenKind::LeftBrace) {
            return self.statement();
        }
        let (start, line) = self.start_pos();
        self.sink.start(NodeKind::BlockStatement);
        let open = self.advance();
        let block = self.block_body(&open, kind);
        self.sink.finish();
        Ok(Stmt {
            kind: StmtKind::Block(block),
            span: self.span_from(start),
            line,
        })
    }

    fn print_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        let mut args = Vec::new();
        if self.eat(TokenKind::LeftParen) {
            if !self.check(TokenKind::RightParen) {
                args = self.expression_list()?;
            }
            self.consume(TokenKind::RightParen, "Expected ')' after print arguments.")?;
        } else {
            args = self.expression_list()?;
        }
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::Print(args))
    }

    fn expression_list(&mut self) -> PResult<Vec<Expr>> {
        let mut exprs = vec![self.expression()?];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.expression()?);
        }
        Ok(exprs)
    }

    /// `if (c) s [elif (c) s]* [else s]`; each `elif` nests as the else
    /// branch of the previous one.
    fn if_statement(&mut self) -> PResult<StmtKind> {
        let keyword = self.advance().lexeme;
        self.consume(TokenKind::LeftParen, &format!("Expected '(' after '{keyword}'."))?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after if condition.")?;
        let then_branch = Box::new(self.body_statement("if")?);

        let else_branch = if self.check(TokenKind::Elif) {
            let (start, line) = self.start_pos();
            self.sink.start(NodeKind::IfStatement);
            let kind = self.if_statement()?;
            self.sink.finish();
            Some(Box::new(Stmt {
                kind,
                span: self.span_from(start),
                line,
            }))
        } else if self.eat(TokenKind::Else) {
            Some(Box::new(self.body_statement("else")?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn for_statement(&mut self) -> PResult<StmtKind> {
        use TokenKind::{Comma, Identifier, In, LeftParen, RightParen, Semicolon, Var};
        self.advance();
        self.consume(LeftParen, "Expected '(' after 'for'.")?;

        let iterable_form = (self.check(Var) && matches!(self.peek_at(2).kind, In | Comma))
            || (self.check(Identifier) && matches!(self.peek_at(1).kind, In | Comma));
        if iterable_form {
            let (vars, iterable) = self.loop_header()?;
            self.consume(RightParen, "Expected ')' after for clauses.")?;
            let body = Box::new(self.body_statement("for")?);
            return Ok(StmtKind::For(ForLoop::Iterable {
                vars,
                iterable,
                body,
            }));
        }

        let init = if self.eat(Semicolon) {
            None
        } else {
            let init = if self.check(Var) {
                let (start, line) = self.start_pos();
                self.sink.start(NodeKind::VarDeclaration);
                let decl = self.var_declaration(&Default::default())?;
                self.sink.finish();
                Stmt {
                    kind: StmtKind::Var(decl),
                    span: self.span_from(start),
                    line,
                }
            } else {
                let (start, line) = self.start_pos();
                self.sink.start(NodeKind::ExpressionStatement);
                let expr = self.expression()?;
                self.sink.finish();
                Stmt {
                    kind: StmtKind::Expression(expr),
                    span: self.span_from(start),
                    line,
                }
            };
            if !self.previous().is(Semicolon) {
                self.consume(Semicolon, "Expected ';' after loop initializer.")?;
            }
            Some(Box::new(init))
        };
        let condition = if self.check(Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(Semicolon, "Expected ';' after loop condition.")?;
        let increment = if self.check(RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(RightParen, "Expected ')' after for clauses.")?;
        let body = Box::new(self.body_statement("for")?);
        Ok(StmtKind::For(ForLoop::Traditional {
            init,
            condition,
            increment,
            body,
        }))
    }

    /// `[var] a[, b] in expr`, shared by `for` and `iter`.
    fn loop_header(&mut self) -> PResult<(Vec<String>, Expr)> {
        self.eat(TokenKind::Var);
        let mut vars = vec![self.consume_ident("Expected loop variable name.")?];
        while self.eat(TokenKind::Comma) {
            vars.push(self.consume_ident("Expected loop variable name.")?);
        }
        self.consume(TokenKind::In, "Expected 'in' after loop variables.")?;
        let iterable = self.expression()?;
        Ok((vars, iterable))
    }

    fn while_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition.")?;
        let body = Box::new(self.body_statement("while")?);
        Ok(StmtKind::While { condition, body })
    }

    fn iter_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.consume(TokenKind::LeftParen, "Expected '(' after 'iter'.")?;
        let (vars, iterable) = self.loop_header()?;
        self.consume(TokenKind::RightParen, "Expected ')' after iter clauses.")?;
        let body = Box::new(self.body_statement("iter")?);
        Ok(StmtKind::Iter {
            vars,
            iterable,
            body,
        })
    }

    fn return_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        let value = match self.peek().kind {
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof => None,
            _ => Some(self.expression()?),
        };
        self.eat(TokenKind::Semicolon);
        Ok(StmtKind::Return(value))
    }

    // ======= concurrency =======

    fn concurrency_block(
        &mut self,
        keyword: &str,
        defaults: ConcurrencyConfig,
    ) -> PResult<ConcurrencyBlock> {
        self.advance();
        let config = self.concurrency_params(defaults)?;
        let saved = self.in_concurrent;
        self.in_concurrent = true;
        let body = self.block(keyword, &format!("Expected '{{' after '{keyword}'."));
        self.in_concurrent = saved;
        Ok(ConcurrencyBlock {
            config,
            body: body?,
        })
    }

    /// `(key = value, ...)`. Values are strings, numbers with their unit
    /// suffix, or bare identifiers. `name: Type` entries are accepted and
    /// ignored.
    fn concurrency_params(&mut self, mut config: ConcurrencyConfig) -> PResult<ConcurrencyConfig> {
        use TokenKind::{Colon, Comma, Equal, Identifier, LeftParen, RightParen, String};
        if !self.eat(LeftParen) {
            return Ok(config);
        }
        while !self.check(RightParen) && !self.is_at_end() {
            let key = self.consume(Identifier, "Expected parameter name")?;
            if self.eat(Colon) {
                self.type_annotation()?;
            } else {
                self.consume(Equal, "Expected '=' or ':' after parameter name")?;
                let value = match self.peek().kind {
                    String => self.advance().value.unwrap_or_default(),
                    kind if kind.is_number() => self.advance().lexeme,
                    Identifier => self.advance().lexeme,
                    _ => {
                        return Err(
                            self.error("Expected string, number, or identifier as parameter value")
                        )
                    }
                };
                match key.lexeme.as_str() {
                    "ch" => config.channel = Some(value),
                    "mode" => config.mode = value,
                    "cores" => config.cores = value,
                    "on_error" => config.on_error = value,
                    "timeout" => config.timeout = value,
                    "grace" => config.grace = value,
                    "on_timeout" => config.on_timeout = value,
                    other => self.report_at(&key, &format!("Unknown parameter: {other}")),
                }
            }
            if !self.eat(Comma) && !self.check(RightParen) {
                return Err(self.error("Expected ',' or ')' after parameter"));
            }
        }
        self.consume(RightParen, "Expected ')' after parameters")?;
        Ok(config)
    }

    /// `task([name in] expr) { ... }`
    fn task_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.advance();
        let var = if self.check(TokenKind::Identifier) && self.check_at(1, TokenKind::In) {
            let name = self.advance().lexeme;
            self.advance();
            Some(name)
        } else {
            None
        };
        let iterable = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after task header.")?;
        let body = self.block("task", "Expected '{' after task header.")?;
        Ok(StmtKind::Task {
            var,
            iterable,
            body,
        })
    }

    /// `worker([param]) { ... }`
    fn worker_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.advance();
        let param = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expected ')' after worker parameter.")?;
        let body = self.block("worker", "Expected '{' after worker header.")?;
        Ok(StmtKind::Worker { param, body })
    }

    // ======= match, contract =======

    fn match_statement(&mut self) -> PResult<StmtKind> {
        use TokenKind::{Arrow, Comma, LeftBrace, LeftParen, RightBrace, RightParen, Where};
        self.advance();
        self.consume(LeftParen, "Expected '(' after 'match'.")?;
        let scrutinee = self.expression()?;
        self.consume(RightParen, "Expected ')' after match expression.")?;
        let open = self.consume(LeftBrace, "Expected '{' before match cases.")?;
        self.push_block("match", &open);

        let mut cases = Vec::new();
        while !self.check(RightBrace) && !self.is_at_end() && !self.halted {
            self.sink.start(NodeKind::MatchCase);
            let pattern = self.pattern()?;
            let guard = if self.eat(Where) {
                Some(self.expression()?)
            } else {
                None
            };
            self.consume(Arrow, "Expected '=>' after match pattern.")?;
            let body = self.statement()?;
            self.eat(Comma);
            self.sink.finish();
            cases.push(MatchCase {
                pattern,
                guard,
                body,
            });
        }
        self.close_block("Expected '}' after match cases.");
        self.pop_block();
        Ok(StmtKind::Match { scrutinee, cases })
    }

    /// `contract(condition[, message]);`
    fn contract_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.consume(TokenKind::LeftParen, "Expected '(' after 'contract'.")?;
        let condition = self.expression()?;
        let message = if self.eat(TokenKind::Comma) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expected ')' after contract condition.")?;
        self.consume(TokenKind::Semicolon, "Expected ';' after contract statement.")?;
        Ok(StmtKind::Contract { condition, message })
    }
}
