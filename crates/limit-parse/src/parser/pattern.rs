use super::expr::literal_of;
use super::{PResult, Parser};
use limit_ast::ast::{DictPatternField, Pattern, PatternKind};
use limit_ast::cst::NodeKind;
use limit_ast::token::TokenKind;

/// Error types the runtime defines; matching on one of these names is an
/// error-type pattern rather than a plain identifier.
const BUILTIN_ERROR_TYPES: &[&str] = &[
    "DivisionByZero",
    "IndexOutOfBounds",
    "NullReference",
    "TypeConversion",
    "IOError",
    "ParseError",
    "NetworkError",
    "Error",
];

fn is_error_type(name: &str) -> bool {
    BUILTIN_ERROR_TYPES.contains(&name)
}

impl<'t, 'd> Parser<'t, 'd> {
    pub(super) fn pattern(&mut self) -> PResult<Pattern> {
        use TokenKind::{DictType, Identifier, LeftBrace, LeftBracket, LeftParen, ListType, Nil, Val};
        let (start, line) = self.start_pos();
        let token = self.peek().clone();
        let literal = literal_of(&token);
        let node = match token.kind {
            Val => NodeKind::ValPattern,
            TokenKind::Err => NodeKind::ErrPattern,
            Identifier if is_error_type(&token.lexeme) => NodeKind::ErrorTypePattern,
            TokenKind::Default => NodeKind::WildcardPattern,
            LeftBracket => NodeKind::ListPattern,
            LeftBrace => NodeKind::DictPattern,
            LeftParen => NodeKind::TuplePattern,
            Identifier if self.check_at(1, LeftParen) => NodeKind::BindingPattern,
            ListType | DictType => NodeKind::TypePattern,
            k if k.is_primitive_type() && k != Nil => NodeKind::TypePattern,
            Identifier => NodeKind::IdentifierPattern,
            _ if literal.is_some() => NodeKind::LiteralPattern,
            _ => return Err(self.error("Expected pattern in match case.")),
        };

        if node == NodeKind::TypePattern {
            // The type builds its own node; wrap it.
            let checkpoint = self.sink.checkpoint();
            let ty = self.pattern_type()?;
            self.sink.start_at(checkpoint, NodeKind::TypePattern);
            self.sink.finish();
            return Ok(Pattern {
                kind: PatternKind::Type(ty),
                span: self.span_from(start),
                line,
            });
        }

        self.sink.start(node);
        let kind = match node {
            NodeKind::ValPattern => {
                self.advance();
                PatternKind::Val(self.consume_ident("Expected variable name after 'val'.")?)
            }
            NodeKind::ErrPattern => {
                self.advance();
                let name = self.consume_ident("Expected identifier after 'err'.")?;
                let error_type = is_error_type(&name).then(|| name.clone());
                PatternKind::Err { name, error_type }
            }
            NodeKind::ErrorTypePattern => {
                let error_type = self.advance().lexeme;
                let mut params = Vec::new();
                if self.eat(LeftParen) {
                    while !self.check(TokenKind::RightParen) && !self.is_at_end() {
                        let param = self.consume_ident("Expected parameter name in error pattern.")?;
                        params.push(param);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.consume(
                        TokenKind::RightParen,
                        "Expected ')' after error type parameters.",
                    )?;
                }
                PatternKind::ErrorType { error_type, params }
            }
            NodeKind::WildcardPattern => {
                self.advance();
                PatternKind::Wildcard
            }
            NodeKind::ListPattern => self.list_pattern()?,
            NodeKind::DictPattern => self.dict_pattern()?,
            NodeKind::TuplePattern => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(TokenKind::RightParen) && !self.is_at_end() {
                    elements.push(self.pattern()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::RightParen, "Expected ')' after tuple pattern.")?;
                PatternKind::Tuple(elements)
            }
            NodeKind::BindingPattern => {
                let type_name = self.advance().lexeme;
                self.advance();
                let variable = self.consume_ident("Expected variable name in binding pattern.")?;
                self.consume(TokenKind::RightParen, "Expected ')' after binding pattern.")?;
                PatternKind::Binding {
                    type_name,
                    variable,
                }
            }
            NodeKind::IdentifierPattern => PatternKind::Identifier(self.advance().lexeme),
            NodeKind::LiteralPattern => {
                let Some(literal) = literal else {
                    return Err(self.error("Expected pattern in match case."));
                };
                self.advance();
                PatternKind::Literal(literal)
            }
            _ => return Err(self.error("Expected pattern in match case.")),
        };
        self.sink.finish();
        Ok(Pattern {
            kind,
            span: self.span_from(start),
            line,
        })
    }

    /// `[p, q, ...rest]`
    fn list_pattern(&mut self) -> PResult<PatternKind> {
        self.advance();
        let mut elements = Vec::new();
        let mut rest = None;
        while !self.check(TokenKind::RightBracket) && !self.is_at_end() {
            if self.eat(TokenKind::Ellipsis) {
                rest = Some(self.consume_ident("Expected name after '...' in list pattern.")?);
            } else {
                elements.push(self.pattern()?);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightBracket, "Expected ']' after list pattern.")?;
        Ok(PatternKind::List { elements, rest })
    }

    /// `{key, key: binding, ...[rest]}`
    fn dict_pattern(&mut self) -> PResult<PatternKind> {
        self.advance();
        let mut fields = Vec::new();
        let mut has_rest = false;
        let mut rest_binding = None;
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.eat(TokenKind::Ellipsis) {
                has_rest = true;
                if self.check(TokenKind::Identifier) {
                    rest_binding = Some(self.advance().lexeme);
                }
            } else {
                let key = self.consume_ident("Expected field name in dict pattern.")?;
                let binding = if self.eat(TokenKind::Colon) {
                    self.consume_ident("Expected binding name after ':'.")?
                } else {
                    key.clone()
                };
                fields.push(DictPatternField { key, binding });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume_close(TokenKind::RightBrace, "Expected '}' after dict pattern.")?;
        Ok(PatternKind::Dict {
            fields,
            has_rest,
            rest_binding,
        })
    }
}
