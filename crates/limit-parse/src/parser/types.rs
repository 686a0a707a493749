use super::{PResult, Parser};
use limit_ast::ast::{FunctionTypeParam, StructField, TypeAnnotation, TypeKind};
use limit_ast::cst::NodeKind;
use limit_ast::span::Span;
use limit_ast::token::{Token, TokenKind};

/// Names that make `{ name: T }` a dictionary type rather than a record.
const BUILTIN_TYPE_NAMES: &[&str] = &[
    "any", "str", "int", "float", "bool", "list", "dict", "option", "result", "i8", "i16", "i32",
    "i64", "u8", "u16", "u32", "u64", "f32", "f64", "uint", "nil", "tuple", "function",
];

/// Not usable as parameter names inside a function type.
const RESERVED_PARAM_NAMES: &[&str] = &[
    "int", "uint", "float", "str", "string", "bool", "any", "nil", "list", "dict", "array",
    "function", "option", "result", "channel", "atomic",
];

fn is_builtin_type_name(token: &Token) -> bool {
    token.kind.is_primitive_type() || BUILTIN_TYPE_NAMES.contains(&token.lexeme.as_str())
}

/// Identifiers and keywords both work as record field names.
fn is_word(token: &Token) -> bool {
    token.is(TokenKind::Identifier)
        || token
            .kind
            .text()
            .is_some_and(|t| t.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

impl<'t, 'd> Parser<'t, 'd> {
    pub(super) fn type_annotation(&mut self) -> PResult<TypeAnnotation> {
        self.type_with(true)
    }

    /// Type position inside a match pattern, where `where` starts a guard.
    pub(super) fn pattern_type(&mut self) -> PResult<TypeAnnotation> {
        self.type_with(false)
    }

    /// `T | U`, `T and U`, or `T where cond`. Members are basic types.
    fn type_with(&mut self, allow_refinement: bool) -> PResult<TypeAnnotation> {
        let checkpoint = self.sink.checkpoint();
        let (start, line) = self.start_pos();
        let first = self.basic_type()?;

        let combined = match self.peek().kind {
            TokenKind::Pipe => Some((NodeKind::UnionType, TokenKind::Pipe)),
            TokenKind::And => Some((NodeKind::IntersectionType, TokenKind::And)),
            _ => None,
        };
        if let Some((node, separator)) = combined {
            self.sink.start_at(checkpoint, node);
            let mut members = vec![first];
            while self.eat(separator) {
                members.push(self.basic_type()?);
            }
            self.sink.finish();
            let kind = if separator == TokenKind::Pipe {
                TypeKind::Union(members)
            } else {
                TypeKind::Intersection(members)
            };
            return Ok(TypeAnnotation::new(kind, self.span_from(start), line));
        }

        if allow_refinement && self.check(TokenKind::Where) {
            self.sink.start_at(checkpoint, NodeKind::RefinedType);
            self.advance();
            let condition = self.expression()?;
            self.sink.finish();
            let mut refined = first;
            refined.refinement = Some(Box::new(condition));
            refined.span = self.span_from(start);
            return Ok(refined);
        }
        Ok(first)
    }

    /// One type with its `?` suffix: `T?` is optional, `T? E1, E2` is
    /// fallible with the listed error types.
    fn basic_type(&mut self) -> PResult<TypeAnnotation> {
        use TokenKind::{
            ArrayType, DictType, FunctionType, Identifier, LeftBrace, LeftBracket, LeftParen,
            ListType, OptionType, String,
        };
        let (start, line) = self.start_pos();
        let kind = self.peek().kind;
        let node = match kind {
            LeftBracket | ListType | ArrayType => NodeKind::ListType,
            LeftParen => NodeKind::TupleType,
            LeftBrace if is_builtin_type_name(self.peek_at(1)) => NodeKind::DictType,
            LeftBrace => NodeKind::StructuralType,
            DictType => NodeKind::DictType,
            TokenKind::Fn | FunctionType => NodeKind::FunctionType,
            String => NodeKind::LiteralType,
            Identifier | OptionType => NodeKind::NamedType,
            k if k.is_primitive_type() => NodeKind::PrimitiveType,
            _ => return Err(self.error("Expected type name.")),
        };

        self.sink.start(node);
        let mut ty = match node {
            NodeKind::TupleType => self.tuple_type()?,
            NodeKind::StructuralType => self.structural_type(start, line)?,
            _ => {
                let kind = match kind {
                    LeftBracket => self.list_type()?,
                    ListType | ArrayType => {
                        let keyword = if kind == ListType { "list" } else { "array" };
                        self.advance();
                        TypeKind::List {
                            keyword,
                            element: None,
                        }
                    }
                    LeftBrace => self.dict_type()?,
                    DictType => {
                        self.advance();
                        TypeKind::Dict {
                            key: None,
                            value: None,
                        }
                    }
                    TokenKind::Fn => self.function_type()?,
                    FunctionType => self.legacy_function_type()?,
                    String => {
                        let token = self.advance();
                        TypeKind::Literal(format!("\"{}\"", token.value.unwrap_or_default()))
                    }
                    Identifier | OptionType => TypeKind::Named(self.advance().lexeme),
                    _ => TypeKind::Primitive(self.advance().lexeme),
                };
                TypeAnnotation::new(kind, self.span_from(start), line)
            }
        };

        if self.eat(TokenKind::Question) {
            if self.check(Identifier) {
                ty.fallible = true;
                ty.error_types.push(self.advance().lexeme);
                // `fn f(a: int? E, b: int)`: the comma before `b:` ends the type.
                while self.eat(TokenKind::Comma) {
                    if self.check(Identifier) && !self.check_at(1, TokenKind::Colon) {
                        ty.error_types.push(self.advance().lexeme);
                    } else {
                        self.rewind();
                        break;
                    }
                }
            } else {
                ty.optional = true;
            }
        }
        self.sink.finish();
        ty.span = self.span_from(start);
        Ok(ty)
    }

    /// `[T]`; `[]` leaves the element open.
    fn list_type(&mut self) -> PResult<TypeKind> {
        self.advance();
        let element = if self.check(TokenKind::RightBracket) {
            None
        } else {
            Some(Box::new(self.type_annotation()?))
        };
        self.consume(TokenKind::RightBracket, "Expected ']' after list element type.")?;
        Ok(TypeKind::List {
            keyword: "list",
            element,
        })
    }

    /// `(T, U)`; a single parenthesized type without a comma is just that
    /// type.
    fn tuple_type(&mut self) -> PResult<TypeAnnotation> {
        let (start, line) = self.start_pos();
        self.advance();
        let mut members = Vec::new();
        let mut trailing_comma = false;
        while !self.check(TokenKind::RightParen) && !self.is_at_end() {
            members.push(self.type_annotation()?);
            trailing_comma = self.eat(TokenKind::Comma);
            if !trailing_comma {
                break;
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after tuple types.")?;
        if members.len() == 1 && !trailing_comma {
            if let Some(inner) = members.pop() {
                return Ok(inner);
            }
        }
        Ok(TypeAnnotation::new(
            TypeKind::Tuple(members),
            self.span_from(start),
            line,
        ))
    }

    /// `{K: V}`
    fn dict_type(&mut self) -> PResult<TypeKind> {
        self.advance();
        let key = self.basic_type()?;
        self.consume(TokenKind::Colon, "Expected ':' in dictionary type.")?;
        let value = self.type_annotation()?;
        self.consume_close(TokenKind::RightBrace, "Expected '}' after dictionary type.")?;
        Ok(TypeKind::Dict {
            key: Some(Box::new(key)),
            value: Some(Box::new(value)),
        })
    }

    /// `{ name: T, "quoted": U, ...Base }`. Commas are optional.
    fn structural_type(&mut self, start: u32, line: u32) -> PResult<TypeAnnotation> {
        self.advance();
        let mut fields = Vec::new();
        let mut has_rest = false;
        let mut base_records = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.eat(TokenKind::Ellipsis) {
                has_rest = true;
                if self.check(TokenKind::Identifier) {
                    base_records.push(self.advance().lexeme);
                }
            } else {
                let name = if self.check(TokenKind::String) {
                    self.advance().value.unwrap_or_default()
                } else if is_word(self.peek()) {
                    self.advance().lexeme
                } else {
                    return Err(self.error("Expected field name in structural type."));
                };
                self.consume(TokenKind::Colon, "Expected ':' after field name.")?;
                let ty = self.type_annotation()?;
                fields.push(StructField { name, ty });
            }
            self.eat(TokenKind::Comma);
        }
        self.consume_close(TokenKind::RightBrace, "Expected '}' after structural type.")?;
        let kind = TypeKind::Structural {
            fields,
            has_rest,
            base_records,
        };
        Ok(TypeAnnotation::new(kind, self.span_from(start), line))
    }

    /// `fn(params)[: R]`; without a return type the function returns `nil`.
    fn function_type(&mut self) -> PResult<TypeKind> {
        self.advance();
        self.consume(TokenKind::LeftParen, "Expected '(' after 'fn' in function type.")?;
        let params = self.function_type_params()?;
        let return_type = if self.eat(TokenKind::Colon) {
            self.type_annotation()?
        } else {
            let at = self.previous().span.end;
            TypeAnnotation::new(
                TypeKind::Primitive("nil".to_string()),
                Span::empty(at),
                self.previous().line,
            )
        };
        Ok(TypeKind::Function {
            params,
            return_type: Some(Box::new(return_type)),
        })
    }

    /// `function`, optionally followed by `(params)` and `: R`.
    fn legacy_function_type(&mut self) -> PResult<TypeKind> {
        self.advance();
        let params = if self.eat(TokenKind::LeftParen) {
            self.function_type_params()?
        } else {
            Vec::new()
        };
        let return_type = if self.eat(TokenKind::Colon) {
            Some(Box::new(self.basic_type()?))
        } else {
            None
        };
        Ok(TypeKind::Function {
            params,
            return_type,
        })
    }

    /// Parameters up to and including `)`.
    fn function_type_params(&mut self) -> PResult<Vec<FunctionTypeParam>> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RightParen) && !self.is_at_end() {
            params.push(self.function_type_param()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after function parameters.")?;
        Ok(params)
    }

    /// `name: T`, `name?: T`, or a bare `T`.
    fn function_type_param(&mut self) -> PResult<FunctionTypeParam> {
        self.sink.start(NodeKind::Parameter);
        let named = self.check(TokenKind::Identifier)
            && (self.check_at(1, TokenKind::Colon)
                || (self.check_at(1, TokenKind::Question) && self.check_at(2, TokenKind::Colon)));
        let param = if named {
            let name_token = self.advance();
            let optional = self.eat(TokenKind::Question);
            self.consume(TokenKind::Colon, "Expected ':' after parameter name.")?;
            let name = if RESERVED_PARAM_NAMES.contains(&name_token.lexeme.as_str()) {
                self.report_at(
                    &name_token,
                    &format!("Invalid parameter name: {}", name_token.lexeme),
                );
                None
            } else {
                Some(name_token.lexeme)
            };
            FunctionTypeParam {
                name,
                ty: self.type_annotation()?,
                optional,
            }
        } else {
            FunctionTypeParam {
                name: None,
                ty: self.type_annotation()?,
                optional: false,
            }
        };
        self.sink.finish();
        Ok(param)
    }
}
