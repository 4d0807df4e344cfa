use crate::ast::{BinaryOp, CompareOp, DeclTarget, Expr, FunctionDef, Param, Stmt, TypeName};
use crate::error::{FoxError, Span};
use crate::lexer::{Token, TokenType};

/// Effects that happen while parsing rather than while evaluating: function
/// definitions are registered as soon as they are parsed, and included files
/// are processed at the point the `include` statement is read.
pub trait ParseHooks {
    fn define_function(&mut self, def: FunctionDef) -> Result<(), FoxError>;
    fn include(&mut self, path: &str, token: &Token) -> Result<(), FoxError>;
}

/// Recursive-descent parser. Top-level statements are handed out one at a
/// time through [`Parser::next_statement`] so the caller can evaluate each one
/// before the next is parsed; block bodies are parsed whole.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn next_statement(
        &mut self,
        hooks: &mut dyn ParseHooks,
    ) -> Result<Option<Stmt>, FoxError> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.statement(hooks).map(Some)
    }

    /// Parses the rest of the input without evaluating anything in between.
    pub fn parse_all(&mut self, hooks: &mut dyn ParseHooks) -> Result<Vec<Stmt>, FoxError> {
        let mut statements = Vec::new();
        while let Some(stmt) = self.next_statement(hooks)? {
            statements.push(stmt);
        }
        Ok(statements)
    }

    fn statement(&mut self, hooks: &mut dyn ParseHooks) -> Result<Stmt, FoxError> {
        match self.peek().token_type {
            TokenType::Include => self.include_statement(hooks),
            TokenType::Global => self.global_declaration(),
            TokenType::Int | TokenType::StringType | TokenType::Void => {
                self.typed_declaration(hooks)
            }
            TokenType::Return => self.return_statement(),
            TokenType::While => self.while_statement(hooks),
            TokenType::If => self.if_statement(hooks),
            TokenType::Print => self.print_statement(),
            TokenType::Fox => self.fox_statement(),
            TokenType::Array => self.array_declaration(),
            TokenType::Set => self.set_statement(),
            TokenType::Identifier => self.identifier_statement(),
            _ => {
                let token = self.peek();
                Err(FoxError::syntax(
                    token.span.clone(),
                    token.line,
                    format!("Unknown statement starting with {}", describe(token)),
                ))
            }
        }
    }

    fn block(&mut self, hooks: &mut dyn ParseHooks) -> Result<Vec<Stmt>, FoxError> {
        self.consume(TokenType::LeftBrace, "Expected '{' before block")?;
        let mut statements = Vec::new();

        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement(hooks)?);
        }

        self.consume(TokenType::RightBrace, "Expected '}' after block")?;
        Ok(statements)
    }

    fn include_statement(&mut self, hooks: &mut dyn ParseHooks) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        self.consume(TokenType::LeftParen, "Expected '(' after 'include'")?;
        let file = self
            .consume(TokenType::String, "Expected a quoted file name in include")?
            .clone();
        self.consume(TokenType::RightParen, "Expected ')' after include file name")?;
        self.consume(TokenType::Semicolon, "Expected ';' after include")?;

        hooks.include(&file.lexeme, &file)?;

        Ok(Stmt::Include {
            path: file.lexeme,
            span: self.span_from(start),
        })
    }

    fn global_declaration(&mut self) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        let ty = self.type_name("Expected 'int' or 'string' after 'global'")?;
        let name_token = self
            .consume(TokenType::Identifier, "Expected variable name")?
            .clone();
        self.variable_rest(ty, name_token, DeclTarget::Global, start)
    }

    fn typed_declaration(&mut self, hooks: &mut dyn ParseHooks) -> Result<Stmt, FoxError> {
        let start = self.peek().span.start;
        let ty = self.type_name("Expected a type")?;
        let name_token = self
            .consume(TokenType::Identifier, "Expected a name after the type")?
            .clone();

        if self.check(TokenType::LeftParen) {
            return self.function_definition(ty, name_token, start, hooks);
        }

        self.variable_rest(ty, name_token, DeclTarget::Current, start)
    }

    fn variable_rest(
        &mut self,
        ty: TypeName,
        name_token: Token,
        target: DeclTarget,
        start: usize,
    ) -> Result<Stmt, FoxError> {
        self.consume(TokenType::Equal, "Expected '=' in variable declaration")
            .map_err(|e| e.with_help("Variables are declared as: int name = value;"))?;
        let initializer = self.comparison()?;
        self.consume(TokenType::Semicolon, "Expected ';' after variable declaration")?;

        Ok(Stmt::VarDecl {
            ty,
            name: name_token.lexeme,
            initializer,
            target,
            span: self.span_from(start),
            line: name_token.line,
        })
    }

    fn function_definition(
        &mut self,
        return_type: TypeName,
        name_token: Token,
        start: usize,
        hooks: &mut dyn ParseHooks,
    ) -> Result<Stmt, FoxError> {
        self.consume(TokenType::LeftParen, "Expected '(' after function name")?;
        let mut params = Vec::new();

        if !self.check(TokenType::RightParen) {
            loop {
                let ty = self.type_name("Expected parameter type")?;
                let name = self
                    .consume(TokenType::Identifier, "Expected parameter name")?
                    .lexeme
                    .clone();
                params.push(Param { name, ty });

                if !self.match_type(TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;
        let body = self.block(hooks)?;
        let span = self.span_from(start);

        hooks.define_function(FunctionDef {
            name: name_token.lexeme.clone(),
            return_type,
            params,
            body,
            line: name_token.line,
        })?;

        Ok(Stmt::FunctionDef {
            name: name_token.lexeme,
            span,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.comparison()?)
        };
        self.consume(TokenType::Semicolon, "Expected ';' after return")?;

        Ok(Stmt::Return {
            value,
            span: self.span_from(start),
        })
    }

    fn while_statement(&mut self, hooks: &mut dyn ParseHooks) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        self.consume(TokenType::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.comparison()?;
        self.consume(TokenType::RightParen, "Expected ')' after while condition")?;
        let body = self.block(hooks)?;

        Ok(Stmt::While {
            condition,
            body,
            span: self.span_from(start),
        })
    }

    fn if_statement(&mut self, hooks: &mut dyn ParseHooks) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        self.consume(TokenType::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.comparison()?;
        self.consume(TokenType::RightParen, "Expected ')' after if condition")?;
        let then_branch = self.block(hooks)?;

        let else_branch = if self.match_type(TokenType::Else) {
            if self.check(TokenType::If) {
                Some(Box::new(self.if_statement(hooks)?))
            } else {
                let else_start = self.peek().span.start;
                let statements = self.block(hooks)?;
                Some(Box::new(Stmt::Block {
                    statements,
                    span: self.span_from(else_start),
                }))
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: self.span_from(start),
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        self.consume(TokenType::LeftParen, "Expected '(' after 'print'")?;
        let expr = self.comparison()?;
        self.consume(TokenType::RightParen, "Expected ')' after print argument")?;
        self.consume(TokenType::Semicolon, "Expected ';' after print")?;

        Ok(Stmt::Print {
            expr,
            span: self.span_from(start),
        })
    }

    fn fox_statement(&mut self) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        self.consume(TokenType::LeftParen, "Expected '(' after 'fox'")?;
        self.consume(TokenType::RightParen, "Expected ')' after 'fox('")?;
        self.consume(TokenType::Semicolon, "Expected ';' after fox()")?;

        Ok(Stmt::Fox {
            span: self.span_from(start),
        })
    }

    fn array_declaration(&mut self) -> Result<Stmt, FoxError> {
        let start = self.advance().span.start;
        let name_token = self
            .consume(TokenType::Identifier, "Expected array name after 'array'")?
            .clone();
        let size = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after array declaration")
            .map_err(|e| e.with_help("Arrays are declared as: array name size;"))?;

        Ok(Stmt::ArrayDecl {
            name: name_token.lexeme,
            size,
            span: self.span_from(start),
            line: name_token.line,
        })
    }

    fn set_statement(&mut self) -> Result<Stmt, FoxError> {
        let start_token = self.advance().clone();
        self.consume(TokenType::LeftParen, "Expected '(' after 'set'")?;
        let name = self
            .consume(TokenType::Identifier, "Expected array name in set")?
            .lexeme
            .clone();
        self.consume(TokenType::Comma, "Expected ',' after array name")?;
        let index = self.comparison()?;
        self.consume(TokenType::Comma, "Expected ',' after index")?;
        let value = self.comparison()?;
        self.consume(TokenType::RightParen, "Expected ')' after set arguments")?;
        self.consume(TokenType::Semicolon, "Expected ';' after set")?;

        Ok(Stmt::ArraySet {
            name,
            index,
            value,
            span: self.span_from(start_token.span.start),
            line: start_token.line,
        })
    }

    /// `name = expr;` or `name(args);`, told apart by the token after the name.
    fn identifier_statement(&mut self) -> Result<Stmt, FoxError> {
        let name_token = self.peek().clone();
        let start = name_token.span.start;

        match self.peek_next().token_type {
            TokenType::Equal => {
                self.advance();
                self.advance();
                let value = self.comparison()?;
                self.consume(TokenType::Semicolon, "Expected ';' after assignment")?;
                Ok(Stmt::Assign {
                    name: name_token.lexeme,
                    value,
                    span: self.span_from(start),
                    line: name_token.line,
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.finish_call(name_token)?;
                self.consume(TokenType::Semicolon, "Expected ';' after call")?;
                Ok(Stmt::Expression {
                    expr,
                    span: self.span_from(start),
                })
            }
            _ => Err(FoxError::syntax(
                name_token.span.clone(),
                name_token.line,
                format!("Unknown statement starting with '{}'", name_token.lexeme),
            )
            .with_help("A statement starting with a name must be an assignment or a call.")),
        }
    }

    /// `comparison := expression [ ('=='|'!='|'<'|'>') expression ]`
    fn comparison(&mut self) -> Result<Expr, FoxError> {
        let left = self.expression()?;

        let operator = match self.peek().token_type {
            TokenType::EqualEqual => CompareOp::Equal,
            TokenType::BangEqual => CompareOp::NotEqual,
            TokenType::Less => CompareOp::Less,
            TokenType::Greater => CompareOp::Greater,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.expression()?;
        let span = Span::new(left.span().start, right.span().end);
        Ok(Expr::Compare {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        })
    }

    fn expression(&mut self) -> Result<Expr, FoxError> {
        let mut expr = self.multiplication()?;

        loop {
            let operator = match self.peek().token_type {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.multiplication()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn multiplication(&mut self) -> Result<Expr, FoxError> {
        let mut expr = self.primary()?;

        loop {
            let operator = match self.peek().token_type {
                TokenType::Star => BinaryOp::Multiply,
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.primary()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, FoxError> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::Minus => {
                // Unary minus is sugar for 0 - x
                self.advance();
                let operand = self.primary()?;
                let zero = Expr::Number {
                    text: "0".to_string(),
                    span: token.span.clone(),
                };
                Ok(binary(zero, BinaryOp::Subtract, operand))
            }
            TokenType::Number => {
                self.advance();
                Ok(Expr::Number {
                    text: token.lexeme,
                    span: token.span,
                })
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::Str {
                    text: token.lexeme,
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                self.advance();
                if self.check(TokenType::LeftParen) {
                    self.finish_call(token)
                } else {
                    Ok(Expr::Variable {
                        name: token.lexeme,
                        span: token.span,
                        line: token.line,
                    })
                }
            }
            TokenType::Get => {
                self.advance();
                self.consume(TokenType::LeftParen, "Expected '(' after 'get'")?;
                let name = self
                    .consume(TokenType::Identifier, "Expected array name in get")?
                    .lexeme
                    .clone();
                self.consume(TokenType::Comma, "Expected ',' after array name")?;
                let index = self.comparison()?;
                self.consume(TokenType::RightParen, "Expected ')' after get arguments")?;
                Ok(Expr::ArrayGet {
                    name,
                    index: Box::new(index),
                    span: self.span_from(token.span.start),
                    line: token.line,
                })
            }
            TokenType::Size => {
                self.advance();
                self.consume(TokenType::LeftParen, "Expected '(' after 'size'")?;
                let name = self
                    .consume(TokenType::Identifier, "Expected array name in size")?
                    .lexeme
                    .clone();
                self.consume(TokenType::RightParen, "Expected ')' after array name")?;
                Ok(Expr::ArraySize {
                    name,
                    span: self.span_from(token.span.start),
                })
            }
            TokenType::Input => {
                self.advance();
                self.empty_parens("input")?;
                Ok(Expr::Input {
                    span: self.span_from(token.span.start),
                    line: token.line,
                })
            }
            TokenType::Round => {
                self.advance();
                self.consume(TokenType::LeftParen, "Expected '(' after 'round'")?;
                let expr = self.comparison()?;
                self.consume(TokenType::RightParen, "Expected ')' after round argument")?;
                Ok(Expr::Round {
                    expr: Box::new(expr),
                    span: self.span_from(token.span.start),
                })
            }
            TokenType::Random => {
                self.advance();
                self.empty_parens("random")?;
                Ok(Expr::Random {
                    span: self.span_from(token.span.start),
                })
            }
            TokenType::Fox => {
                self.advance();
                self.empty_parens("fox")?;
                Ok(Expr::Fox {
                    span: self.span_from(token.span.start),
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.comparison()?;
                self.consume(TokenType::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            _ => Err(FoxError::syntax(
                token.span.clone(),
                token.line,
                format!("Expected expression, found {}", describe(&token)),
            )),
        }
    }

    /// Parses `(args)` after a callee name that has already been consumed.
    fn finish_call(&mut self, name_token: Token) -> Result<Expr, FoxError> {
        self.consume(TokenType::LeftParen, "Expected '(' in call")?;
        let mut args = Vec::new();

        if !self.check(TokenType::RightParen) {
            loop {
                args.push(self.comparison()?);
                if !self.match_type(TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            name: name_token.lexeme,
            args,
            span: self.span_from(name_token.span.start),
            line: name_token.line,
        })
    }

    fn empty_parens(&mut self, builtin: &str) -> Result<(), FoxError> {
        self.consume(TokenType::LeftParen, &format!("Expected '(' after '{}'", builtin))?;
        self.consume(
            TokenType::RightParen,
            &format!("Expected ')' after '{}(': it takes no arguments", builtin),
        )?;
        Ok(())
    }

    fn type_name(&mut self, message: &str) -> Result<TypeName, FoxError> {
        let ty = match self.peek().token_type {
            TokenType::Int => TypeName::Int,
            TokenType::StringType => TypeName::String,
            TokenType::Void => TypeName::Void,
            _ => return Err(self.error_here(message)),
        };
        self.advance();
        Ok(ty)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.previous().span.end)
    }

    fn match_type(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, FoxError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: &str) -> FoxError {
        let token = self.peek();
        // At EOF, point just past the last real token
        let span = if self.is_at_end() && self.current > 0 {
            Span::single(self.previous().span.end)
        } else {
            token.span.clone()
        };
        FoxError::syntax(
            span,
            token.line,
            format!("{}, found {}", message, describe(token)),
        )
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    let span = Span::new(left.span().start, right.span().end);
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of input".to_string(),
        TokenType::String => format!("\"{}\"", token.lexeme),
        _ => format!("'{}'", token.lexeme),
    }
}
