use crate::error::{FoxError, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,

    // One or two character tokens
    Equal,
    EqualEqual,
    BangEqual,
    Greater,
    Less,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    Print,
    Input,
    Round,
    Random,
    Fox,
    Int,
    StringType,
    Void,
    While,
    If,
    Else,
    Array,
    Set,
    Get,
    Size,
    Include,
    Return,
    Global,

    // Special
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            span,
            line,
        }
    }
}

/// Turns script text into tokens. Spans are character offsets, which is what
/// the diagnostic renderer expects.
pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("print", TokenType::Print);
        keywords.insert("input", TokenType::Input);
        keywords.insert("round", TokenType::Round);
        keywords.insert("random", TokenType::Random);
        keywords.insert("fox", TokenType::Fox);
        keywords.insert("int", TokenType::Int);
        keywords.insert("string", TokenType::StringType);
        keywords.insert("void", TokenType::Void);
        keywords.insert("while", TokenType::While);
        keywords.insert("if", TokenType::If);
        keywords.insert("else", TokenType::Else);
        keywords.insert("array", TokenType::Array);
        keywords.insert("set", TokenType::Set);
        keywords.insert("get", TokenType::Get);
        keywords.insert("size", TokenType::Size);
        keywords.insert("include", TokenType::Include);
        keywords.insert("return", TokenType::Return);
        keywords.insert("global", TokenType::Global);

        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            keywords,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, FoxError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.current),
            self.line,
        ));

        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), FoxError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            '*' => self.add_token(TokenType::Star),
            '%' => self.add_token(TokenType::Percent),
            '<' => self.add_token(TokenType::Less),
            '>' => self.add_token(TokenType::Greater),
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(self.unexpected('!'));
                }
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            c if c.is_whitespace() => {}
            _ => return Err(self.unexpected(c)),
        }

        Ok(())
    }

    fn unexpected(&self, c: char) -> FoxError {
        FoxError::lex(
            Span::single(self.current - 1),
            self.line,
            format!("Unexpected character '{}'", c),
        )
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += 1;
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    fn string(&mut self) -> Result<(), FoxError> {
        let start_line = self.line;
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(FoxError::lex(
                Span::new(self.start, self.current),
                start_line,
                "Unterminated string".to_string(),
            )
            .with_help("String literals end at the next '\"'; there are no escapes."));
        }

        // Consume the closing "
        self.advance();

        // No escape processing: the content is everything between the quotes
        let content = self.text(self.start + 1, self.current - 1);
        self.tokens.push(Token::new(
            TokenType::String,
            content,
            Span::new(self.start, self.current),
            start_line,
        ));
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A trailing '.' belongs to the literal even without fraction digits
        if self.peek() == '.' {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.add_token(TokenType::Number);
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.text(self.start, self.current);
        let token_type = self
            .keywords
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.tokens.push(Token::new(
            token_type,
            text,
            Span::new(self.start, self.current),
            self.line,
        ));
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.text(self.start, self.current);
        self.tokens.push(Token::new(
            token_type,
            text,
            Span::new(self.start, self.current),
            self.line,
        ));
    }
}
