//! Restricted literal parser.
//!
//! Reads the textual form of builtin values: numbers, quoted strings,
//! `True`/`False`/`None`, lists, tuples, sets and dicts. Nothing is ever
//! evaluated; names other than the three constants (and `set()`) are rejected.
//!
//! ```rust,ignore
//! use sigcast_value::{Value, parse_literal};
//!
//! assert_eq!(parse_literal("(1, 'a')")?, Value::tuple([Value::from(1), Value::from("a")]));
//! assert_eq!(parse_literal("1, 2")?, Value::tuple([1, 2]));
//! ```

use indexmap::{IndexMap, IndexSet};

use crate::error::LiteralError;
use crate::value::Value;

/// Maximum container nesting accepted by the parser.
pub const MAX_DEPTH: usize = 64;

/// Parses `input` as a literal value.
///
/// A bare top-level comma list (`1, 2`) is read as a tuple.
///
/// # Errors
///
/// Returns [`LiteralError`] when the input is not a well-formed literal, uses a
/// name other than `True`, `False`, `None`, or nests deeper than [`MAX_DEPTH`].
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
    };
    let value = parser.parse_top()?;
    parser.expect_eof()?;
    Ok(value)
}

// ============================================================================
// LEXER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Plus,
    Minus,
    Integer(i64),
    Float(f64),
    Str(String),
    Name(String),
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, LiteralError> {
        let mut tokens = Vec::with_capacity((self.input.len() / 3).max(4));
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LiteralError> {
        self.skip_whitespace();
        let start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: start,
            });
        };

        let kind = match ch {
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '"' | '\'' => self.read_string(ch)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_alphabetic() || c == '_' => self.read_name(),
            other => {
                return Err(LiteralError::new(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };

        Ok(Token {
            kind,
            position: start,
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek(&self) -> Option<char> {
        let current = self.current_char()?;
        self.input[self.position + current.len_utf8()..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<TokenKind, LiteralError> {
        let start = self.position;
        self.advance();
        let mut out = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            match ch {
                c if c == quote => return Ok(TokenKind::Str(out)),
                '\n' => break,
                '\\' => {
                    let escape_at = self.position - 1;
                    let Some(escaped) = self.current_char() else {
                        break;
                    };
                    self.advance();
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' => out.push(escaped),
                        '\n' => {}
                        'x' => out.push(self.read_code_point(2, escape_at)?),
                        'u' => out.push(self.read_code_point(4, escape_at)?),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                c => out.push(c),
            }
        }

        Err(LiteralError::new(start, "unterminated string literal"))
    }

    fn read_code_point(&mut self, digits: usize, escape_at: usize) -> Result<char, LiteralError> {
        let end = self.position + digits;
        let hex = self
            .input
            .get(self.position..end)
            .filter(|s| s.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| LiteralError::new(escape_at, "truncated escape sequence"))?;
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| LiteralError::new(escape_at, "truncated escape sequence"))?;
        let ch = char::from_u32(code)
            .ok_or_else(|| LiteralError::new(escape_at, "invalid code point in escape"))?;
        self.position = end;
        Ok(ch)
    }

    fn read_number(&mut self) -> Result<TokenKind, LiteralError> {
        let start = self.position;

        if self.current_char() == Some('0') {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.advance();
                let digits_start = self.position;
                self.consume_digits(|c| c.is_digit(radix));
                let digits: String = self.input[digits_start..self.position]
                    .chars()
                    .filter(|c| *c != '_')
                    .collect();
                return i64::from_str_radix(&digits, radix)
                    .map(TokenKind::Integer)
                    .map_err(|_| LiteralError::new(start, "invalid integer literal"));
            }
        }

        let mut is_float = false;
        self.consume_digits(|c| c.is_ascii_digit());
        if self.current_char() == Some('.') {
            is_float = true;
            self.advance();
            self.consume_digits(|c| c.is_ascii_digit());
        }
        if matches!(self.current_char(), Some('e' | 'E')) {
            let mark = self.position;
            self.advance();
            if matches!(self.current_char(), Some('+' | '-')) {
                self.advance();
            }
            if self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.consume_digits(|c| c.is_ascii_digit());
            } else {
                self.position = mark;
            }
        }

        let text = &self.input[start..self.position];
        if text.ends_with('_') || text.contains("__") || text.contains("_.") {
            return Err(LiteralError::new(start, "invalid number literal"));
        }
        let clean: String = text.chars().filter(|c| *c != '_').collect();

        if is_float {
            clean
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| LiteralError::new(start, "invalid float literal"))
        } else {
            clean
                .parse::<i64>()
                .map(TokenKind::Integer)
                .map_err(|_| LiteralError::new(start, "integer literal out of range"))
        }
    }

    fn consume_digits(&mut self, is_digit: impl Fn(char) -> bool) {
        while let Some(ch) = self.current_char() {
            if is_digit(ch) || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_name(&mut self) -> TokenKind {
        let start = self.position;
        while self
            .current_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        TokenKind::Name(self.input[start..self.position].to_owned())
    }
}

// ============================================================================
// PARSER
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        // The lexer always terminates the stream with Eof and the parser never
        // advances past it.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), LiteralError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_eof(&self) -> Result<(), LiteralError> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn unexpected(&self, expected: &str) -> LiteralError {
        let token = self.current();
        let found = match &token.kind {
            TokenKind::Eof => "end of input".to_owned(),
            other => format!("{other:?}"),
        };
        LiteralError::new(token.position, format!("expected {expected}, found {found}"))
    }

    fn parse_top(&mut self) -> Result<Value, LiteralError> {
        let first = self.parse_value()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::Eof) {
                break;
            }
            items.push(self.parse_value()?);
        }
        Ok(Value::Tuple(items))
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        let start = self.index;
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(i) => Ok(Value::Int(i)),
            TokenKind::Float(f) => Ok(Value::Float(f)),
            TokenKind::Str(s) => Ok(Value::Str(s)),
            TokenKind::Plus => self.parse_signed(token.position, false),
            TokenKind::Minus => self.parse_signed(token.position, true),
            TokenKind::Name(name) => self.parse_name(&name, token.position),
            TokenKind::LeftBracket => self.nested(token.position, |p| {
                p.parse_items(&TokenKind::RightBracket).map(Value::List)
            }),
            TokenKind::LeftParen => self.nested(token.position, Self::parse_paren),
            TokenKind::LeftBrace => self.nested(token.position, Self::parse_brace),
            _ => {
                self.index = start;
                Err(self.unexpected("a literal"))
            }
        }
    }

    fn nested(
        &mut self,
        position: usize,
        parse: impl FnOnce(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::new(position, "literal nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_signed(&mut self, position: usize, negate: bool) -> Result<Value, LiteralError> {
        match self.advance().kind {
            TokenKind::Integer(i) if negate => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| LiteralError::new(position, "integer literal out of range")),
            TokenKind::Integer(i) => Ok(Value::Int(i)),
            TokenKind::Float(f) => Ok(Value::Float(if negate { -f } else { f })),
            _ => Err(LiteralError::new(position, "sign must precede a number")),
        }
    }

    fn parse_name(&mut self, name: &str, position: usize) -> Result<Value, LiteralError> {
        match name {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::None),
            "set" if self.check(&TokenKind::LeftParen) => {
                self.advance();
                self.expect(&TokenKind::RightParen, "')'")?;
                Ok(Value::Set(IndexSet::new()))
            }
            other => Err(LiteralError::new(
                position,
                format!("malformed node or string: name '{other}'"),
            )),
        }
    }

    /// Comma separated values up to `close`, trailing comma allowed.
    fn parse_items(&mut self, close: &TokenKind) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.parse_value()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close, "',' or closing bracket")?;
                break;
            }
        }
        Ok(items)
    }

    fn parse_paren(&mut self) -> Result<Value, LiteralError> {
        if self.eat(&TokenKind::RightParen) {
            return Ok(Value::Tuple(Vec::new()));
        }
        let first = self.parse_value()?;
        if self.eat(&TokenKind::RightParen) {
            return Ok(first);
        }
        self.expect(&TokenKind::Comma, "',' or ')'")?;
        let mut items = vec![first];
        items.extend(self.parse_items(&TokenKind::RightParen)?);
        Ok(Value::Tuple(items))
    }

    fn parse_brace(&mut self) -> Result<Value, LiteralError> {
        if self.eat(&TokenKind::RightBrace) {
            return Ok(Value::Dict(IndexMap::new()));
        }
        let position = self.current().position;
        let first = self.parse_value()?;

        if self.eat(&TokenKind::Colon) {
            let mut map = IndexMap::new();
            let value = self.parse_value()?;
            map.insert(hashable(first, position)?, value);
            while self.eat(&TokenKind::Comma) {
                if self.check(&TokenKind::RightBrace) {
                    break;
                }
                let position = self.current().position;
                let key = hashable(self.parse_value()?, position)?;
                self.expect(&TokenKind::Colon, "':'")?;
                let value = self.parse_value()?;
                map.insert(key, value);
            }
            self.expect(&TokenKind::RightBrace, "'}'")?;
            return Ok(Value::Dict(map));
        }

        let mut set = IndexSet::new();
        set.insert(hashable(first, position)?);
        if self.eat(&TokenKind::Comma) {
            while !self.check(&TokenKind::RightBrace) {
                let position = self.current().position;
                set.insert(hashable(self.parse_value()?, position)?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(Value::Set(set))
    }
}

/// Rejects mutable containers as set members and dict keys.
fn hashable(value: Value, position: usize) -> Result<Value, LiteralError> {
    match value {
        Value::List(_) | Value::Set(_) | Value::Dict(_) => Err(LiteralError::new(
            position,
            format!("unhashable type: '{}'", value.type_name()),
        )),
        other => Ok(other),
    }
}
