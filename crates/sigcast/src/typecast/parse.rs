//! Parsing of annotation strings into [`TypeDecl`]s.
//!
//! Supports the builtin generics (`list[int]`, `tuple[int, ...]`,
//! `dict[str, list[float]]`), PEP 604 unions (`int | None`), the `typing`
//! spellings (`List`, `Dict`, `Tuple`, `Set`, `Optional`, `Union`,
//! `Annotated`, `Sequence`, `Mapping`, `Any`) and user names resolved through
//! a [`TypeNamespace`]. Dotted prefixes such as `typing.` are ignored.

use std::str::FromStr;

use indexmap::IndexMap;
use sigcast_value::{Value, parse_literal};
use thiserror::Error;

use super::decl::TypeDecl;

/// An annotation string could not be turned into a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type declaration at offset {position}: {message}")]
pub struct DeclParseError {
    pub position: usize,
    pub message: String,
}

impl DeclParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// User-defined names visible to [`TypeDecl::parse_in`].
#[derive(Debug, Clone, Default)]
pub struct TypeNamespace {
    names: IndexMap<String, TypeDecl>,
}

impl TypeNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a name, builder style.
    pub fn with(mut self, name: impl Into<String>, decl: TypeDecl) -> Self {
        self.insert(name, decl);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, decl: TypeDecl) {
        self.names.insert(name.into(), decl);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.names.get(name)
    }
}

impl TypeDecl {
    /// Parses an annotation using builtin names only.
    pub fn parse(input: &str) -> Result<Self, DeclParseError> {
        Self::parse_in(input, &TypeNamespace::new())
    }

    /// Parses an annotation, resolving user names through `namespace`.
    pub fn parse_in(input: &str, namespace: &TypeNamespace) -> Result<Self, DeclParseError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            tokens,
            index: 0,
            namespace,
        };
        let decl = parser.parse_union()?;
        let trailing = parser.current();
        if trailing.kind != Tok::Eof {
            return Err(DeclParseError::new(trailing.position, "unexpected trailing input"));
        }
        Ok(decl)
    }
}

impl FromStr for TypeDecl {
    type Err = DeclParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Name(String),
    TypeVar(String),
    Literal(Value),
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Comma,
    Pipe,
    Ellipsis,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: Tok,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, DeclParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '[' => Tok::LeftBracket,
            ']' => Tok::RightBracket,
            '(' => Tok::LeftParen,
            ')' => Tok::RightParen,
            ',' => Tok::Comma,
            '|' => Tok::Pipe,
            '.' if input[position..].starts_with("...") => {
                chars.next();
                chars.next();
                Tok::Ellipsis
            }
            '\'' | '"' => {
                let end = string_end(input, position, ch)?;
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
                tokens.push(Token {
                    kind: Tok::Literal(literal(input, position, end)?),
                    position,
                });
                continue;
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut end = position;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+') {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: Tok::Literal(literal(input, position, end)?),
                    position,
                });
                continue;
            }
            '~' => {
                chars.next();
                let name = take_name(&mut chars, input);
                if name.is_empty() {
                    return Err(DeclParseError::new(position, "expected a name after '~'"));
                }
                tokens.push(Token {
                    kind: Tok::TypeVar(name),
                    position,
                });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let name = take_name(&mut chars, input);
                tokens.push(Token {
                    kind: Tok::Name(name),
                    position,
                });
                continue;
            }
            other => {
                return Err(DeclParseError::new(
                    position,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        chars.next();
        tokens.push(Token { kind, position });
    }

    tokens.push(Token {
        kind: Tok::Eof,
        position: input.len(),
    });
    Ok(tokens)
}

fn take_name(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, input: &str) -> String {
    let Some(&(start, _)) = chars.peek() else {
        return String::new();
    };
    let mut end = start;
    while let Some(&(i, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            end = i + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    input[start..end].to_owned()
}

/// Byte offset just past the closing quote of the string starting at `start`.
fn string_end(input: &str, start: usize, quote: char) -> Result<usize, DeclParseError> {
    let mut escaped = false;
    for (i, c) in input[start + 1..].char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == quote => return Ok(start + 1 + i + 1),
            _ => {}
        }
    }
    Err(DeclParseError::new(start, "unterminated string"))
}

fn literal(input: &str, start: usize, end: usize) -> Result<Value, DeclParseError> {
    parse_literal(&input[start..end])
        .map_err(|err| DeclParseError::new(start + err.position, err.message))
}

// ============================================================================
// PARSER
// ============================================================================

enum Arg {
    Decl(TypeDecl),
    Literal(Value),
    Ellipsis,
    EmptyTuple,
}

struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    namespace: &'a TypeNamespace,
}

impl Parser<'_> {
    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != Tok::Eof {
            self.index += 1;
        }
        token
    }

    fn eat(&mut self, kind: &Tok) -> bool {
        if &self.current().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> DeclParseError {
        DeclParseError::new(self.current().position, message)
    }

    fn parse_union(&mut self) -> Result<TypeDecl, DeclParseError> {
        let mut alternatives = vec![self.parse_primary()?];
        while self.eat(&Tok::Pipe) {
            alternatives.push(self.parse_primary()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            TypeDecl::union(alternatives)
        })
    }

    fn parse_primary(&mut self) -> Result<TypeDecl, DeclParseError> {
        let token = self.bump();
        let name = match token.kind {
            Tok::Name(name) => name,
            Tok::TypeVar(name) => return Ok(TypeDecl::TypeVar(name)),
            _ => return Err(DeclParseError::new(token.position, "expected a type name")),
        };
        let short = name.rsplit('.').next().unwrap_or(&name).to_owned();

        if self.eat(&Tok::LeftBracket) {
            let args = self.parse_args()?;
            return subscript(&short, args).map_err(|message| DeclParseError::new(token.position, message));
        }

        if let Some(decl) = self.namespace.get(&name).or_else(|| self.namespace.get(&short)) {
            return Ok(decl.clone());
        }
        bare(&short).ok_or_else(|| DeclParseError::new(token.position, format!("unknown type name '{name}'")))
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, DeclParseError> {
        let mut args = Vec::new();
        loop {
            let arg = match &self.current().kind {
                Tok::Ellipsis => {
                    self.bump();
                    Arg::Ellipsis
                }
                Tok::Literal(value) => {
                    let value = value.clone();
                    self.bump();
                    Arg::Literal(value)
                }
                Tok::LeftParen => {
                    self.bump();
                    if !self.eat(&Tok::RightParen) {
                        return Err(self.error("expected ')'"));
                    }
                    Arg::EmptyTuple
                }
                _ => Arg::Decl(self.parse_union()?),
            };
            args.push(arg);

            if self.eat(&Tok::RightBracket) {
                return Ok(args);
            }
            if !self.eat(&Tok::Comma) {
                return Err(self.error("expected ',' or ']'"));
            }
        }
    }
}

fn bare(name: &str) -> Option<TypeDecl> {
    Some(match name {
        "Any" => TypeDecl::Any,
        "None" | "NoneType" => TypeDecl::None,
        "bool" => TypeDecl::Bool,
        "int" => TypeDecl::Int,
        "float" => TypeDecl::Float,
        "str" => TypeDecl::Str,
        "list" | "List" => TypeDecl::list(TypeDecl::Any),
        "set" | "Set" => TypeDecl::set(TypeDecl::Any),
        "Sequence" => TypeDecl::sequence(TypeDecl::Any),
        "tuple" | "Tuple" => TypeDecl::tuple_of(TypeDecl::Any),
        "dict" | "Dict" => TypeDecl::dict(TypeDecl::Any, TypeDecl::Any),
        "Mapping" => TypeDecl::mapping(TypeDecl::Any, TypeDecl::Any),
        _ => return None,
    })
}

fn subscript(name: &str, args: Vec<Arg>) -> Result<TypeDecl, String> {
    match name {
        "list" | "List" => Ok(TypeDecl::list(one_decl(name, args)?)),
        "set" | "Set" => Ok(TypeDecl::set(one_decl(name, args)?)),
        "Sequence" => Ok(TypeDecl::sequence(one_decl(name, args)?)),
        "Optional" => Ok(TypeDecl::optional(one_decl(name, args)?)),
        "dict" | "Dict" | "Mapping" => {
            let mut decls = only_decls(name, args)?;
            if decls.len() != 2 {
                return Err(format!("{name} expects 2 type arguments, got {}", decls.len()));
            }
            let value = decls.remove(1);
            let key = decls.remove(0);
            Ok(if name == "Mapping" {
                TypeDecl::mapping(key, value)
            } else {
                TypeDecl::dict(key, value)
            })
        }
        "Union" => Ok(TypeDecl::union(only_decls(name, args)?)),
        "tuple" | "Tuple" => tuple(args),
        "Annotated" => {
            let mut args = args.into_iter();
            let Some(Arg::Decl(inner)) = args.next() else {
                return Err("Annotated expects a type as its first argument".to_owned());
            };
            let metadata = args
                .map(|arg| match arg {
                    Arg::Literal(value) => Ok(value),
                    _ => Err("Annotated metadata must be literals".to_owned()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if metadata.is_empty() {
                return Err("Annotated expects at least one metadata argument".to_owned());
            }
            Ok(TypeDecl::annotated(inner, metadata))
        }
        other => Err(format!("'{other}' is not subscriptable")),
    }
}

fn only_decls(name: &str, args: Vec<Arg>) -> Result<Vec<TypeDecl>, String> {
    args.into_iter()
        .map(|arg| match arg {
            Arg::Decl(decl) => Ok(decl),
            _ => Err(format!("{name} expects type arguments")),
        })
        .collect()
}

fn one_decl(name: &str, args: Vec<Arg>) -> Result<TypeDecl, String> {
    let mut decls = only_decls(name, args)?;
    if decls.len() == 1 {
        Ok(decls.remove(0))
    } else {
        Err(format!("{name} expects 1 type argument, got {}", decls.len()))
    }
}

fn tuple(args: Vec<Arg>) -> Result<TypeDecl, String> {
    match args.as_slice() {
        [Arg::EmptyTuple] => return Ok(TypeDecl::tuple(Vec::new())),
        [Arg::Decl(_), Arg::Ellipsis] => {
            let Some(Arg::Decl(element)) = args.into_iter().next() else {
                return Err("tuple expects a type before '...'".to_owned());
            };
            return Ok(TypeDecl::tuple_of(element));
        }
        _ => {}
    }
    Ok(TypeDecl::tuple(only_decls("tuple", args)?))
}
