//! Reader for the EDN subset used in metadata blocks.
//!
//! Only the first form of the input is read. Tokens are pulled lazily, so
//! the document body following the form is never lexed.

use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Deepest collection nesting accepted in a metadata block
pub const MAX_DEPTH: usize = 128;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Syntax error at byte {offset}: {message}")]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n,]+")]
#[logos(skip r";[^\n]*")]
enum Token {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("#{")]
    HashBrace,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,

    #[regex(r##":[^ \t\r\n,;{}\[\]()"#:][^ \t\r\n,;{}\[\]()"]*"##, |lex| lex.slice()[1..].to_string())]
    Keyword(String),

    #[regex(r#"[a-zA-Z*!_?<>=.][^ \t\r\n,;{}\[\]()"]*"#, |lex| lex.slice().to_string())]
    Symbol(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(&lex.slice()[1..lex.slice().len() - 1]))]
    Str(String),
}

/// A parsed EDN value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Keyword name without the leading colon
    Keyword(String),
    Symbol(String),
    Vector(Vec<Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    /// Entries in source order
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short description of the value's shape, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::Vector(_) => "vector",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Keyword(k) => write!(f, ":{k}"),
            Value::Symbol(s) => f.write_str(s),
            Value::Vector(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            Value::List(items) => {
                f.write_str("(")?;
                join(f, items)?;
                f.write_str(")")
            }
            Value::Set(items) => {
                f.write_str("#{")?;
                join(f, items)?;
                f.write_str("}")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Read the first form of `source`.
///
/// Returns the value and the byte offset just past it.
pub fn read_form(source: &str) -> Result<(Value, usize), SyntaxError> {
    let mut reader = FormReader {
        lexer: Token::lexer(source),
        depth: 0,
    };
    match reader.next_token()? {
        Some((token, span)) => {
            let value = reader.read_value(token, span)?;
            Ok((value, reader.lexer.span().end))
        }
        None => Err(SyntaxError::new(source.len(), "expected a form, found end of input")),
    }
}

struct FormReader<'s> {
    lexer: Lexer<'s, Token>,
    depth: usize,
}

impl FormReader<'_> {
    fn next_token(&mut self) -> Result<Option<(Token, Range<usize>)>, SyntaxError> {
        match self.lexer.next() {
            None => Ok(None),
            Some(Ok(token)) => Ok(Some((token, self.lexer.span()))),
            Some(Err(())) => Err(SyntaxError::new(
                self.lexer.span().start,
                format!("unexpected input {:?}", self.lexer.slice()),
            )),
        }
    }

    fn read_value(&mut self, token: Token, span: Range<usize>) -> Result<Value, SyntaxError> {
        let value = match token {
            Token::Nil => Value::Nil,
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Int(i) => Value::Int(i),
            Token::Float(x) => Value::Float(x),
            Token::Str(s) => Value::Str(s),
            Token::Keyword(k) => Value::Keyword(k),
            Token::Symbol(s) => Value::Symbol(s),
            Token::LBracket => Value::Vector(self.read_seq(Token::RBracket, span.start)?),
            Token::LParen => Value::List(self.read_seq(Token::RParen, span.start)?),
            Token::HashBrace => Value::Set(self.read_seq(Token::RBrace, span.start)?),
            Token::LBrace => {
                let items = self.read_seq(Token::RBrace, span.start)?;
                if items.len() % 2 != 0 {
                    return Err(SyntaxError::new(
                        span.start,
                        "map literal must contain an even number of forms",
                    ));
                }
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut items = items.into_iter();
                while let (Some(k), Some(v)) = (items.next(), items.next()) {
                    entries.push((k, v));
                }
                Value::Map(entries)
            }
            Token::RBrace | Token::RBracket | Token::RParen => {
                return Err(SyntaxError::new(span.start, "unmatched closing delimiter"));
            }
        };
        Ok(value)
    }

    fn read_seq(&mut self, close: Token, open: usize) -> Result<Vec<Value>, SyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(SyntaxError::new(
                open,
                format!("collections nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        self.depth += 1;

        let mut items = Vec::new();
        let result = loop {
            match self.next_token()? {
                None => break Err(SyntaxError::new(open, "unterminated collection")),
                Some((token, _)) if token == close => break Ok(items),
                Some((token, span)) => items.push(self.read_value(token, span)?),
            }
        };

        self.depth -= 1;
        result
    }
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
