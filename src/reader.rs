//! Recursive-descent reader over the token sequence produced by
//! [`crate::tokenizer::tokenize`], with one token of lookahead.

use crate::ast::{NumberType, Value, sym};
use crate::tokenizer::tokenize;
use crate::{Error, ReadError, ReadErrorKind, ReaderConfig};

/// Tokens that close a sequence
const CLOSERS: [&str; 3] = [")", "]", "}"];

/// Tokens that may never stand where an atom is required
const NON_ATOMS: [&str; 12] = [
    "(", ")", "[", "]", "{", "}", "'", "`", "~", "~@", "@", "^",
];

/// Cursor over a materialized token list
struct Reader<'a> {
    tokens: Vec<&'a str>,
    position: usize,
    config: ReaderConfig,
}

impl<'a> Reader<'a> {
    fn new(tokens: Vec<&'a str>, config: ReaderConfig) -> Self {
        Reader {
            tokens,
            position: 0,
            config,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }

    /// Consume the next token, failing at end of input
    fn expect_next(&mut self) -> Result<&'a str, Error> {
        self.advance().ok_or_else(|| ReadError::unexpected_eof().into())
    }

    fn read_form(&mut self, depth: usize) -> Result<Value, Error> {
        if depth >= self.config.max_depth {
            return Err(ReadError::new(
                ReadErrorKind::TooDeeplyNested,
                format!(
                    "expression too deeply nested (max depth: {})",
                    self.config.max_depth
                ),
                None,
            )
            .into());
        }

        match self.peek() {
            None => Err(ReadError::unexpected_eof().into()),
            Some("(") => self.read_sequence("(", ")", Value::List, depth),
            Some("[") => self.read_sequence("[", "]", Value::Vector, depth),
            Some("{") => self.read_hash_map(depth),
            Some("'") => self.read_quote("quote", depth),
            Some("`") => self.read_quote("quasiquote", depth),
            Some("~") => self.read_quote("unquote", depth),
            Some("~@") => self.read_quote("splice-unquote", depth),
            Some("@") => self.read_quote("deref", depth),
            Some("^") => self.read_with_meta(depth),
            Some(token) if CLOSERS.contains(&token) => Err(ReadError::new(
                ReadErrorKind::UnexpectedToken,
                format!("unexpected '{token}'"),
                Some(token.to_owned()),
            )
            .into()),
            Some(_) => self.read_atom(),
        }
    }

    /// Shared routine for lists and vectors
    fn read_sequence(
        &mut self,
        open: &str,
        close: &str,
        constructor: fn(Vec<Value>) -> Value,
        depth: usize,
    ) -> Result<Value, Error> {
        let token = self.expect_next()?;
        if token != open {
            return Err(ReadError::mismatched(open, token).into());
        }

        let mut forms = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ReadError::unexpected_eof().into()),
                Some(token) if token == close => break,
                Some(token) if CLOSERS.contains(&token) => {
                    return Err(ReadError::mismatched(close, token).into());
                }
                Some(_) => forms.push(self.read_form(depth + 1)?),
            }
        }
        self.advance(); // drop the closing delimiter

        Ok(constructor(forms))
    }

    /// `{` alternating atom keys and arbitrary values `}`
    fn read_hash_map(&mut self, depth: usize) -> Result<Value, Error> {
        let token = self.expect_next()?;
        if token != "{" {
            return Err(ReadError::mismatched("{", token).into());
        }

        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ReadError::unexpected_eof().into()),
                Some("}") => break,
                Some(token) if CLOSERS.contains(&token) => {
                    return Err(ReadError::mismatched("}", token).into());
                }
                Some(_) => {}
            }

            let key = self.read_map_key()?;
            match self.peek() {
                None => return Err(ReadError::unexpected_eof().into()),
                Some("}") => {
                    return Err(ReadError::new(
                        ReadErrorKind::OddMapLiteral,
                        format!("hash-map literal has key {key} without a value"),
                        Some("}".to_owned()),
                    )
                    .into());
                }
                Some(_) => {}
            }
            let value = self.read_form(depth + 1)?;
            items.push(key);
            items.push(value);
        }
        self.advance(); // drop the '}'

        Ok(Value::HashMap(items))
    }

    fn read_map_key(&mut self) -> Result<Value, Error> {
        match self.peek() {
            Some(token) if NON_ATOMS.contains(&token) => Err(ReadError::new(
                ReadErrorKind::InvalidMapKey,
                format!("expected an atom as hash-map key but found '{token}'"),
                Some(token.to_owned()),
            )
            .into()),
            _ => self.read_atom(),
        }
    }

    /// Prefix shorthand: `'x` reads as `(quote x)`
    fn read_quote(&mut self, symbol: &str, depth: usize) -> Result<Value, Error> {
        self.expect_next()?;
        let form = self.read_form(depth + 1)?;
        Ok(Value::List(vec![sym(symbol), form]))
    }

    /// `^meta target` reads as `(with-meta target meta)`
    fn read_with_meta(&mut self, depth: usize) -> Result<Value, Error> {
        self.expect_next()?;
        let meta = self.read_form(depth + 1)?;
        let target = self.read_form(depth + 1)?;
        Ok(Value::List(vec![sym("with-meta"), target, meta]))
    }

    fn read_atom(&mut self) -> Result<Value, Error> {
        let token = self.expect_next()?;

        if is_integer_literal(token) {
            return token.parse::<NumberType>().map(Value::Number).map_err(|_| {
                ReadError::new(
                    ReadErrorKind::InvalidNumber,
                    format!("number out of range: {token}"),
                    Some(token.to_owned()),
                )
                .into()
            });
        }

        if token.starts_with('"') {
            return read_string(token);
        }

        Ok(match token {
            "nil" => Value::Nil,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Symbol(token.to_owned()),
        })
    }
}

/// Optional sign followed by at least one digit
fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Check that `token` is a complete string literal: opening quote, escaped
/// pairs or plain characters, closing quote and nothing after it.
fn is_balanced_string(token: &str) -> bool {
    let Some(body) = token.strip_prefix('"') else {
        return false;
    };

    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '"' => return chars.as_str().is_empty(),
            _ => {}
        }
    }
    false
}

/// Decode a string token; `\\`, `\"` and `\n` are escapes, any other
/// backslash pair is kept as written.
fn read_string(token: &str) -> Result<Value, Error> {
    if !is_balanced_string(token) {
        return Err(ReadError::new(
            ReadErrorKind::UnbalancedString,
            "unbalanced '\"', missing at end of string",
            Some(token.to_owned()),
        )
        .into());
    }

    let body = &token[1..token.len() - 1];
    let mut decoded = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        // Balanced strings never end in a lone backslash
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('"') => decoded.push('"'),
            Some('\\') => decoded.push('\\'),
            Some(other) => {
                decoded.push('\\');
                decoded.push(other);
            }
            None => decoded.push('\\'),
        }
    }

    Ok(Value::String(decoded))
}

/// Read the first form in `input`.
///
/// Returns `Ok(None)` when the input contains no tokens. Tokens after the
/// first complete form are ignored.
pub fn read_str(input: &str) -> Result<Option<Value>, Error> {
    read_str_with_config(input, ReaderConfig::default())
}

/// [`read_str`] with explicit reader settings
pub fn read_str_with_config(input: &str, config: ReaderConfig) -> Result<Option<Value>, Error> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut reader = Reader::new(tokens, config);
    reader.read_form(0).map(Some)
}
