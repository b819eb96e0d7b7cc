use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, one_of},
    combinator::{map, recognize, value},
    multi::many0,
    sequence::{pair, preceded, terminated},
};

use crate::{Error, ReadError, ReadErrorKind};

/// Single-character tokens
const SPECIAL_CHARS: &str = "[]{}()'`~^@";

/// Characters that end a bare token
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || "[]{}()'\"`,;".contains(c)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Whitespace and commas
fn separators(input: &str) -> IResult<&str, &str> {
    take_while(is_separator).parse(input)
}

/// `;` up to (not including) the end of the line
fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), take_till(|c| c == '\n'))).parse(input)
}

fn special(input: &str) -> IResult<&str, &str> {
    alt((tag("~@"), recognize(one_of(SPECIAL_CHARS)))).parse(input)
}

/// A double-quoted string, with or without its closing quote.
///
/// Escapes are skipped as pairs so `\"` never ends the token. Validation is
/// left to the reader, which rejects unterminated strings.
fn string_literal(input: &str) -> IResult<&str, &str> {
    let (mut remaining, _) = char('"').parse(input)?;

    loop {
        let mut chars = remaining.chars();
        match chars.next() {
            Some('"') => {
                remaining = chars.as_str();
                break;
            }
            Some('\\') => match chars.next() {
                Some(_) => remaining = chars.as_str(),
                // A trailing lone backslash is not part of the string
                None => break,
            },
            Some(_) => remaining = chars.as_str(),
            None => break,
        }
    }

    let consumed = input.len() - remaining.len();
    Ok((remaining, &input[..consumed]))
}

fn bare(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !is_delimiter(c)).parse(input)
}

/// One lexeme; comments produce `None`
fn lexeme(input: &str) -> IResult<&str, Option<&str>> {
    alt((
        map(special, Some),
        map(string_literal, Some),
        value(None, comment),
        map(bare, Some),
    ))
    .parse(input)
}

/// Split `input` into tokens.
///
/// The result is fully materialized so the reader can look ahead freely.
pub fn tokenize(input: &str) -> Result<Vec<&str>, Error> {
    match terminated(many0(preceded(separators, lexeme)), separators).parse(input) {
        Ok(("", lexemes)) => Ok(lexemes.into_iter().flatten().collect()),
        Ok((remaining, _)) => Err(unexpected_input(remaining)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(unexpected_input(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(ReadError::unexpected_eof().into()),
    }
}

fn unexpected_input(remaining: &str) -> Error {
    let near: String = remaining.chars().take(10).collect();
    ReadError::new(
        ReadErrorKind::UnexpectedToken,
        format!("unexpected input near '{near}'"),
        Some(near),
    )
    .into()
}
