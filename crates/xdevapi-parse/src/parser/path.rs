//! Document-path sub-grammar: `$.member`, `.*`, `[3]`, `[*]`, `**`.

use std::str::FromStr;

use crate::error::ParseError;
use crate::lexer::{Span, TokenCursor, TokenKind, Tokenizer};
use crate::refs::{DocPath, PathElement};

/// Parses zero or more path items into `path` and checks the final
/// shape. Continues a path that may already hold seeded members.
///
/// Stops at the first token that cannot start a path item; a non-empty
/// path ending in `**` is rejected.
pub(crate) fn parse_path_items(
    cursor: &mut TokenCursor<'_>,
    path: &mut DocPath,
) -> Result<(), ParseError> {
    let mut last_any_path = None;
    loop {
        if cursor.consume_kind(TokenKind::Dot).is_some() {
            parse_member(cursor, path)?;
        } else if cursor.consume_kind(TokenKind::LSquare).is_some() {
            parse_index(cursor, path)?;
        } else if let Some(token) = cursor.consume_kind(TokenKind::StarStar) {
            last_any_path = Some(token.span);
            path.push(PathElement::AnyPath);
        } else {
            break;
        }
    }
    check_path_end(path, last_any_path)
}

/// Leading bare member permitted once, with no `.`/`[` prefix.
pub(crate) fn parse_leading_member(
    cursor: &mut TokenCursor<'_>,
    path: &mut DocPath,
) -> Result<(), ParseError> {
    let token = cursor.expect_word()?;
    path.push(PathElement::Member(token.text.clone()));
    Ok(())
}

fn parse_member(cursor: &mut TokenCursor<'_>, path: &mut DocPath) -> Result<(), ParseError> {
    let Some(token) = cursor.peek() else {
        return Err(ParseError::eof("a member name or '*'"));
    };
    match token.kind {
        TokenKind::Star => {
            cursor.advance();
            path.push(PathElement::AnyMember);
        }
        TokenKind::Word
        | TokenKind::QuotedWord
        | TokenKind::SingleQuotedString
        | TokenKind::DoubleQuotedString => {
            cursor.advance();
            path.push(PathElement::Member(token.text.clone()));
        }
        _ => return Err(ParseError::unexpected(token, "a member name or '*'")),
    }
    Ok(())
}

fn parse_index(cursor: &mut TokenCursor<'_>, path: &mut DocPath) -> Result<(), ParseError> {
    if cursor.consume_kind(TokenKind::Star).is_some() {
        path.push(PathElement::AnyIndex);
    } else {
        let token = cursor
            .consume_kind(TokenKind::Integer)
            .ok_or_else(|| cursor.unexpected("an array index or '*'"))?;
        let idx: u32 = token
            .text
            .parse()
            .map_err(|_| ParseError::syntax("array index out of range", token.span))?;
        path.push(PathElement::Index(idx));
    }
    cursor.expect_kind(TokenKind::RSquare)?;
    Ok(())
}

fn check_path_end(path: &DocPath, last_any_path: Option<Span>) -> Result<(), ParseError> {
    if matches!(path.elements.last(), Some(PathElement::AnyPath)) {
        return Err(ParseError::syntax(
            "document path may not end in '**'",
            last_any_path.unwrap_or_default(),
        ));
    }
    Ok(())
}

/// Parses a standalone path string, with or without the `$` root:
/// `$.a.b[0]`, `a.b[0]` and `address.*` are all accepted.
impl FromStr for DocPath {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokenizer = Tokenizer::new(s)?;
        if tokenizer.is_empty() {
            return Err(ParseError::empty("empty document path"));
        }
        let mut cursor = tokenizer.cursor();
        let mut path = Self::new();
        if cursor.consume_kind(TokenKind::Dollar).is_none() {
            parse_leading_member(&mut cursor, &mut path)?;
        }
        parse_path_items(&mut cursor, &mut path)?;
        if let Some(token) = cursor.peek() {
            return Err(ParseError::unexpected(token, "end of document path"));
        }
        Ok(path)
    }
}
