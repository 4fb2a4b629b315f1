//! Parsers over the token stream.
//!
//! The expression and JSON parsers share the delimited list/document
//! drivers defined here, plus one numeric-conversion policy. Sub-parsers
//! always receive the caller's cursor by mutable reference and leave it
//! positioned after whatever they consumed.

mod expr;
mod json;
mod path;

pub use expr::ExprParser;
pub use json::JsonParser;

use crate::error::ParseError;
use crate::lexer::{Span, TokenCursor, TokenKind};
use crate::processor::{DocProcessor, ListProcessor};
use crate::stored::StoredScalar;

/// How the expression grammar resolves bare identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    /// Identifiers name members of the current document.
    Document,
    /// Identifiers name table columns, optionally `->`-bound to a path.
    Table,
}

/// Parses `open el (',' el)* close`, reporting elements into `prc`.
///
/// With `prc == None` (or when `list_el` declines an element) the tokens
/// are consumed without reporting. An element after a trailing comma is
/// required; `open close` is the empty list.
pub(crate) fn parse_delimited_list<El, F>(
    cursor: &mut TokenCursor<'_>,
    mut prc: Option<&mut (dyn ListProcessor<El> + '_)>,
    open: TokenKind,
    close: TokenKind,
    mut parse_el: F,
) -> Result<(), ParseError>
where
    El: ?Sized,
    F: FnMut(&mut TokenCursor<'_>, Option<&mut El>) -> Result<(), ParseError>,
{
    cursor.expect_kind(open)?;
    if let Some(p) = prc.as_mut() {
        p.list_begin();
    }
    if !cursor.check(close) {
        loop {
            let el = prc.as_mut().and_then(|p| p.list_el());
            parse_el(cursor, el)?;
            if cursor.consume_kind(TokenKind::Comma).is_none() {
                break;
            }
        }
    }
    cursor.expect_kind(close)?;
    if let Some(p) = prc.as_mut() {
        p.list_end();
    }
    Ok(())
}

/// Parses `'{' key ':' el (',' key ':' el)* '}'`, reporting entries
/// into `prc`. Key syntax is supplied by the caller since the JSON and
/// expression grammars accept different key tokens.
pub(crate) fn parse_delimited_doc<El, K, F>(
    cursor: &mut TokenCursor<'_>,
    mut prc: Option<&mut (dyn DocProcessor<El> + '_)>,
    mut parse_key: K,
    mut parse_el: F,
) -> Result<(), ParseError>
where
    El: ?Sized,
    K: FnMut(&mut TokenCursor<'_>) -> Result<String, ParseError>,
    F: FnMut(&mut TokenCursor<'_>, Option<&mut El>) -> Result<(), ParseError>,
{
    cursor.expect_kind(TokenKind::LCurly)?;
    if let Some(p) = prc.as_mut() {
        p.doc_begin();
    }
    if !cursor.check(TokenKind::RCurly) {
        loop {
            let key = parse_key(cursor)?;
            cursor.expect_kind(TokenKind::Colon)?;
            let el = prc.as_mut().and_then(|p| p.key_val(&key));
            parse_el(cursor, el)?;
            if cursor.consume_kind(TokenKind::Comma).is_none() {
                break;
            }
        }
    }
    cursor.expect_kind(TokenKind::RCurly)?;
    if let Some(p) = prc.as_mut() {
        p.doc_end();
    }
    Ok(())
}

/// Converts an integer literal with its sign context.
///
/// The unsigned magnitude is computed first. Positive values above
/// `i64::MAX` become unsigned; negative magnitudes above `2^63` do not
/// fit any 64-bit type; the magnitude `2^63` itself is valid only when
/// negated.
pub(crate) fn int_literal(
    text: &str,
    negative: bool,
    span: Span,
) -> Result<StoredScalar, ParseError> {
    let magnitude: u64 = text
        .parse()
        .map_err(|_| ParseError::syntax("integer literal out of range", span))?;
    signed_magnitude(magnitude, negative, span)
}

/// Same policy for `0x` literals.
pub(crate) fn hex_literal(
    digits: &str,
    negative: bool,
    span: Span,
) -> Result<StoredScalar, ParseError> {
    let magnitude = u64::from_str_radix(digits, 16)
        .map_err(|_| ParseError::syntax("hexadecimal literal out of range", span))?;
    signed_magnitude(magnitude, negative, span)
}

fn signed_magnitude(
    magnitude: u64,
    negative: bool,
    span: Span,
) -> Result<StoredScalar, ParseError> {
    let min_magnitude = i64::MIN.unsigned_abs();
    if negative {
        if magnitude > min_magnitude {
            return Err(ParseError::syntax(
                "integer literal too large for signed type",
                span,
            ));
        }
        if magnitude == min_magnitude {
            return Ok(StoredScalar::Int(i64::MIN));
        }
        // magnitude < 2^63 so the conversion cannot fail
        let value = i64::try_from(magnitude)
            .map_err(|_| ParseError::syntax("integer literal out of range", span))?;
        Ok(StoredScalar::Int(-value))
    } else {
        match i64::try_from(magnitude) {
            Ok(value) => Ok(StoredScalar::Int(value)),
            Err(_) => Ok(StoredScalar::Uint(magnitude)),
        }
    }
}

/// Converts a floating literal with its sign context.
pub(crate) fn float_literal(
    text: &str,
    negative: bool,
    span: Span,
) -> Result<StoredScalar, ParseError> {
    let value: f64 = text
        .parse()
        .map_err(|_| ParseError::syntax("malformed floating-point literal", span))?;
    Ok(StoredScalar::Double(if negative { -value } else { value }))
}
