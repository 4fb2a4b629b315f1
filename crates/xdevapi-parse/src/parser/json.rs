//! JSON grammar over the shared tokenizer.
//!
//! A restricted value grammar: objects, arrays, quoted strings, signed
//! numbers and the lower-case words `null`, `true`, `false`. Column
//! references, operators and document paths do not exist here.

use tracing::debug;

use super::{float_literal, int_literal, parse_delimited_doc, parse_delimited_list};
use crate::error::ParseError;
use crate::lexer::{TokenCursor, TokenKind, Tokenizer};
use crate::processor::JsonProcessor;
use crate::stored::{StoredBuilder, StoredExpr, StoredScalar};

/// Parser for one JSON document string.
#[derive(Debug)]
pub struct JsonParser<'s> {
    tokenizer: Tokenizer<'s>,
}

impl<'s> JsonParser<'s> {
    /// Tokenizes `input`.
    ///
    /// # Errors
    ///
    /// Returns any tokenization failure immediately.
    pub fn new(input: &'s str) -> Result<Self, ParseError> {
        Ok(Self {
            tokenizer: Tokenizer::new(input)?,
        })
    }

    /// Parses the whole input, reporting into `prc`.
    ///
    /// # Errors
    ///
    /// Fails on empty input, on malformed JSON, and when tokens remain
    /// after one complete value.
    pub fn parse(&self, prc: &mut dyn JsonProcessor) -> Result<(), ParseError> {
        self.run(Some(prc))
    }

    /// Parses the whole input into an owned [`StoredExpr`].
    ///
    /// # Errors
    ///
    /// Same failure modes as [`parse`](Self::parse).
    pub fn parse_stored(&self) -> Result<StoredExpr, ParseError> {
        let mut builder = StoredBuilder::new();
        self.run(Some(&mut builder))?;
        builder
            .build()
            .ok_or_else(|| ParseError::empty("JSON document produced no value"))
    }

    fn run(&self, prc: Option<&mut (dyn JsonProcessor + '_)>) -> Result<(), ParseError> {
        debug!(source = %self.tokenizer.source(), "parsing JSON document");
        if self.tokenizer.is_empty() {
            return Err(ParseError::empty("empty JSON document"));
        }
        let mut cursor = self.tokenizer.cursor();
        parse_value(&mut cursor, prc)?;
        if let Some(extra) = cursor.peek() {
            return Err(ParseError::unexpected(extra, "end of JSON document"));
        }
        Ok(())
    }
}

fn parse_value(
    cursor: &mut TokenCursor<'_>,
    prc: Option<&mut (dyn JsonProcessor + '_)>,
) -> Result<(), ParseError> {
    let Some(token) = cursor.peek() else {
        return Err(ParseError::eof("a JSON value"));
    };
    match token.kind {
        TokenKind::LCurly => {
            let doc = match prc {
                Some(p) => p.doc(),
                None => None,
            };
            parse_delimited_doc(cursor, doc, json_key, parse_value)
        }
        TokenKind::LSquare => {
            let list = match prc {
                Some(p) => p.arr(),
                None => None,
            };
            parse_delimited_list(cursor, list, TokenKind::LSquare, TokenKind::RSquare, parse_value)
        }
        TokenKind::SingleQuotedString | TokenKind::DoubleQuotedString => {
            cursor.advance();
            report(prc, &StoredScalar::Str(token.text.clone()));
            Ok(())
        }
        TokenKind::Integer => {
            cursor.advance();
            report(prc, &int_literal(&token.text, false, token.span)?);
            Ok(())
        }
        TokenKind::Number => {
            cursor.advance();
            report(prc, &float_literal(&token.text, false, token.span)?);
            Ok(())
        }
        TokenKind::Plus | TokenKind::Minus => {
            let negative = token.kind == TokenKind::Minus;
            cursor.advance();
            let Some(number) = cursor.peek() else {
                return Err(ParseError::eof("a numeric literal"));
            };
            let scalar = match number.kind {
                TokenKind::Integer => int_literal(&number.text, negative, number.span)?,
                TokenKind::Number => float_literal(&number.text, negative, number.span)?,
                _ => return Err(ParseError::unexpected(number, "a numeric literal")),
            };
            cursor.advance();
            report(prc, &scalar);
            Ok(())
        }
        // null/true/false match by exact text, never case-insensitively
        TokenKind::Word => match token.text.as_str() {
            "null" => {
                cursor.advance();
                report(prc, &StoredScalar::Null);
                Ok(())
            }
            "true" => {
                cursor.advance();
                report(prc, &StoredScalar::Bool(true));
                Ok(())
            }
            "false" => {
                cursor.advance();
                report(prc, &StoredScalar::Bool(false));
                Ok(())
            }
            _ => Err(ParseError::unexpected(token, "a JSON value")),
        },
        _ => Err(ParseError::unexpected(token, "a JSON value")),
    }
}

fn json_key(cursor: &mut TokenCursor<'_>) -> Result<String, ParseError> {
    let Some(token) = cursor.peek() else {
        return Err(ParseError::eof("a quoted key"));
    };
    if token.is_string() {
        cursor.advance();
        Ok(token.text.clone())
    } else {
        Err(ParseError::unexpected(token, "a quoted key"))
    }
}

fn report(prc: Option<&mut (dyn JsonProcessor + '_)>, scalar: &StoredScalar) {
    if let Some(p) = prc {
        if let Some(sp) = p.scalar() {
            scalar.process(sp);
        }
    }
}
