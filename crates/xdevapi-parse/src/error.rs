//! Error type shared by the tokenizer and all parsers.

use thiserror::Error;

use crate::lexer::{Span, Token, TokenKind};

/// Failure while tokenizing or parsing an expression, path or document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Character- or token-level rule violation at a known location.
    #[error("{message} at position {span}")]
    Syntax {
        /// What went wrong.
        message: String,
        /// Where in the input it went wrong.
        span: Span,
    },

    /// The parser met a well-formed token it cannot accept here.
    #[error("unexpected {found} at position {span}, expected {expected}")]
    Unexpected {
        /// Rendering of the offending token.
        found: String,
        /// Location of the offending token.
        span: Span,
        /// What the grammar allowed instead.
        expected: String,
    },

    /// Input ended while the grammar required more tokens.
    #[error("unexpected end of input, expected {expected}")]
    Eof {
        /// What the grammar allowed next.
        expected: String,
    },

    /// Nothing to parse at all.
    #[error("{message}")]
    Empty {
        /// Which entry point was handed the empty input.
        message: String,
    },
}

impl ParseError {
    /// Scan-level or value-level error anchored at `span`.
    pub(crate) fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    /// Grammar error at a concrete token.
    pub(crate) fn unexpected(token: &Token, expected: impl Into<String>) -> Self {
        let found = match token.kind {
            TokenKind::Word
            | TokenKind::QuotedWord
            | TokenKind::SingleQuotedString
            | TokenKind::DoubleQuotedString
            | TokenKind::Integer
            | TokenKind::Number
            | TokenKind::Hex
            | TokenKind::HexBlob => {
                format!("{} '{}'", token.kind.describe(), token.text)
            }
            _ => format!("'{}'", token.text),
        };
        Self::Unexpected {
            found,
            span: token.span,
            expected: expected.into(),
        }
    }

    /// Grammar error past the last token.
    pub(crate) fn eof(expected: impl Into<String>) -> Self {
        Self::Eof {
            expected: expected.into(),
        }
    }

    /// Empty or whitespace-only input handed to a parse entry point.
    pub(crate) fn empty(message: impl Into<String>) -> Self {
        Self::Empty {
            message: message.into(),
        }
    }

    /// The input location the error points at, when it has one.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. } | Self::Unexpected { span, .. } => Some(*span),
            Self::Eof { .. } | Self::Empty { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_position() {
        let err = ParseError::syntax("missing digits in exponent", Span::new(4, 7));
        assert_eq!(
            err.to_string(),
            "missing digits in exponent at position 4..7"
        );
        assert_eq!(err.span(), Some(Span::new(4, 7)));
    }

    #[test]
    fn renders_token_phrase() {
        let word = Token::new(TokenKind::Word, "banana".into(), Span::new(0, 6));
        let err = ParseError::unexpected(&word, "an operator");
        assert_eq!(
            err.to_string(),
            "unexpected identifier 'banana' at position 0..6, expected an operator"
        );

        let comma = Token::new(TokenKind::Comma, ",".into(), Span::new(9, 10));
        let err = ParseError::unexpected(&comma, "']'");
        assert_eq!(
            err.to_string(),
            "unexpected ',' at position 9..10, expected ']'"
        );
    }

    #[test]
    fn eof_has_no_span() {
        let err = ParseError::eof("an expression");
        assert_eq!(err.span(), None);
        assert_eq!(err.to_string(), "unexpected end of input, expected an expression");
    }
}
