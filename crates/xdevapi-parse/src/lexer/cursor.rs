//! Lookahead cursor over a scanned token sequence.

use super::{Keyword, Token, TokenKind};
use crate::error::ParseError;

/// Shared read position over the tokens of one input.
///
/// Sub-parsers receive `&mut TokenCursor` so that a list parser and the
/// element parsers it delegates to advance the same position. `pos`
/// never exceeds the token count.
#[derive(Debug)]
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> TokenCursor<'t> {
    /// Cursor at the start of `tokens`.
    #[must_use]
    pub const fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The next unconsumed token, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    /// The token `n` places past the next one (`peek_at(0)` == `peek`).
    #[must_use]
    pub fn peek_at(&self, n: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + n)
    }

    /// Consumes and returns the next token.
    pub fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// True when the next token has the given kind.
    #[must_use]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    /// True when the next token spells the given keyword.
    #[must_use]
    pub fn check_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(kw))
    }

    /// Consumes the next token if it has the given kind.
    pub fn consume_kind(&mut self, kind: TokenKind) -> Option<&'t Token> {
        if self.check(kind) {
            self.advance()
        } else {
            None
        }
    }

    /// Consumes the next token if it spells the given keyword.
    pub fn consume_keyword(&mut self, kw: Keyword) -> Option<&'t Token> {
        if self.check_keyword(kw) {
            self.advance()
        } else {
            None
        }
    }

    /// Consumes a token of the given kind or fails.
    ///
    /// # Errors
    ///
    /// [`ParseError::Unexpected`] or [`ParseError::Eof`] naming the kind.
    pub fn expect_kind(&mut self, kind: TokenKind) -> Result<&'t Token, ParseError> {
        self.consume_kind(kind)
            .ok_or_else(|| self.unexpected(kind.describe()))
    }

    /// Consumes the given keyword or fails.
    ///
    /// # Errors
    ///
    /// [`ParseError::Unexpected`] or [`ParseError::Eof`] naming the word.
    pub fn expect_keyword(&mut self, kw: Keyword) -> Result<&'t Token, ParseError> {
        self.consume_keyword(kw)
            .ok_or_else(|| self.unexpected(kw.as_str()))
    }

    /// Consumes a bare or quoted identifier or fails.
    ///
    /// # Errors
    ///
    /// [`ParseError::Unexpected`] or [`ParseError::Eof`].
    pub fn expect_word(&mut self) -> Result<&'t Token, ParseError> {
        if self.peek().is_some_and(Token::is_word) {
            self.advance()
                .ok_or_else(|| ParseError::eof("an identifier"))
        } else {
            Err(self.unexpected("an identifier"))
        }
    }

    /// True once every token has been consumed.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Index of the next unconsumed token.
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Error for the current position: unexpected-token when a token
    /// remains, end-of-input otherwise.
    #[must_use]
    pub fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::unexpected(token, expected),
            None => ParseError::eof(expected),
        }
    }
}
