//! Character-level scanner producing the token sequence.
//!
//! The whole input is tokenized up front; parsers walk the resulting
//! slice through a [`TokenCursor`](super::TokenCursor). Scanning is
//! longest-match on symbols (`->>` before `->`, `**` before `*`) and
//! keeps reserved words as plain [`TokenKind::Word`] tokens.

use tracing::trace;

use super::{Span, Token, TokenCursor, TokenKind};
use crate::error::ParseError;

/// Eagerly tokenized input.
#[derive(Debug)]
pub struct Tokenizer<'s> {
    source: &'s str,
    tokens: Vec<Token>,
}

impl<'s> Tokenizer<'s> {
    /// Tokenizes `source` in full.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed literals, unterminated
    /// strings or characters outside the token alphabet. Empty input is
    /// not an error here; the parsers reject it at their entry points.
    pub fn new(source: &'s str) -> Result<Self, ParseError> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = scanner.next_token()? {
            tokens.push(token);
        }
        trace!(count = tokens.len(), "tokenized input");
        Ok(Self { source, tokens })
    }

    /// The original input.
    #[must_use]
    pub const fn source(&self) -> &'s str {
        self.source
    }

    /// All scanned tokens in input order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// True when the input held no tokens (empty or whitespace only).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// A fresh cursor over the token sequence.
    #[must_use]
    pub fn cursor(&self) -> TokenCursor<'_> {
        TokenCursor::new(&self.tokens)
    }
}

/// Single-pass scanner state.
struct Scanner<'s> {
    input: &'s str,
    pos: usize,
    start: usize,
}

impl<'s> Scanner<'s> {
    const fn new(input: &'s str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `expected` if it is the next character.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn token_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Token whose text is the raw scanned slice.
    fn slice_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            self.input[self.start..self.pos].to_string(),
            self.token_span(),
        )
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_whitespace();
        self.start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        if c.is_ascii_digit() {
            return self.scan_number().map(Some);
        }
        // A dot starts a number only when digits follow; otherwise it is
        // the path separator symbol.
        if c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
            return self.scan_number().map(Some);
        }
        if matches!(c, 'x' | 'X') && self.peek_at(1) == Some('\'') {
            return self.scan_hex_string().map(Some);
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(Some(self.scan_word()));
        }
        match c {
            '\'' | '"' | '`' => self.scan_quoted(c).map(Some),
            _ => self.scan_symbol(c).map(Some),
        }
    }

    fn scan_word(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        self.slice_token(TokenKind::Word)
    }

    fn scan_number(&mut self) -> Result<Token, ParseError> {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            return self.scan_hex_number();
        }

        let mut kind = TokenKind::Integer;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.eat('.') {
            kind = TokenKind::Number;
            let mut saw_digit = false;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                saw_digit = true;
            }
            if !saw_digit {
                return Err(ParseError::syntax(
                    "missing digits after decimal point",
                    self.token_span(),
                ));
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            kind = TokenKind::Number;
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            let mut saw_digit = false;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                saw_digit = true;
            }
            if !saw_digit {
                return Err(ParseError::syntax(
                    "missing digits in exponent",
                    self.token_span(),
                ));
            }
        }
        Ok(self.slice_token(kind))
    }

    /// `0x...` form; the token text keeps only the digits.
    fn scan_hex_number(&mut self) -> Result<Token, ParseError> {
        self.advance();
        self.advance();
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.advance();
        }
        if self.pos == digits_start {
            return Err(ParseError::syntax(
                "missing digits in hexadecimal literal",
                self.token_span(),
            ));
        }
        Ok(Token::new(
            TokenKind::Hex,
            self.input[digits_start..self.pos].to_string(),
            self.token_span(),
        ))
    }

    /// `x'...'` / `X'...'` form; even digit count required.
    fn scan_hex_string(&mut self) -> Result<Token, ParseError> {
        self.advance();
        self.advance();
        let mut digits = String::new();
        loop {
            let char_start = self.pos;
            match self.advance() {
                None => return Err(self.unterminated()),
                Some('\'') => break,
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                Some(c) => {
                    return Err(ParseError::syntax(
                        format!("invalid character '{c}' in hexadecimal string"),
                        Span::new(char_start, self.pos),
                    ));
                }
            }
        }
        if digits.len() % 2 != 0 {
            return Err(ParseError::syntax(
                "odd number of digits in hexadecimal string",
                self.token_span(),
            ));
        }
        Ok(Token::new(TokenKind::HexBlob, digits, self.token_span()))
    }

    /// Quoted string or back-tick word. The quote escapes by doubling or
    /// by backslash; the MySQL escape set is unescaped; a backslash
    /// before any other character is dropped.
    fn scan_quoted(&mut self, quote: char) -> Result<Token, ParseError> {
        self.advance();
        let mut text = String::new();
        loop {
            let Some(c) = self.advance() else {
                return Err(self.unterminated());
            };
            if c == quote {
                if self.eat(quote) {
                    text.push(quote);
                    continue;
                }
                break;
            }
            if c == '\\' {
                let Some(escaped) = self.advance() else {
                    return Err(self.unterminated());
                };
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    'b' => '\u{8}',
                    other => other,
                });
                continue;
            }
            text.push(c);
        }
        let kind = match quote {
            '`' => TokenKind::QuotedWord,
            '\'' => TokenKind::SingleQuotedString,
            _ => TokenKind::DoubleQuotedString,
        };
        Ok(Token::new(kind, text, self.token_span()))
    }

    fn unterminated(&self) -> ParseError {
        let literal = &self.input[self.start..];
        let mut preview: String = literal.chars().take(8).collect();
        if literal.chars().nth(8).is_some() {
            preview.push_str("...");
        }
        ParseError::syntax(
            format!("unterminated string starting with {preview}"),
            self.token_span(),
        )
    }

    fn scan_symbol(&mut self, c: char) -> Result<Token, ParseError> {
        self.pos += c.len_utf8();
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LCurly,
            '}' => TokenKind::RCurly,
            '[' => TokenKind::LSquare,
            ']' => TokenKind::RSquare,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '?' => TokenKind::Question,
            '~' => TokenKind::Tilde,
            '^' => TokenKind::Caret,
            '@' => TokenKind::At,
            '$' => TokenKind::Dollar,
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::Ne
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('<') {
                    TokenKind::Shl
                } else if self.eat('=') {
                    TokenKind::Le
                } else if self.eat('>') {
                    TokenKind::Ne
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('>') {
                    TokenKind::Shr
                } else if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::BarBar
                } else {
                    TokenKind::Bar
                }
            }
            '*' => {
                if self.eat('*') {
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '-' => {
                if self.eat('>') {
                    if self.eat('>') {
                        TokenKind::TwoHeadArrow
                    } else {
                        TokenKind::Arrow
                    }
                } else {
                    TokenKind::Minus
                }
            }
            _ => {
                return Err(ParseError::syntax(
                    format!("unexpected character '{c}'"),
                    self.token_span(),
                ));
            }
        };
        Ok(self.slice_token(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::new(input)
            .unwrap()
            .tokens()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(input: &str) -> Vec<String> {
        Tokenizer::new(input)
            .unwrap()
            .tokens()
            .iter()
            .map(|t| t.text.clone())
            .collect()
    }

    fn scan_err(input: &str) -> ParseError {
        Tokenizer::new(input).unwrap_err()
    }

    #[test]
    fn scans_words_and_arrows() {
        assert_eq!(
            kinds("name->>'$.first'"),
            vec![
                TokenKind::Word,
                TokenKind::TwoHeadArrow,
                TokenKind::SingleQuotedString,
            ]
        );
        assert_eq!(texts("doc->'$.a'"), vec!["doc", "->", "$.a"]);
    }

    #[test]
    fn longest_match_wins() {
        assert_eq!(
            kinds("< <= << <> > >= >>"),
            vec![
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Shl,
                TokenKind::Ne,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Shr,
            ]
        );
        assert_eq!(
            kinds("* ** & && | || = == ! != - -> ->>"),
            vec![
                TokenKind::Star,
                TokenKind::StarStar,
                TokenKind::Amp,
                TokenKind::AmpAmp,
                TokenKind::Bar,
                TokenKind::BarBar,
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::Bang,
                TokenKind::Ne,
                TokenKind::Minus,
                TokenKind::Arrow,
                TokenKind::TwoHeadArrow,
            ]
        );
    }

    #[test]
    fn adjacent_symbols_split_greedily() {
        assert_eq!(
            kinds("&&&"),
            vec![TokenKind::AmpAmp, TokenKind::Amp]
        );
        assert_eq!(
            kinds("***"),
            vec![TokenKind::StarStar, TokenKind::Star]
        );
    }

    #[test]
    fn dot_is_a_symbol_unless_digits_follow() {
        assert_eq!(
            kinds("a.b"),
            vec![TokenKind::Word, TokenKind::Dot, TokenKind::Word]
        );
        assert_eq!(kinds(".5"), vec![TokenKind::Number]);
        assert_eq!(texts(".5"), vec![".5"]);
    }

    #[test]
    fn scans_numbers() {
        assert_eq!(kinds("10"), vec![TokenKind::Integer]);
        assert_eq!(kinds("3.14"), vec![TokenKind::Number]);
        assert_eq!(kinds("1e-5"), vec![TokenKind::Number]);
        assert_eq!(kinds("2E+3"), vec![TokenKind::Number]);
        assert_eq!(texts("6.626e-34"), vec!["6.626e-34"]);
        // Out-of-range magnitudes stay textual; conversion happens at
        // parse time where the sign is known.
        assert_eq!(texts("9223372036854775808"), vec!["9223372036854775808"]);
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(scan_err("5.")
            .to_string()
            .contains("missing digits after decimal point"));
        assert!(scan_err("12e")
            .to_string()
            .contains("missing digits in exponent"));
        assert!(scan_err("1e+")
            .to_string()
            .contains("missing digits in exponent"));
    }

    #[test]
    fn scans_hex_forms() {
        assert_eq!(kinds("0x1f"), vec![TokenKind::Hex]);
        assert_eq!(texts("0x1f"), vec!["1f"]);
        assert_eq!(kinds("x'CAFE'"), vec![TokenKind::HexBlob]);
        assert_eq!(texts("X'cafe'"), vec!["cafe"]);
        assert!(scan_err("0x").to_string().contains("missing digits"));
        assert!(scan_err("x'abc'").to_string().contains("odd number"));
        assert!(scan_err("x'zz'")
            .to_string()
            .contains("invalid character 'z'"));
    }

    #[test]
    fn unescapes_strings() {
        assert_eq!(texts("'it''s'"), vec!["it's"]);
        assert_eq!(texts(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(texts(r"'line\nbreak'"), vec!["line\nbreak"]);
        assert_eq!(texts(r"'tab\there'"), vec!["tab\there"]);
        assert_eq!(texts(r"'\q'"), vec!["q"]);
        assert_eq!(texts(r"'back\\slash'"), vec!["back\\slash"]);
        assert_eq!(kinds("\"x\""), vec![TokenKind::DoubleQuotedString]);
    }

    #[test]
    fn unescapes_quoted_words() {
        let tokens = Tokenizer::new("`odd``name`").unwrap().tokens().to_vec();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::QuotedWord);
        assert_eq!(tokens[0].text, "odd`name");
    }

    #[test]
    fn unterminated_string_shows_prefix() {
        let msg = scan_err("'abcdefghij").to_string();
        assert!(msg.contains("unterminated string starting with 'abcdefg..."), "{msg}");
        let msg = scan_err("'ab").to_string();
        assert!(msg.contains("unterminated string starting with 'ab"), "{msg}");
        assert!(!msg.contains("..."));
    }

    #[test]
    fn keywords_stay_words() {
        assert_eq!(
            kinds("a AND not b"),
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Word,
            ]
        );
    }

    #[test]
    fn placeholders_and_variables() {
        assert_eq!(
            kinds(":name ? @var $"),
            vec![
                TokenKind::Colon,
                TokenKind::Word,
                TokenKind::Question,
                TokenKind::At,
                TokenKind::Word,
                TokenKind::Dollar,
            ]
        );
    }

    #[test]
    fn whitespace_only_input_is_empty() {
        let tokenizer = Tokenizer::new("   \t\n  ").unwrap();
        assert!(tokenizer.is_empty());
        assert!(Tokenizer::new("").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_characters() {
        assert!(scan_err("#")
            .to_string()
            .contains("unexpected character '#'"));
    }

    #[test]
    fn spans_track_byte_offsets() {
        let tokenizer = Tokenizer::new("ab  <=").unwrap();
        let tokens = tokenizer.tokens();
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(4, 6));
        assert_eq!(tokens[1].span.text(tokenizer.source()), "<=");
    }
}
