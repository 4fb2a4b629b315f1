//! Expression grammar: recursive descent with a precedence ladder.
//!
//! Levels low to high: `or`, `and`, the IS/IN/LIKE/BETWEEN/REGEXP
//! phrase level, comparison, bitwise, shift, additive, multiplicative,
//! atomic. Binary levels are left-associative.
//!
//! Infix reporting discipline: the processor must hear `op(name)` before
//! either operand, but the operator token shows up only after the left
//! operand. Each binary level therefore parses its left operand into a
//! [`StoredExpr`] buffer, folds further same-level applications into
//! that buffer, and replays the final value into the live processor.
//! Constructs whose operator is known up front (unary operators, calls,
//! CAST, container literals) stream their operands directly.

use tracing::debug;

use super::{
    float_literal, hex_literal, int_literal, parse_delimited_doc, parse_delimited_list, path,
    ParserMode,
};
use crate::error::ParseError;
use crate::lexer::{Keyword, Token, TokenCursor, TokenKind, Tokenizer};
use crate::processor::ExprProcessor;
use crate::refs::{ColumnRef, DocPath, FunctionRef, PathElement};
use crate::stored::{StoredBuilder, StoredExpr, StoredScalar};

/// Parser for one expression string.
///
/// Tokenizes eagerly at construction; [`parse`](Self::parse) and
/// [`parse_stored`](Self::parse_stored) may then be called any number of
/// times, each walking the token sequence from the start.
#[derive(Debug)]
pub struct ExprParser<'s> {
    tokenizer: Tokenizer<'s>,
    mode: ParserMode,
}

impl<'s> ExprParser<'s> {
    /// Tokenizes `input` for the given identifier-resolution mode.
    ///
    /// # Errors
    ///
    /// Returns any tokenization failure immediately.
    pub fn new(input: &'s str, mode: ParserMode) -> Result<Self, ParseError> {
        Ok(Self {
            tokenizer: Tokenizer::new(input)?,
            mode,
        })
    }

    /// The mode fixed at construction.
    #[must_use]
    pub const fn mode(&self) -> ParserMode {
        self.mode
    }

    /// Parses the whole input, reporting into `prc`.
    ///
    /// # Errors
    ///
    /// Fails on empty input, on any grammar violation, and when tokens
    /// remain after one complete expression.
    pub fn parse(&self, prc: &mut dyn ExprProcessor) -> Result<(), ParseError> {
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
            .ok_or_else(|| ParseError::empty("expression produced no value"))
    }

    fn run(&self, prc: Option<&mut (dyn ExprProcessor + '_)>) -> Result<(), ParseError> {
        debug!(mode = ?self.mode, source = %self.tokenizer.source(), "parsing expression");
        if self.tokenizer.is_empty() {
            return Err(ParseError::empty("empty expression"));
        }
        let mut cursor = self.tokenizer.cursor();
        let mut grammar = ExprGrammar {
            mode: self.mode,
            positional: 0,
        };
        grammar.parse_expr(&mut cursor, prc)?;
        if let Some(extra) = cursor.peek() {
            return Err(ParseError::unexpected(extra, "end of expression"));
        }
        Ok(())
    }
}

/// Grammar state for a single parse pass.
struct ExprGrammar {
    mode: ParserMode,
    /// Running 1-based position handed out to `?` placeholders.
    positional: u16,
}

impl ExprGrammar {
    fn parse_expr(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_or(cursor, prc)
    }

    fn parse_or(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_left_assoc(cursor, prc, Self::parse_and, or_op)
    }

    fn parse_and(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_left_assoc(cursor, prc, Self::parse_ilri, and_op)
    }

    fn parse_comp(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_left_assoc(cursor, prc, Self::parse_bit, comp_op)
    }

    fn parse_bit(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_left_assoc(cursor, prc, Self::parse_shift, bit_op)
    }

    fn parse_shift(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_left_assoc(cursor, prc, Self::parse_add, shift_op)
    }

    fn parse_add(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_left_assoc(cursor, prc, Self::parse_mul, add_op)
    }

    fn parse_mul(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        self.parse_left_assoc(cursor, prc, Self::parse_atomic, mul_op)
    }

    /// One left-associative binary level: capture the left operand, fold
    /// every same-level application, replay the result.
    fn parse_left_assoc(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
        next: fn(
            &mut Self,
            &mut TokenCursor<'_>,
            Option<&mut (dyn ExprProcessor + '_)>,
        ) -> Result<(), ParseError>,
        op_name: fn(&Token) -> Option<&'static str>,
    ) -> Result<(), ParseError> {
        if cursor.check(TokenKind::LCurly) || cursor.check(TokenKind::LSquare) {
            return self.parse_container(cursor, prc);
        }
        let mut lhs = self.capture(cursor, next)?;
        while let Some(name) = cursor.peek().and_then(op_name) {
            cursor.advance();
            let rhs = self.capture(cursor, next)?;
            lhs = StoredExpr::Op(name.to_string(), vec![lhs, rhs]);
        }
        if let Some(p) = prc {
            lhs.process(p);
        }
        Ok(())
    }

    /// Parses one sub-expression at `level` into a buffer.
    fn capture(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        level: fn(
            &mut Self,
            &mut TokenCursor<'_>,
            Option<&mut (dyn ExprProcessor + '_)>,
        ) -> Result<(), ParseError>,
    ) -> Result<StoredExpr, ParseError> {
        let mut builder = StoredBuilder::new();
        level(self, cursor, Some(&mut builder))?;
        builder
            .build()
            .ok_or_else(|| cursor.unexpected("an expression"))
    }

    /// IS / IN / LIKE / BETWEEN / REGEXP phrase level. At most one
    /// phrase applies; the result is never the left operand of another.
    fn parse_ilri(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        if cursor.check(TokenKind::LCurly) || cursor.check(TokenKind::LSquare) {
            return self.parse_container(cursor, prc);
        }
        let lhs = self.capture(cursor, Self::parse_comp)?;

        let mut negated = false;
        if let Some(not_token) = cursor.peek().filter(|t| t.is_keyword(Keyword::Not)) {
            match cursor.peek_at(1).and_then(Token::keyword) {
                Some(Keyword::Is) => {
                    return Err(ParseError::syntax(
                        "unexpected NOT before IS, use IS NOT",
                        not_token.span,
                    ));
                }
                Some(Keyword::In | Keyword::Like | Keyword::Between | Keyword::Regexp) => {
                    cursor.advance();
                    negated = true;
                }
                _ => {
                    cursor.advance();
                    return Err(cursor.unexpected("IN, LIKE, BETWEEN or REGEXP"));
                }
            }
        }

        let phrase = match cursor.peek().and_then(Token::keyword) {
            Some(Keyword::Is) => {
                cursor.advance();
                let name = if cursor.consume_keyword(Keyword::Not).is_some() {
                    "is_not"
                } else {
                    "is"
                };
                let rhs = self.capture(cursor, Self::parse_comp)?;
                StoredExpr::Op(name.to_string(), vec![lhs, rhs])
            }
            Some(Keyword::In) => {
                cursor.advance();
                self.parse_in_rest(cursor, lhs)?
            }
            Some(Keyword::Like) => {
                cursor.advance();
                let pattern = self.capture(cursor, Self::parse_comp)?;
                let mut args = vec![lhs, pattern];
                if cursor.consume_keyword(Keyword::Escape).is_some() {
                    args.push(self.capture(cursor, Self::parse_comp)?);
                }
                StoredExpr::Op("like".to_string(), args)
            }
            Some(Keyword::Between) => {
                cursor.advance();
                let low = self.capture(cursor, Self::parse_comp)?;
                cursor.expect_keyword(Keyword::And)?;
                let high = self.capture(cursor, Self::parse_comp)?;
                StoredExpr::Op("between".to_string(), vec![lhs, low, high])
            }
            Some(Keyword::Regexp) => {
                cursor.advance();
                let rhs = self.capture(cursor, Self::parse_comp)?;
                StoredExpr::Op("regexp".to_string(), vec![lhs, rhs])
            }
            _ => {
                if let Some(p) = prc {
                    lhs.process(p);
                }
                return Ok(());
            }
        };

        let result = if negated {
            StoredExpr::Op("not".to_string(), vec![phrase])
        } else {
            phrase
        };
        if let Some(p) = prc {
            result.process(p);
        }
        Ok(())
    }

    /// Rest of `lhs IN ...`: a parenthesized membership list, or a bare
    /// expression meaning containment.
    fn parse_in_rest(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        lhs: StoredExpr,
    ) -> Result<StoredExpr, ParseError> {
        if cursor.consume_kind(TokenKind::LParen).is_some() {
            let mut args = vec![lhs];
            loop {
                args.push(self.capture_in_element(cursor)?);
                if cursor.consume_kind(TokenKind::Comma).is_none() {
                    break;
                }
            }
            cursor.expect_kind(TokenKind::RParen)?;
            Ok(StoredExpr::Op("in".to_string(), args))
        } else {
            let rhs = self.capture(cursor, Self::parse_comp)?;
            Ok(StoredExpr::Op("cont_in".to_string(), vec![lhs, rhs]))
        }
    }

    /// One membership-list element. A direct string literal is carried
    /// as an opaque byte blob rather than a string scalar; anything else
    /// parses as a full expression.
    fn capture_in_element(
        &mut self,
        cursor: &mut TokenCursor<'_>,
    ) -> Result<StoredExpr, ParseError> {
        if let Some(token) = cursor.peek() {
            let direct = token.is_string()
                && matches!(
                    cursor.peek_at(1).map(|t| t.kind),
                    Some(TokenKind::Comma | TokenKind::RParen)
                );
            if direct {
                cursor.advance();
                return Ok(StoredExpr::Scalar(StoredScalar::Octets(
                    token.text.clone().into_bytes(),
                )));
            }
        }
        self.capture(cursor, Self::parse_or)
    }

    /// Atomic grammar: literals, unary operators, CAST, parentheses,
    /// placeholders, variables, identifier-led references and calls.
    fn parse_atomic(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        let Some(token) = cursor.peek() else {
            return Err(ParseError::eof("an expression"));
        };
        match token.kind {
            TokenKind::LCurly => self.parse_doc_literal(cursor, prc),
            TokenKind::LSquare => self.parse_arr_literal(cursor, prc),
            TokenKind::LParen => {
                cursor.advance();
                self.parse_expr(cursor, prc)?;
                cursor.expect_kind(TokenKind::RParen)?;
                Ok(())
            }
            TokenKind::Bang => {
                cursor.advance();
                self.parse_unary(cursor, prc, "!")
            }
            TokenKind::Tilde => {
                cursor.advance();
                self.parse_unary(cursor, prc, "~")
            }
            TokenKind::Plus | TokenKind::Minus => {
                let negative = token.kind == TokenKind::Minus;
                cursor.advance();
                self.parse_signed(cursor, prc, negative)
            }
            TokenKind::SingleQuotedString | TokenKind::DoubleQuotedString => {
                cursor.advance();
                report_scalar(prc, &StoredScalar::Str(token.text.clone()));
                Ok(())
            }
            TokenKind::Integer => {
                cursor.advance();
                let scalar = int_literal(&token.text, false, token.span)?;
                report_scalar(prc, &scalar);
                Ok(())
            }
            TokenKind::Number => {
                cursor.advance();
                let scalar = float_literal(&token.text, false, token.span)?;
                report_scalar(prc, &scalar);
                Ok(())
            }
            TokenKind::Hex => {
                cursor.advance();
                let scalar = hex_literal(&token.text, false, token.span)?;
                report_scalar(prc, &scalar);
                Ok(())
            }
            TokenKind::HexBlob => {
                cursor.advance();
                report_scalar(prc, &StoredScalar::Octets(hex_bytes(&token.text)));
                Ok(())
            }
            TokenKind::Colon => {
                cursor.advance();
                let name = cursor.expect_word()?;
                if let Some(p) = prc {
                    p.named_param(&name.text);
                }
                Ok(())
            }
            TokenKind::Question => {
                cursor.advance();
                self.positional += 1;
                if let Some(p) = prc {
                    p.pos_param(self.positional);
                }
                Ok(())
            }
            TokenKind::At => {
                cursor.advance();
                let name = cursor.expect_word()?;
                if let Some(p) = prc {
                    p.variable(&name.text);
                }
                Ok(())
            }
            TokenKind::Dollar => {
                cursor.advance();
                if self.mode == ParserMode::Table {
                    return Err(ParseError::syntax(
                        "a document path requires a column reference in table mode",
                        token.span,
                    ));
                }
                let mut doc_path = DocPath::new();
                path::parse_path_items(cursor, &mut doc_path)?;
                if let Some(p) = prc {
                    p.path_ref(&doc_path);
                }
                Ok(())
            }
            TokenKind::Star => {
                cursor.advance();
                if let Some(p) = prc {
                    if let Some(list) = p.op("*") {
                        list.list_begin();
                        list.list_end();
                    }
                }
                Ok(())
            }
            TokenKind::Word | TokenKind::QuotedWord => {
                match token.keyword() {
                    Some(Keyword::True) => {
                        cursor.advance();
                        report_scalar(prc, &StoredScalar::Bool(true));
                        return Ok(());
                    }
                    Some(Keyword::False) => {
                        cursor.advance();
                        report_scalar(prc, &StoredScalar::Bool(false));
                        return Ok(());
                    }
                    Some(Keyword::Null) => {
                        cursor.advance();
                        report_scalar(prc, &StoredScalar::Null);
                        return Ok(());
                    }
                    Some(Keyword::Not) => {
                        cursor.advance();
                        return self.parse_unary(cursor, prc, "not");
                    }
                    Some(Keyword::Cast) => {
                        cursor.advance();
                        return self.parse_cast(cursor, prc);
                    }
                    _ => {}
                }
                self.parse_identifier_led(cursor, prc)
            }
            _ => Err(ParseError::unexpected(token, "an expression")),
        }
    }

    /// `+`/`-` just consumed: fold the sign into a directly following
    /// numeric literal, otherwise apply a unary operator.
    fn parse_signed(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
        negative: bool,
    ) -> Result<(), ParseError> {
        if let Some(number) = cursor.peek() {
            let scalar = match number.kind {
                TokenKind::Integer => Some(int_literal(&number.text, negative, number.span)?),
                TokenKind::Number => Some(float_literal(&number.text, negative, number.span)?),
                TokenKind::Hex => Some(hex_literal(&number.text, negative, number.span)?),
                _ => None,
            };
            if let Some(scalar) = scalar {
                cursor.advance();
                report_scalar(prc, &scalar);
                return Ok(());
            }
        }
        self.parse_unary(cursor, prc, if negative { "-" } else { "+" })
    }

    /// Prefix operator with its name already known: stream the operand.
    fn parse_unary(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
        name: &str,
    ) -> Result<(), ParseError> {
        let list = match prc {
            Some(p) => p.op(name),
            None => None,
        };
        if let Some(list) = list {
            list.list_begin();
            let el = list.list_el();
            self.parse_atomic(cursor, el)?;
            list.list_end();
        } else {
            self.parse_atomic(cursor, None)?;
        }
        Ok(())
    }

    /// `CAST '(' expr AS type ')'`: argument 1 is the expression,
    /// argument 2 the textual type descriptor as raw bytes.
    fn parse_cast(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        cursor.expect_kind(TokenKind::LParen)?;
        let list = match prc {
            Some(p) => p.op("cast"),
            None => None,
        };
        if let Some(list) = list {
            list.list_begin();
            let el = list.list_el();
            self.parse_expr(cursor, el)?;
            cursor.expect_keyword(Keyword::As)?;
            let descriptor = parse_cast_type(cursor)?;
            if let Some(sp) = list.list_el().and_then(|e| e.scalar()) {
                sp.octets(descriptor.as_bytes());
            }
            list.list_end();
        } else {
            self.parse_expr(cursor, None)?;
            cursor.expect_keyword(Keyword::As)?;
            parse_cast_type(cursor)?;
        }
        cursor.expect_kind(TokenKind::RParen)?;
        Ok(())
    }

    /// Leading identifier chain `ID ('.' ID){0,2}`, reinterpreted by
    /// trailing context and parser mode.
    fn parse_identifier_led(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        let first = cursor.expect_word()?;
        let mut components = vec![first.text.clone()];
        while components.len() < 3
            && cursor.check(TokenKind::Dot)
            && cursor.peek_at(1).is_some_and(Token::is_word)
        {
            cursor.advance();
            let word = cursor.expect_word()?;
            components.push(word.text.clone());
        }

        if cursor.check(TokenKind::LParen) {
            let func = function_ref(components, first)?;
            return self.parse_call(cursor, prc, &func);
        }
        match self.mode {
            ParserMode::Table => self.finish_column_ref(cursor, prc, components),
            ParserMode::Document => self.finish_doc_path(cursor, prc, components),
        }
    }

    /// Function call with the name already reported: stream arguments.
    fn parse_call(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
        func: &FunctionRef,
    ) -> Result<(), ParseError> {
        let list = match prc {
            Some(p) => p.call(func),
            None => None,
        };
        parse_delimited_list(cursor, list, TokenKind::LParen, TokenKind::RParen, |c, el| {
            self.parse_expr(c, el)
        })
    }

    /// Table mode: the identifier chain names `[schema.[table.]]column`,
    /// optionally `->`-bound to a document path.
    fn finish_column_ref(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
        mut components: Vec<String>,
    ) -> Result<(), ParseError> {
        let Some(name) = components.pop() else {
            return Err(ParseError::eof("a column name"));
        };
        let col = match components.len() {
            0 => ColumnRef::new(name),
            1 => ColumnRef::with_table(components.remove(0), name),
            _ => {
                let schema = components.remove(0);
                let table = components.remove(0);
                ColumnRef::with_schema(schema, table, name)
            }
        };
        let doc_path = parse_arrow_path(cursor)?;
        if let Some(p) = prc {
            p.column_ref(&col, doc_path.as_ref());
        }
        Ok(())
    }

    /// Document mode: the identifier chain seeds the leading members of
    /// a document path, continued by regular path items.
    fn finish_doc_path(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
        components: Vec<String>,
    ) -> Result<(), ParseError> {
        let mut doc_path = DocPath::new();
        for component in components {
            doc_path.push(PathElement::Member(component));
        }
        path::parse_path_items(cursor, &mut doc_path)?;
        if let Some(p) = prc {
            p.path_ref(&doc_path);
        }
        Ok(())
    }

    fn parse_container(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        if cursor.check(TokenKind::LCurly) {
            self.parse_doc_literal(cursor, prc)
        } else {
            self.parse_arr_literal(cursor, prc)
        }
    }

    fn parse_arr_literal(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        let list = match prc {
            Some(p) => p.arr(),
            None => None,
        };
        parse_delimited_list(
            cursor,
            list,
            TokenKind::LSquare,
            TokenKind::RSquare,
            |c, el| self.parse_expr(c, el),
        )
    }

    fn parse_doc_literal(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        prc: Option<&mut (dyn ExprProcessor + '_)>,
    ) -> Result<(), ParseError> {
        let doc = match prc {
            Some(p) => p.doc(),
            None => None,
        };
        parse_delimited_doc(cursor, doc, doc_key, |c, el| self.parse_expr(c, el))
    }
}

/// Streams one scalar into the processor, if it listens.
fn report_scalar(prc: Option<&mut (dyn ExprProcessor + '_)>, scalar: &StoredScalar) {
    if let Some(p) = prc {
        if let Some(sp) = p.scalar() {
            scalar.process(sp);
        }
    }
}

/// Optional `->`/`->>` document path after a column reference. A quoted
/// path re-tokenizes the string content and must consume it fully.
fn parse_arrow_path(cursor: &mut TokenCursor<'_>) -> Result<Option<DocPath>, ParseError> {
    if cursor.consume_kind(TokenKind::Arrow).is_none()
        && cursor.consume_kind(TokenKind::TwoHeadArrow).is_none()
    {
        return Ok(None);
    }
    let mut doc_path = DocPath::new();
    if let Some(quoted) = cursor.peek().filter(|t| t.is_string()) {
        cursor.advance();
        let inner = Tokenizer::new(&quoted.text)?;
        let mut inner_cursor = inner.cursor();
        inner_cursor.expect_kind(TokenKind::Dollar)?;
        path::parse_path_items(&mut inner_cursor, &mut doc_path)?;
        if let Some(extra) = inner_cursor.peek() {
            return Err(ParseError::unexpected(extra, "end of document path"));
        }
    } else {
        cursor.expect_kind(TokenKind::Dollar)?;
        path::parse_path_items(cursor, &mut doc_path)?;
    }
    Ok(Some(doc_path))
}

/// Document-literal key: a word or a quoted string.
fn doc_key(cursor: &mut TokenCursor<'_>) -> Result<String, ParseError> {
    let Some(token) = cursor.peek() else {
        return Err(ParseError::eof("a document key"));
    };
    if token.is_word() || token.is_string() {
        cursor.advance();
        Ok(token.text.clone())
    } else {
        Err(ParseError::unexpected(token, "a document key"))
    }
}

fn function_ref(mut components: Vec<String>, first: &Token) -> Result<FunctionRef, ParseError> {
    let Some(name) = components.pop() else {
        return Err(ParseError::eof("a function name"));
    };
    match components.len() {
        0 => Ok(FunctionRef::new(name)),
        1 => Ok(FunctionRef::with_schema(components.remove(0), name)),
        _ => Err(ParseError::syntax(
            "too many qualifiers in function name",
            first.span,
        )),
    }
}

/// CAST target type; renders the canonical upper-case descriptor.
fn parse_cast_type(cursor: &mut TokenCursor<'_>) -> Result<String, ParseError> {
    let Some(token) = cursor.peek() else {
        return Err(ParseError::eof("a type name"));
    };
    let Some(kw) = token.keyword() else {
        return Err(ParseError::unexpected(token, "a type name"));
    };
    cursor.advance();
    match kw {
        Keyword::Signed | Keyword::Unsigned => {
            let name = if kw == Keyword::Signed {
                "SIGNED"
            } else {
                "UNSIGNED"
            };
            if cursor.consume_keyword(Keyword::Integer).is_some() {
                Ok(format!("{name} INTEGER"))
            } else {
                Ok(name.to_string())
            }
        }
        Keyword::Char | Keyword::Binary => {
            let name = if kw == Keyword::Char { "CHAR" } else { "BINARY" };
            if cursor.consume_kind(TokenKind::LParen).is_some() {
                let len = expect_dimension(cursor)?;
                cursor.expect_kind(TokenKind::RParen)?;
                Ok(format!("{name}({len})"))
            } else {
                Ok(name.to_string())
            }
        }
        Keyword::Decimal => {
            if cursor.consume_kind(TokenKind::LParen).is_some() {
                let precision = expect_dimension(cursor)?;
                let descriptor = if cursor.consume_kind(TokenKind::Comma).is_some() {
                    let scale = expect_dimension(cursor)?;
                    format!("DECIMAL({precision}, {scale})")
                } else {
                    format!("DECIMAL({precision})")
                };
                cursor.expect_kind(TokenKind::RParen)?;
                Ok(descriptor)
            } else {
                Ok("DECIMAL".to_string())
            }
        }
        Keyword::Time => Ok("TIME".to_string()),
        Keyword::Date => Ok("DATE".to_string()),
        Keyword::Datetime => Ok("DATETIME".to_string()),
        Keyword::Json => Ok("JSON".to_string()),
        _ => Err(ParseError::unexpected(token, "a type name")),
    }
}

fn expect_dimension(cursor: &mut TokenCursor<'_>) -> Result<String, ParseError> {
    let token = cursor.expect_kind(TokenKind::Integer)?;
    Ok(token.text.clone())
}

fn hex_bytes(digits: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    let mut chars = digits.chars();
    while let (Some(hi), Some(lo)) = (chars.next(), chars.next()) {
        let value = hi.to_digit(16).unwrap_or(0) * 16 + lo.to_digit(16).unwrap_or(0);
        bytes.push(u8::try_from(value).unwrap_or(0));
    }
    bytes
}

fn or_op(token: &Token) -> Option<&'static str> {
    match token.kind {
        TokenKind::BarBar => Some("||"),
        _ if token.is_keyword(Keyword::Or) => Some("||"),
        _ => None,
    }
}

fn and_op(token: &Token) -> Option<&'static str> {
    match token.kind {
        TokenKind::AmpAmp => Some("&&"),
        _ if token.is_keyword(Keyword::And) => Some("&&"),
        _ => None,
    }
}

fn comp_op(token: &Token) -> Option<&'static str> {
    match token.kind {
        TokenKind::Eq | TokenKind::EqEq => Some("=="),
        TokenKind::Ne => Some("!="),
        TokenKind::Lt => Some("<"),
        TokenKind::Gt => Some(">"),
        TokenKind::Le => Some("<="),
        TokenKind::Ge => Some(">="),
        _ => None,
    }
}

fn bit_op(token: &Token) -> Option<&'static str> {
    match token.kind {
        TokenKind::Amp => Some("&"),
        TokenKind::Bar => Some("|"),
        TokenKind::Caret => Some("^"),
        _ => None,
    }
}

fn shift_op(token: &Token) -> Option<&'static str> {
    match token.kind {
        TokenKind::Shl => Some("<<"),
        TokenKind::Shr => Some(">>"),
        _ => None,
    }
}

fn add_op(token: &Token) -> Option<&'static str> {
    match token.kind {
        TokenKind::Plus => Some("+"),
        TokenKind::Minus => Some("-"),
        _ => None,
    }
}

fn mul_op(token: &Token) -> Option<&'static str> {
    match token.kind {
        TokenKind::Star => Some("*"),
        TokenKind::Slash => Some("/"),
        TokenKind::Percent => Some("%"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(input: &str) -> StoredExpr {
        ExprParser::new(input, ParserMode::Document)
            .and_then(|p| p.parse_stored())
            .unwrap_or_else(|e| panic!("document-mode {input:?}: {e}"))
    }

    fn table(input: &str) -> StoredExpr {
        ExprParser::new(input, ParserMode::Table)
            .and_then(|p| p.parse_stored())
            .unwrap_or_else(|e| panic!("table-mode {input:?}: {e}"))
    }

    fn doc_err(input: &str) -> ParseError {
        ExprParser::new(input, ParserMode::Document)
            .and_then(|p| p.parse_stored())
            .unwrap_err()
    }

    fn table_err(input: &str) -> ParseError {
        ExprParser::new(input, ParserMode::Table)
            .and_then(|p| p.parse_stored())
            .unwrap_err()
    }

    fn op(name: &str, args: Vec<StoredExpr>) -> StoredExpr {
        StoredExpr::Op(name.to_string(), args)
    }

    fn int(value: i64) -> StoredExpr {
        StoredExpr::Scalar(StoredScalar::Int(value))
    }

    fn member_path(names: &[&str]) -> StoredExpr {
        let mut p = DocPath::new();
        for name in names {
            p.push(PathElement::Member((*name).to_string()));
        }
        StoredExpr::PathRef(p)
    }

    #[test]
    fn binary_precedence_and_names() {
        assert_eq!(doc("1 + 2 * 3"), op("+", vec![int(1), op("*", vec![int(2), int(3)])]));
        assert_eq!(doc("1 = 2"), op("==", vec![int(1), int(2)]));
        assert_eq!(doc("1 == 2"), op("==", vec![int(1), int(2)]));
        assert_eq!(doc("1 <> 2"), op("!=", vec![int(1), int(2)]));
        assert_eq!(doc("1 & 2 << 3"), op("&", vec![int(1), op("<<", vec![int(2), int(3)])]));
    }

    #[test]
    fn binary_levels_are_left_associative() {
        assert_eq!(
            doc("1 - 2 - 3"),
            op("-", vec![op("-", vec![int(1), int(2)]), int(3)])
        );
        assert_eq!(
            doc("8 / 4 / 2"),
            op("/", vec![op("/", vec![int(8), int(4)]), int(2)])
        );
    }

    #[test]
    fn word_and_symbol_connectives_share_names() {
        let expected = op("&&", vec![member_path(&["a"]), member_path(&["b"])]);
        assert_eq!(doc("a AND b"), expected);
        assert_eq!(doc("a && b"), expected);
        let expected = op("||", vec![member_path(&["a"]), member_path(&["b"])]);
        assert_eq!(doc("a OR b"), expected);
        assert_eq!(doc("a || b"), expected);
        assert_eq!(
            doc("a OR b AND c"),
            op(
                "||",
                vec![
                    member_path(&["a"]),
                    op("&&", vec![member_path(&["b"]), member_path(&["c"])]),
                ]
            )
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            doc("(1 + 2) * 3"),
            op("*", vec![op("+", vec![int(1), int(2)]), int(3)])
        );
    }

    #[test]
    fn unary_operators_nest() {
        assert_eq!(
            doc("not not active"),
            op("not", vec![op("not", vec![member_path(&["active"])])])
        );
        assert_eq!(doc("!ok"), op("!", vec![member_path(&["ok"])]));
        assert_eq!(doc("~bits"), op("~", vec![member_path(&["bits"])]));
        assert_eq!(doc("- total"), op("-", vec![member_path(&["total"])]));
    }

    #[test]
    fn sign_folds_into_numeric_literals() {
        assert_eq!(doc("-5"), int(-5));
        assert_eq!(doc("+5"), int(5));
        assert_eq!(
            doc("-2.5"),
            StoredExpr::Scalar(StoredScalar::Double(-2.5))
        );
        assert_eq!(doc("-0x10"), int(-16));
        assert_eq!(doc("-9223372036854775808"), int(i64::MIN));
        assert_eq!(
            doc("9223372036854775808"),
            StoredExpr::Scalar(StoredScalar::Uint(9_223_372_036_854_775_808))
        );
        assert!(doc_err("-9223372036854775809")
            .to_string()
            .contains("too large for signed type"));
    }

    #[test]
    fn literal_scalars() {
        assert_eq!(
            doc("'hello'"),
            StoredExpr::Scalar(StoredScalar::Str("hello".into()))
        );
        assert_eq!(doc("TRUE"), StoredExpr::Scalar(StoredScalar::Bool(true)));
        assert_eq!(doc("false"), StoredExpr::Scalar(StoredScalar::Bool(false)));
        assert_eq!(doc("NULL"), StoredExpr::Scalar(StoredScalar::Null));
        assert_eq!(doc("0xff"), int(255));
        assert_eq!(
            doc("x'CAFE'"),
            StoredExpr::Scalar(StoredScalar::Octets(vec![0xCA, 0xFE]))
        );
        assert_eq!(
            doc("1.5e2"),
            StoredExpr::Scalar(StoredScalar::Double(150.0))
        );
    }

    #[test]
    fn placeholders_and_variables() {
        assert_eq!(
            doc("? + ?"),
            op(
                "+",
                vec![StoredExpr::PosParam(1), StoredExpr::PosParam(2)]
            )
        );
        assert_eq!(doc(":age"), StoredExpr::NamedParam("age".into()));
        assert_eq!(doc("@session"), StoredExpr::Variable("session".into()));
    }

    #[test]
    fn function_calls() {
        assert_eq!(
            table("concat(city, 'x')"),
            StoredExpr::Call(
                FunctionRef::new("concat"),
                vec![
                    StoredExpr::ColumnRef(ColumnRef::new("city"), None),
                    StoredExpr::Scalar(StoredScalar::Str("x".into())),
                ]
            )
        );
        assert_eq!(
            doc("db.rand()"),
            StoredExpr::Call(FunctionRef::with_schema("db", "rand"), vec![])
        );
        assert_eq!(
            doc("count(*)"),
            StoredExpr::Call(FunctionRef::new("count"), vec![op("*", vec![])])
        );
    }

    #[test]
    fn table_mode_column_shapes() {
        assert_eq!(
            table("col"),
            StoredExpr::ColumnRef(ColumnRef::new("col"), None)
        );
        assert_eq!(
            table("tbl.col"),
            StoredExpr::ColumnRef(ColumnRef::with_table("tbl", "col"), None)
        );
        assert_eq!(
            table("db.tbl.col"),
            StoredExpr::ColumnRef(ColumnRef::with_schema("db", "tbl", "col"), None)
        );
    }

    #[test]
    fn table_mode_arrow_paths() {
        let mut p = DocPath::new();
        p.push(PathElement::Member("a".into()));
        p.push(PathElement::Index(0));
        let expected = StoredExpr::ColumnRef(ColumnRef::new("doc"), Some(p));
        assert_eq!(table("doc->'$.a[0]'"), expected);
        assert_eq!(table("doc->>'$.a[0]'"), expected);
        assert_eq!(table("doc->$.a[0]"), expected);
    }

    #[test]
    fn quoted_arrow_path_must_be_fully_consumed() {
        assert!(table_err("doc->'$.a b'")
            .to_string()
            .contains("expected end of document path"));
        assert!(table_err("doc->'no_dollar'")
            .to_string()
            .contains("expected '$'"));
    }

    #[test]
    fn document_mode_paths() {
        assert_eq!(doc("address.town"), member_path(&["address", "town"]));
        assert_eq!(doc("$"), StoredExpr::PathRef(DocPath::new()));
        let mut p = DocPath::new();
        p.push(PathElement::Member("tags".into()));
        p.push(PathElement::AnyIndex);
        assert_eq!(doc("$.tags[*]"), StoredExpr::PathRef(p));
        // reserved words stay usable as member names
        assert_eq!(doc("date.day"), member_path(&["date", "day"]));
        let mut p = DocPath::new();
        p.push(PathElement::Member("a".into()));
        p.push(PathElement::AnyPath);
        p.push(PathElement::Member("b".into()));
        assert_eq!(doc("a**.b"), StoredExpr::PathRef(p));
    }

    #[test]
    fn bare_path_is_rejected_in_table_mode() {
        assert!(table_err("$.a")
            .to_string()
            .contains("requires a column reference"));
    }

    #[test]
    fn ilri_membership_shapes() {
        assert_eq!(
            doc("age IN (18, 21)"),
            op("in", vec![member_path(&["age"]), int(18), int(21)])
        );
        assert_eq!(
            doc("name NOT IN ('a', 'b')"),
            op(
                "not",
                vec![op(
                    "in",
                    vec![
                        member_path(&["name"]),
                        StoredExpr::Scalar(StoredScalar::Octets(b"a".to_vec())),
                        StoredExpr::Scalar(StoredScalar::Octets(b"b".to_vec())),
                    ]
                )]
            )
        );
        assert_eq!(
            doc("item IN basket.items"),
            op(
                "cont_in",
                vec![member_path(&["item"]), member_path(&["basket", "items"])]
            )
        );
    }

    #[test]
    fn in_list_strings_become_blobs_but_compositions_do_not() {
        let parsed = doc("k IN ('a' || 'b')");
        assert_eq!(
            parsed,
            op(
                "in",
                vec![
                    member_path(&["k"]),
                    op(
                        "||",
                        vec![
                            StoredExpr::Scalar(StoredScalar::Str("a".into())),
                            StoredExpr::Scalar(StoredScalar::Str("b".into())),
                        ]
                    ),
                ]
            )
        );
    }

    #[test]
    fn ilri_like_between_regexp() {
        assert_eq!(
            doc("name LIKE 'a%'"),
            op(
                "like",
                vec![
                    member_path(&["name"]),
                    StoredExpr::Scalar(StoredScalar::Str("a%".into())),
                ]
            )
        );
        assert_eq!(
            doc("name LIKE 'a!%' ESCAPE '!'"),
            op(
                "like",
                vec![
                    member_path(&["name"]),
                    StoredExpr::Scalar(StoredScalar::Str("a!%".into())),
                    StoredExpr::Scalar(StoredScalar::Str("!".into())),
                ]
            )
        );
        assert_eq!(
            doc("age BETWEEN 18 AND 65"),
            op("between", vec![member_path(&["age"]), int(18), int(65)])
        );
        assert_eq!(
            doc("age NOT BETWEEN 18 AND 65"),
            op(
                "not",
                vec![op(
                    "between",
                    vec![member_path(&["age"]), int(18), int(65)]
                )]
            )
        );
        assert_eq!(
            doc("flag BETWEEN 1 AND NOT done"),
            op(
                "between",
                vec![
                    member_path(&["flag"]),
                    int(1),
                    op("not", vec![member_path(&["done"])]),
                ]
            )
        );
        assert_eq!(
            doc("city REGEXP '^A'"),
            op(
                "regexp",
                vec![
                    member_path(&["city"]),
                    StoredExpr::Scalar(StoredScalar::Str("^A".into())),
                ]
            )
        );
    }

    #[test]
    fn ilri_is_shapes() {
        assert_eq!(
            doc("deleted IS NULL"),
            op(
                "is",
                vec![member_path(&["deleted"]), StoredExpr::Scalar(StoredScalar::Null)]
            )
        );
        assert_eq!(
            doc("deleted IS NOT NULL"),
            op(
                "is_not",
                vec![member_path(&["deleted"]), StoredExpr::Scalar(StoredScalar::Null)]
            )
        );
        assert!(doc_err("deleted NOT IS NULL")
            .to_string()
            .contains("unexpected NOT before IS"));
    }

    #[test]
    fn ilri_applies_at_most_once() {
        assert!(doc_err("a IN (1) IN (2)")
            .to_string()
            .contains("expected end of expression"));
    }

    #[test]
    fn container_literals() {
        assert_eq!(
            doc("[1, [2]]"),
            StoredExpr::Arr(vec![int(1), StoredExpr::Arr(vec![int(2)])])
        );
        assert_eq!(
            doc("{'a': 1, size: [2]}"),
            StoredExpr::Doc(vec![
                ("a".into(), int(1)),
                ("size".into(), StoredExpr::Arr(vec![int(2)])),
            ])
        );
    }

    #[test]
    fn containers_do_not_continue_as_binary_operands() {
        assert!(doc_err("[1, 2] + 3")
            .to_string()
            .contains("expected end of expression"));
        assert_eq!(
            doc("3 + [1, 2]"),
            op("+", vec![int(3), StoredExpr::Arr(vec![int(1), int(2)])])
        );
    }

    #[test]
    fn cast_descriptor_rendering() {
        assert_eq!(
            doc("CAST(-2345 AS DECIMAL(2,3))"),
            op(
                "cast",
                vec![
                    int(-2345),
                    StoredExpr::Scalar(StoredScalar::Octets(b"DECIMAL(2, 3)".to_vec())),
                ]
            )
        );
        assert_eq!(
            doc("CAST(total AS SIGNED INTEGER)"),
            op(
                "cast",
                vec![
                    member_path(&["total"]),
                    StoredExpr::Scalar(StoredScalar::Octets(b"SIGNED INTEGER".to_vec())),
                ]
            )
        );
        assert_eq!(
            doc("CAST(name AS CHAR(10))"),
            op(
                "cast",
                vec![
                    member_path(&["name"]),
                    StoredExpr::Scalar(StoredScalar::Octets(b"CHAR(10)".to_vec())),
                ]
            )
        );
        assert_eq!(
            doc("CAST(payload AS JSON)"),
            op(
                "cast",
                vec![
                    member_path(&["payload"]),
                    StoredExpr::Scalar(StoredScalar::Octets(b"JSON".to_vec())),
                ]
            )
        );
        assert!(doc_err("CAST(x AS FLOAT)")
            .to_string()
            .contains("expected a type name"));
    }

    #[test]
    fn rejects_empty_and_trailing_input() {
        assert!(matches!(doc_err(""), ParseError::Empty { .. }));
        assert!(matches!(doc_err("   \t"), ParseError::Empty { .. }));
        assert!(doc_err("1 2")
            .to_string()
            .contains("expected end of expression"));
    }

    #[test]
    fn error_positions_point_at_offending_token() {
        let err = doc_err("1 + + ,");
        assert_eq!(err.span().map(|s| s.start), Some(6));
    }
}
