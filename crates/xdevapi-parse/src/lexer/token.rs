//! Token types produced by the tokenizer.
//!
//! Tokens keep the literal text they were scanned from: numeric
//! conversion is deferred to the parsers, which need sign context to
//! apply the 64-bit range rules.

use core::fmt;

use super::Span;

/// Reserved words of the expression grammar.
///
/// Reserved words are not distinct token kinds. The tokenizer emits a
/// plain [`TokenKind::Word`] and the parsers recognize keywords post-hoc
/// with [`Token::keyword`], so every reserved word stays usable as a
/// document-path member name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Logical connectives
    And,
    Or,
    Not,

    // Comparison phrases
    Is,
    In,
    Like,
    Between,
    Regexp,
    Escape,

    // CAST and its type names
    Cast,
    As,
    Signed,
    Unsigned,
    Integer,
    Char,
    Binary,
    Decimal,
    Time,
    Date,
    Datetime,
    Json,

    // Literals
    True,
    False,
    Null,
}

impl Keyword {
    /// Looks up a keyword case-insensitively.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            "IS" => Some(Self::Is),
            "IN" => Some(Self::In),
            "LIKE" => Some(Self::Like),
            "BETWEEN" => Some(Self::Between),
            "REGEXP" => Some(Self::Regexp),
            "ESCAPE" => Some(Self::Escape),
            "CAST" => Some(Self::Cast),
            "AS" => Some(Self::As),
            "SIGNED" => Some(Self::Signed),
            "UNSIGNED" => Some(Self::Unsigned),
            "INTEGER" => Some(Self::Integer),
            "CHAR" => Some(Self::Char),
            "BINARY" => Some(Self::Binary),
            "DECIMAL" => Some(Self::Decimal),
            "TIME" => Some(Self::Time),
            "DATE" => Some(Self::Date),
            "DATETIME" => Some(Self::Datetime),
            "JSON" => Some(Self::Json),
            "TRUE" => Some(Self::True),
            "FALSE" => Some(Self::False),
            "NULL" => Some(Self::Null),
            _ => None,
        }
    }

    /// Canonical upper-case spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Is => "IS",
            Self::In => "IN",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
            Self::Regexp => "REGEXP",
            Self::Escape => "ESCAPE",
            Self::Cast => "CAST",
            Self::As => "AS",
            Self::Signed => "SIGNED",
            Self::Unsigned => "UNSIGNED",
            Self::Integer => "INTEGER",
            Self::Char => "CHAR",
            Self::Binary => "BINARY",
            Self::Decimal => "DECIMAL",
            Self::Time => "TIME",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::Json => "JSON",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Null => "NULL",
        }
    }
}

/// The closed set of token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare identifier: `[A-Za-z0-9_]+`.
    Word,
    /// Back-tick-quoted identifier; token text is the unescaped content.
    QuotedWord,
    /// `'...'` string literal, text unescaped.
    SingleQuotedString,
    /// `"..."` string literal, text unescaped.
    DoubleQuotedString,
    /// Integer literal; text is the digit run.
    Integer,
    /// Floating literal (fraction and/or exponent present).
    Number,
    /// `0x...` hexadecimal integer; text is the digits after `0x`.
    Hex,
    /// `x'...'` / `X'...'` hexadecimal byte string; text is the digits.
    HexBlob,

    LParen,
    RParen,
    LCurly,
    RCurly,
    LSquare,
    RSquare,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Eq,
    EqEq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Question,
    Tilde,
    Amp,
    AmpAmp,
    Bar,
    BarBar,
    Caret,
    At,
    Dollar,
    Arrow,
    TwoHeadArrow,
    StarStar,
}

impl TokenKind {
    /// Human-readable name used in diagnostics.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Word => "identifier",
            Self::QuotedWord => "quoted identifier",
            Self::SingleQuotedString | Self::DoubleQuotedString => "string literal",
            Self::Integer => "integer literal",
            Self::Number => "number literal",
            Self::Hex => "hexadecimal literal",
            Self::HexBlob => "hexadecimal string",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LCurly => "'{'",
            Self::RCurly => "'}'",
            Self::LSquare => "'['",
            Self::RSquare => "']'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Eq => "'='",
            Self::EqEq => "'=='",
            Self::Ne => "'!='",
            Self::Lt => "'<'",
            Self::Gt => "'>'",
            Self::Le => "'<='",
            Self::Ge => "'>='",
            Self::Shl => "'<<'",
            Self::Shr => "'>>'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Bang => "'!'",
            Self::Question => "'?'",
            Self::Tilde => "'~'",
            Self::Amp => "'&'",
            Self::AmpAmp => "'&&'",
            Self::Bar => "'|'",
            Self::BarBar => "'||'",
            Self::Caret => "'^'",
            Self::At => "'@'",
            Self::Dollar => "'$'",
            Self::Arrow => "'->'",
            Self::TwoHeadArrow => "'->>'",
            Self::StarStar => "'**'",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One scanned token: kind, literal text and source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was scanned.
    pub kind: TokenKind,
    /// Scanned text. For strings and quoted words this is the unescaped
    /// content; for `Hex`/`HexBlob` the digits without the `0x`/quote
    /// wrapping; otherwise the literal spelling.
    pub text: String,
    /// Location in the original input.
    pub span: Span,
}

impl Token {
    /// Creates a token.
    #[must_use]
    pub const fn new(kind: TokenKind, text: String, span: Span) -> Self {
        Self { kind, text, span }
    }

    /// The keyword this token spells, if it is a bare word.
    ///
    /// Quoted words never match: `` `not` `` is a plain name.
    #[must_use]
    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Word => Keyword::from_str(&self.text),
            _ => None,
        }
    }

    /// True when this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.keyword() == Some(kw)
    }

    /// True for bare and back-tick-quoted identifiers.
    #[must_use]
    pub const fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::QuotedWord)
    }

    /// True for `'...'` and `"..."` string literals.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::SingleQuotedString | TokenKind::DoubleQuotedString
        )
    }
}
