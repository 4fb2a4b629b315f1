//! # xdevapi-parse
//!
//! Callback-driven parsers for the X DevAPI query grammar.
//!
//! This crate provides:
//! - A shared tokenizer producing textual tokens with source spans
//! - An expression parser with document and table identifier modes
//! - Document-path and JSON parsers built on the same token machinery
//! - A capture/replay tree for buffering parsed expressions
//!
//! ## Parsing an expression
//!
//! Parsed structure streams into processor callbacks. The
//! [`StoredExpr`] tree captures the same callbacks when an owned value
//! is more convenient:
//!
//! ```rust
//! use xdevapi_parse::{ExprParser, ParserMode, StoredExpr};
//!
//! let parser = ExprParser::new("age >= 18 && name LIKE 'a%'", ParserMode::Document)?;
//! let stored = parser.parse_stored()?;
//! assert!(matches!(stored, StoredExpr::Op(ref name, _) if name == "&&"));
//! # Ok::<(), xdevapi_parse::ParseError>(())
//! ```
//!
//! ## Document paths
//!
//! Paths parse on their own or inside expressions, and render back to
//! their canonical text:
//!
//! ```rust
//! use xdevapi_parse::DocPath;
//!
//! let path: DocPath = "$.address.town".parse()?;
//! assert_eq!(path.to_string(), "$.address.town");
//! # Ok::<(), xdevapi_parse::ParseError>(())
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod processor;
pub mod refs;
pub mod stored;

pub use error::ParseError;
pub use lexer::{Span, Token, TokenKind, Tokenizer};
pub use parser::{ExprParser, JsonParser, ParserMode};
pub use processor::{
    DocProcessor, ExprProcessor, JsonProcessor, ListProcessor, PathProcessor, ScalarProcessor,
};
pub use refs::{ColumnRef, DocPath, FunctionRef, PathElement};
pub use stored::{StoredBuilder, StoredExpr, StoredScalar};
