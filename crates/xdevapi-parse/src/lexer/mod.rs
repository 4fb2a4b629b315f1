//! Tokenization: spans, tokens, the scanner and the token cursor.

mod cursor;
mod span;
mod token;
mod tokenizer;

pub use cursor::TokenCursor;
pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Tokenizer;
