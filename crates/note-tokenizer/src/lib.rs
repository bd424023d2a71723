//! A lexer for note documents.
//!
//! The lexer is a small state machine that turns a whole in-memory document
//! into a flat stream of [`Token`]s. It never looks further ahead than one
//! rune; map keys are recognized by buffering the rest of the line once and
//! rewinding to the first `:`.

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod lexer;
pub use lexer::Lexer;
