//! Parser for note documents.
//!
//! ```text
//! name: demo
//! servers:
//!   - host: a.example.com
//!   - host: b.example.com
//! @import defaults.note
//! ```
//!
//! Indentation alone decides nesting. `@import <path>` splices another
//! document in at the position of the directive, sharing the tree and the
//! indentation of the importing line.

use std::path::Path;

pub use note_tokenizer::{Lexer, Span, Token, TokenKind};
pub use note_tree::{Document, Node};

mod diagnostic;

mod directive;
pub use directive::{Directive, DirectiveError};

mod error;
pub use error::{Location, ParseError, ParseErrorKind};

mod options;
pub use options::ParseOptions;

mod parser;
pub use parser::Parser;

mod source;
pub use source::{DefaultProvider, MemoryProvider, SourceError, SourceProvider, is_remote};

/// Parse a document held in memory. Imports are read from disk or fetched
/// over HTTP, relative to the current directory.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    Parser::new(DefaultProvider).parse_str("<input>", text)
}

/// Read and parse a document from disk, along with its imports.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, ParseError> {
    Parser::new(DefaultProvider).parse(&path.as_ref().to_string_lossy())
}
