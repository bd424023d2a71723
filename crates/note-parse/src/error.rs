//! Parse errors.

use std::fmt;
use std::sync::Arc;

use note_tokenizer::Span;
use note_tree::{BuildError, ContainerKind};

use crate::source::SourceError;

/// What went wrong.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// A document (the root or an import) could not be loaded.
    SourceUnavailable { path: String, cause: SourceError },
    /// The lexer rejected the input; holds its message.
    LexError(String),
    /// `@<body>` is not a known directive.
    UnknownDirective(String),
    /// `@import` without exactly one path.
    MalformedImport(String),
    /// A container of the other kind is already open at this indentation.
    IndentationTypeConflict {
        level: usize,
        expected: ContainerKind,
        found: ContainerKind,
    },
    /// A second top-level constant.
    UnexpectedRootConstant(String),
    /// A map value with no key waiting for it.
    MissingKey,
    /// Content shallower than every open container, after the root exists.
    DetachedContent { level: usize },
    /// Containers nested deeper than the configured limit.
    NestingTooDeep { limit: usize },
    /// A document imports itself, directly or through other imports.
    ImportCycle { path: String },
    /// Too many imports open at once.
    ImportDepthExceeded { path: String, limit: usize },
    /// A URL import while remote imports are turned off.
    RemoteImportDisabled { path: String },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::SourceUnavailable { path, cause } => {
                write!(f, "source {path:?} is unavailable: {cause}")
            }
            ParseErrorKind::LexError(message) => write!(f, "{message}"),
            ParseErrorKind::UnknownDirective(body) => write!(f, "unknown directive @{body}"),
            ParseErrorKind::MalformedImport(body) => write!(f, "malformed import @{body}"),
            ParseErrorKind::IndentationTypeConflict {
                level,
                expected,
                found,
            } => write!(
                f,
                "indentation {level} is already open as {found}, cannot continue it as {expected}"
            ),
            ParseErrorKind::UnexpectedRootConstant(value) => {
                write!(f, "unexpected top-level constant {value:?}")
            }
            ParseErrorKind::MissingKey => write!(f, "map value has no key"),
            ParseErrorKind::DetachedContent { level } => {
                write!(f, "content at indentation {level} is outside the document root")
            }
            ParseErrorKind::NestingTooDeep { limit } => {
                write!(f, "containers nest deeper than the limit of {limit}")
            }
            ParseErrorKind::ImportCycle { path } => write!(f, "import cycle through {path:?}"),
            ParseErrorKind::ImportDepthExceeded { path, limit } => {
                write!(f, "importing {path:?} exceeds the import depth limit of {limit}")
            }
            ParseErrorKind::RemoteImportDisabled { path } => {
                write!(f, "remote import of {path:?} is disabled")
            }
        }
    }
}

impl From<BuildError> for ParseErrorKind {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::IndentationTypeConflict {
                level,
                expected,
                found,
            } => ParseErrorKind::IndentationTypeConflict {
                level,
                expected,
                found,
            },
            BuildError::MissingKey => ParseErrorKind::MissingKey,
            BuildError::UnexpectedRootConstant(value) => {
                ParseErrorKind::UnexpectedRootConstant(value)
            }
            BuildError::DetachedContent { level } => ParseErrorKind::DetachedContent { level },
            BuildError::NestingTooDeep { limit } => ParseErrorKind::NestingTooDeep { limit },
        }
    }
}

/// Where in which source an error happened.
#[derive(Debug, Clone)]
pub struct Location {
    /// Source id of the document holding the offending token.
    pub source_id: String,
    /// Full text of that document.
    pub text: Arc<str>,
    pub span: Span,
}

impl Location {
    /// 1-based line and column of the start of the span.
    pub fn line_col(&self) -> (usize, usize) {
        let before = &self.text[..(self.span.start as usize).min(self.text.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before, |i| &before[i + 1..])
            .chars()
            .count()
            + 1;
        (line, column)
    }
}

/// A fatal parse error. No partial tree is ever returned alongside it.
#[derive(Debug)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The offending token, when the error came from inside a document.
    pub location: Option<Location>,
}

impl ParseError {
    /// Create an error with no location.
    pub fn new(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Whether the error is a document that could not be loaded.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self.kind, ParseErrorKind::SourceUnavailable { .. })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => {
                let (line, column) = location.line_col();
                write!(f, "{}:{line}:{column}: {}", location.source_id, self.kind)
            }
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseErrorKind::SourceUnavailable { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> Self {
        Self::new(kind)
    }
}
