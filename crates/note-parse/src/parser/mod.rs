//! Indentation-driven parser for note documents.

use std::sync::Arc;

use note_tokenizer::{Lexer, Span, Token, TokenKind};
use note_tree::{ContainerKind, Document, TreeBuilder};
use tracing::{debug, trace};

use crate::directive::{Directive, DirectiveError};
use crate::error::{Location, ParseError, ParseErrorKind};
use crate::options::ParseOptions;
use crate::source::{SourceProvider, is_remote, normalize};

/// Parses note documents, loading the root document and its imports
/// through a [`SourceProvider`].
#[derive(Debug, Clone)]
pub struct Parser<P> {
    provider: P,
    options: ParseOptions,
}

impl<P: SourceProvider> Parser<P> {
    /// Create a parser with default options.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            options: ParseOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Load `source_id` through the provider and parse it.
    pub fn parse(&self, source_id: &str) -> Result<Document, ParseError> {
        let text = self.provider.fetch(source_id).map_err(|cause| {
            ParseError::new(ParseErrorKind::SourceUnavailable {
                path: source_id.to_string(),
                cause,
            })
        })?;
        self.parse_str(source_id, text)
    }

    /// Parse `text` as the document `source_id`. Imports inside it are
    /// still loaded through the provider.
    pub fn parse_str(
        &self,
        source_id: &str,
        text: impl Into<Arc<str>>,
    ) -> Result<Document, ParseError> {
        debug!("Parsing {}", source_id);
        Session::new(self, Lexer::new(source_id, text)).run()
    }
}

/// State of one parse: the tree being built, the indentation of the
/// current line, and the lexers of every open document.
struct Session<'p, P> {
    parser: &'p Parser<P>,
    root_id: String,
    builder: TreeBuilder,
    /// Columns of indentation seen on the current line so far.
    indentation: usize,
    /// Lexer of the innermost open document.
    lexer: Lexer,
    /// Importing documents, waiting for their imports to finish.
    suspended: Vec<Lexer>,
}

impl<'p, P: SourceProvider> Session<'p, P> {
    fn new(parser: &'p Parser<P>, lexer: Lexer) -> Self {
        Self {
            parser,
            root_id: lexer.name().to_string(),
            builder: TreeBuilder::with_max_depth(parser.options.max_nesting_depth),
            indentation: 0,
            lexer,
            suspended: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Document, ParseError> {
        loop {
            let Token { kind, span, text } = self.lexer.next_token();
            trace!("{:?} {:?} at indentation {}", kind, text, self.indentation);
            match kind {
                TokenKind::ArrayMarker => {
                    self.builder
                        .open(ContainerKind::Array, self.indentation)
                        .map_err(|e| self.error(e.into(), span))?;
                    self.indentation += text.chars().count();
                }
                TokenKind::MapKey => {
                    self.builder
                        .key(self.indentation, text)
                        .map_err(|e| self.error(e.into(), span))?;
                }
                TokenKind::Constant => {
                    self.builder
                        .constant(text)
                        .map_err(|e| self.error(e.into(), span))?;
                }
                TokenKind::Space => self.indentation += text.chars().count(),
                TokenKind::LineBreak => self.indentation = 0,
                TokenKind::Directive => self.directive(&text, span)?,
                TokenKind::Error => {
                    return Err(self.error(ParseErrorKind::LexError(text), span));
                }
                TokenKind::End => match self.suspended.pop() {
                    Some(importer) => {
                        debug!("Finished {}, resuming {}", self.lexer.name(), importer.name());
                        self.lexer = importer;
                    }
                    None => break,
                },
            }
        }

        Ok(self.builder.finish(self.root_id))
    }

    fn directive(&mut self, body: &str, span: Span) -> Result<(), ParseError> {
        let target = match Directive::parse(body) {
            Ok(Directive::Import { path }) => path,
            Err(DirectiveError::Unknown) => {
                return Err(self.error(ParseErrorKind::UnknownDirective(body.to_string()), span));
            }
            Err(DirectiveError::MalformedImport) => {
                return Err(self.error(ParseErrorKind::MalformedImport(body.to_string()), span));
            }
        };

        let path = self.parser.provider.resolve(self.lexer.name(), &target);
        let limit = self.parser.options.max_import_depth;

        if is_remote(&path) && !self.parser.options.allow_remote {
            return Err(self.error(ParseErrorKind::RemoteImportDisabled { path }, span));
        }
        if self.is_open(&path) {
            return Err(self.error(ParseErrorKind::ImportCycle { path }, span));
        }
        if self.suspended.len() >= limit {
            return Err(self.error(ParseErrorKind::ImportDepthExceeded { path, limit }, span));
        }

        let text = match self.parser.provider.fetch(&path) {
            Ok(text) => text,
            Err(cause) => {
                return Err(self.error(ParseErrorKind::SourceUnavailable { path, cause }, span));
            }
        };

        debug!(
            "Importing {} from {} at indentation {}",
            path,
            self.lexer.name(),
            self.indentation
        );
        let imported = Lexer::new(path, text);
        let importer = std::mem::replace(&mut self.lexer, imported);
        self.suspended.push(importer);
        Ok(())
    }

    /// Whether `path` is one of the documents currently being read.
    fn is_open(&self, path: &str) -> bool {
        let path = normalize(path);
        std::iter::once(&self.lexer)
            .chain(&self.suspended)
            .any(|lexer| normalize(lexer.name()) == path)
    }

    fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError::new(kind).at(Location {
            source_id: self.lexer.name().to_string(),
            text: self.lexer.source().clone(),
            span,
        })
    }
}
