//! Token types produced by the note lexer.

use std::fmt;

use crate::Span;

/// Longest token text shown by the `Display` impl before it is cut off.
const DISPLAY_TEXT_LIMIT: usize = 20;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `- ` (or a bare `-` at the start of a line): opens an array element.
    ArrayMarker,
    /// `key:` - the text is the key without the colon.
    MapKey,
    /// A bare scalar running to the end of the line.
    Constant,
    /// A run of plain spaces (spaces and tabs).
    Space,
    /// `\n` or `\r\n`
    LineBreak,
    /// `@body` at a logical line start - the text is the body without `@`.
    Directive,
    /// Lexer error; the text is the message.
    Error,
    /// End of input.
    End,
}

impl TokenKind {
    /// Whether this kind ends the token stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenKind::End | TokenKind::Error)
    }

    /// Whether a token of this kind contributes to the indentation of a line.
    pub fn is_indentation(&self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::ArrayMarker)
    }
}

/// A token with its kind, its raw span, and its text.
///
/// `span` always covers everything the lexer consumed for this token, so the
/// spans of a full token stream tile the input. `text` is the meaningful part
/// of it, with separators like the `: ` after a map key dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// The raw input this token was read from.
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }

    /// Length of the token text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.chars().count() > DISPLAY_TEXT_LIMIT {
            let head: String = self.text.chars().take(DISPLAY_TEXT_LIMIT).collect();
            write!(f, "{:?}: {:?}...", self.kind, head)
        } else {
            write!(f, "{:?}: {:?}", self.kind, self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_short_text() {
        let token = Token::new(TokenKind::MapKey, Span::new(0, 6), "name");
        assert_eq!(token.to_string(), r#"MapKey: "name""#);
    }

    #[test]
    fn test_display_truncates_long_text() {
        let token = Token::new(
            TokenKind::Constant,
            Span::new(0, 26),
            "abcdefghijklmnopqrstuvwxyz",
        );
        assert_eq!(token.to_string(), r#"Constant: "abcdefghijklmnopqrst"..."#);
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(TokenKind::End.is_terminal());
        assert!(TokenKind::Error.is_terminal());
        assert!(!TokenKind::LineBreak.is_terminal());
    }
}
