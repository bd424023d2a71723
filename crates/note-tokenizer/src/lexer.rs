//! The note lexer state machine.

use std::sync::Arc;

use tracing::trace;

use crate::{Span, Token, TokenKind};

const ARRAY_META: &str = "- ";
const BARE_ARRAY_META: &str = "-";
const DIRECTIVE_META: char = '@';
const MAP_META: char = ':';
const LINE_BREAK: char = '\n';
const CRLF: &str = "\r\n";

/// Lexer states. Every state except `Detect` and `Done` emits one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Detect,
    ArrayStart,
    Directive,
    LineBreak,
    Space,
    ScalarOrMap,
    End,
    Done,
}

/// A pull-based lexer over one complete note document.
///
/// Call [`Lexer::next_token`] until it returns a token of kind
/// [`TokenKind::End`] or [`TokenKind::Error`]. After that the same terminal
/// token is returned forever.
#[derive(Debug, Clone)]
pub struct Lexer {
    /// Source id, used for error reports.
    name: String,
    /// The whole document.
    source: Arc<str>,
    /// Start of the token being scanned.
    start: usize,
    /// Current byte position.
    pos: usize,
    /// Width of the last rune read by `next`, zero after `backup`.
    width: usize,
    state: State,
    /// Right after a line break, an array marker, or a map key separator.
    /// Directives are only recognized here.
    line_start: bool,
    /// Only indentation since the last line break.
    physical_line_start: bool,
    terminal: Option<Token>,
}

impl Lexer {
    /// Create a lexer over `source`, reporting itself as `name`.
    pub fn new(name: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            start: 0,
            pos: 0,
            width: 0,
            state: State::Detect,
            line_start: true,
            physical_line_start: true,
            terminal: None,
        }
    }

    /// The source id this lexer was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The text being lexed.
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// Current byte position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = &self.terminal {
            return token.clone();
        }
        loop {
            if let Some(token) = self.step() {
                if token.kind.is_terminal() {
                    self.terminal = Some(token.clone());
                }
                return token;
            }
        }
    }

    /// Run the current state. Returns the token it emitted, if any.
    fn step(&mut self) -> Option<Token> {
        match self.state {
            State::Detect => {
                self.state = self.detect();
                None
            }
            State::ArrayStart => Some(self.lex_array_start()),
            State::Directive => Some(self.lex_directive()),
            State::LineBreak => Some(self.lex_line_break()),
            State::Space => Some(self.lex_space()),
            State::ScalarOrMap => Some(self.lex_scalar_or_map()),
            State::End => Some(self.lex_end()),
            State::Done => self.terminal.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Scanning primitives
    // ------------------------------------------------------------------

    /// Read the next rune. `None` is end of input.
    fn advance(&mut self) -> Option<char> {
        let Some(c) = self.source[self.pos..].chars().next() else {
            self.width = 0;
            return None;
        };
        self.width = c.len_utf8();
        self.pos += self.width;
        Some(c)
    }

    /// Step back over the last rune read. Only valid once per `advance`.
    fn backup(&mut self) {
        self.pos -= self.width;
        self.width = 0;
    }

    fn peek(&mut self) -> Option<char> {
        let c = self.advance();
        self.backup();
        c
    }

    /// Consume runes while `valid` holds.
    fn accept_run(&mut self, valid: impl Fn(char) -> bool) {
        while self.advance().is_some_and(&valid) {}
        self.backup();
    }

    /// Consume runes until one of `stop` (not consumed) or end of input.
    fn accept_until(&mut self, stop: &[char]) {
        while let Some(c) = self.advance() {
            if stop.contains(&c) {
                self.backup();
                break;
            }
        }
    }

    /// Consume the rest of the line, leaving a `\r\n` for the line break.
    fn accept_line(&mut self) {
        self.accept_until(&[LINE_BREAK]);
        if self.source[self.start..self.pos].ends_with('\r') && self.peek() == Some(LINE_BREAK) {
            self.pos -= 1;
        }
    }

    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.source[self.pos..].starts_with(prefix)
    }

    /// Emit the pending input as a token of `kind`.
    fn emit(&mut self, kind: TokenKind) -> Token {
        let text = self.source[self.start..self.pos].to_string();
        self.emit_text(kind, text)
    }

    /// Emit the pending input with `text` standing in for its raw slice.
    fn emit_text(&mut self, kind: TokenKind, text: impl Into<String>) -> Token {
        let span = Span::new(self.start as u32, self.pos as u32);
        let token = Token::new(kind, span, text);
        trace!("Token {:?} at {:?} in {}: {:?}", kind, span, self.name, token.text);
        self.start = self.pos;
        self.state = State::Detect;
        token
    }

    /// Emit an error token and stop.
    fn errorf(&mut self, span: Span, message: String) -> Token {
        trace!("Error at {:?} in {}: {}", span, self.name, message);
        self.state = State::Done;
        Token::new(TokenKind::Error, span, message)
    }

    /// Reject NUL characters in the pending input.
    fn check_nul(&mut self) -> Option<Token> {
        let offset = self.start + self.source[self.start..self.pos].find('\0')?;
        let span = Span::new(offset as u32, offset as u32 + 1);
        Some(self.errorf(span, format!("unexpected NUL character at offset {offset}")))
    }

    // ------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------

    fn detect(&mut self) -> State {
        if self.line_start && self.source[self.pos..].starts_with(DIRECTIVE_META) {
            return State::Directive;
        }

        if self.starts_with(ARRAY_META)
            || (self.physical_line_start && self.starts_with(BARE_ARRAY_META))
        {
            return State::ArrayStart;
        }

        match self.peek() {
            None => State::End,
            Some(LINE_BREAK) => State::LineBreak,
            Some('\r') if self.starts_with(CRLF) => State::LineBreak,
            Some(c) if is_plain_space(c) => State::Space,
            Some(_) => State::ScalarOrMap,
        }
    }

    fn lex_array_start(&mut self) -> Token {
        let marker = if self.starts_with(ARRAY_META) {
            ARRAY_META
        } else {
            BARE_ARRAY_META
        };
        self.pos += marker.len();
        self.width = 0;
        // `-   value` is the same element as `- value`
        self.accept_run(is_plain_space);

        self.line_start = true;
        self.physical_line_start = false;
        self.emit_text(TokenKind::ArrayMarker, marker)
    }

    fn lex_directive(&mut self) -> Token {
        self.pos += DIRECTIVE_META.len_utf8();
        self.accept_line();
        if let Some(error) = self.check_nul() {
            return error;
        }

        self.line_start = false;
        self.physical_line_start = false;
        let body = self.source[self.start + DIRECTIVE_META.len_utf8()..self.pos].to_string();
        self.emit_text(TokenKind::Directive, body)
    }

    fn lex_line_break(&mut self) -> Token {
        if self.starts_with(CRLF) {
            self.pos += CRLF.len();
        } else {
            self.pos += 1;
        }
        self.line_start = true;
        self.physical_line_start = true;
        self.emit(TokenKind::LineBreak)
    }

    fn lex_space(&mut self) -> Token {
        self.accept_run(is_plain_space);
        self.emit(TokenKind::Space)
    }

    fn lex_scalar_or_map(&mut self) -> Token {
        self.line_start = false;
        self.physical_line_start = false;

        self.accept_line();
        if let Some(error) = self.check_nul() {
            return error;
        }

        // The line may hold a map key; rewind to its colon.
        let Some(colon) = self.source[self.start..self.pos].find(MAP_META) else {
            return self.emit(TokenKind::Constant);
        };
        let key = self.source[self.start..self.start + colon].to_string();
        self.pos = self.start + colon + MAP_META.len_utf8();
        self.width = 0;
        // name:     john
        self.accept_run(is_plain_space);

        // A map value may open with a directive or an array marker.
        self.line_start = true;
        self.emit_text(TokenKind::MapKey, key)
    }

    fn lex_end(&mut self) -> Token {
        let token = self.emit_text(TokenKind::End, "");
        self.state = State::Done;
        token
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields every token including the terminal one, then `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.terminal.is_some() {
            return None;
        }
        Some(self.next_token())
    }
}

/// Spaces and tabs. Tabs count as a single column.
fn is_plain_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use TokenKind::*;

    fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new("test.note", source)
            .filter(|t| t.kind != End)
            .collect()
    }

    fn assert_tokens(source: &str, expected: &[(TokenKind, &str)]) {
        let tokens = tokenize(source);
        let actual: Vec<(TokenKind, &str)> =
            tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(actual, expected, "tokens of {source:?}");
    }

    #[test]
    fn test_empty_input() {
        let mut lexer = Lexer::new("empty", "");
        let token = lexer.next_token();
        assert_eq!(token.kind, End);
        assert_eq!(token.span, Span::empty(0));
    }

    #[test]
    fn test_map_entry() {
        assert_tokens(
            "name: john\n",
            &[(MapKey, "name"), (Constant, "john"), (LineBreak, "\n")],
        );
    }

    #[test]
    fn test_map_key_span_covers_separator() {
        let tokens = tokenize("name:     john");
        assert_eq!(tokens[0].span, Span::new(0, 10));
        assert_eq!(tokens[1].span, Span::new(10, 14));
    }

    #[test]
    fn test_array_items() {
        assert_tokens(
            "- a\n- b\n",
            &[
                (ArrayMarker, "- "),
                (Constant, "a"),
                (LineBreak, "\n"),
                (ArrayMarker, "- "),
                (Constant, "b"),
                (LineBreak, "\n"),
            ],
        );
    }

    #[test]
    fn test_array_marker_swallows_spaces() {
        let tokens = tokenize("-   a");
        assert_eq!(tokens[0].kind, ArrayMarker);
        assert_eq!(tokens[0].text, "- ");
        assert_eq!(tokens[0].span, Span::new(0, 4));
        assert_eq!(tokens[1].text, "a");
    }

    #[test]
    fn test_bare_array_marker_at_line_start() {
        assert_tokens("-a\n", &[(ArrayMarker, "-"), (Constant, "a"), (LineBreak, "\n")]);
        assert_tokens(
            "  -a",
            &[(Space, "  "), (ArrayMarker, "-"), (Constant, "a")],
        );
    }

    #[test]
    fn test_dash_inside_value_is_a_constant() {
        assert_tokens("count: -1", &[(MapKey, "count"), (Constant, "-1")]);
        assert_tokens("- -1", &[(ArrayMarker, "- "), (Constant, "-1")]);
    }

    #[test]
    fn test_nested_array_markers() {
        assert_tokens(
            "- - a",
            &[(ArrayMarker, "- "), (ArrayMarker, "- "), (Constant, "a")],
        );
    }

    #[test]
    fn test_indentation() {
        assert_tokens(
            "a:\n\tx: 1\nb: 2\n",
            &[
                (MapKey, "a"),
                (LineBreak, "\n"),
                (Space, "\t"),
                (MapKey, "x"),
                (Constant, "1"),
                (LineBreak, "\n"),
                (MapKey, "b"),
                (Constant, "2"),
                (LineBreak, "\n"),
            ],
        );
    }

    #[test]
    fn test_directive() {
        assert_tokens(
            "@import other.note\n",
            &[(Directive, "import other.note"), (LineBreak, "\n")],
        );
    }

    #[test]
    fn test_directive_span_includes_at() {
        let tokens = tokenize("@foo");
        assert_eq!(tokens[0].span, Span::new(0, 4));
        assert_eq!(tokens[0].text, "foo");
    }

    #[test]
    fn test_directive_after_separators() {
        assert_tokens(
            "a: @import b\n",
            &[(MapKey, "a"), (Directive, "import b"), (LineBreak, "\n")],
        );
        assert_tokens("- @import b", &[(ArrayMarker, "- "), (Directive, "import b")]);
    }

    #[test]
    fn test_indented_directive() {
        assert_tokens(
            "a:\n  @import b\n",
            &[
                (MapKey, "a"),
                (LineBreak, "\n"),
                (Space, "  "),
                (Directive, "import b"),
                (LineBreak, "\n"),
            ],
        );
    }

    #[test]
    fn test_at_sign_inside_scalar() {
        assert_tokens("email: x@y.z", &[(MapKey, "email"), (Constant, "x@y.z")]);
        assert_tokens("hello @world", &[(Constant, "hello @world")]);
    }

    #[test]
    fn test_first_colon_splits_the_line() {
        // The value position is scanned again, so a second colon opens another key.
        assert_tokens(
            "url: http://example.com",
            &[(MapKey, "url"), (MapKey, "http"), (Constant, "//example.com")],
        );
    }

    #[test]
    fn test_crlf_line_breaks() {
        assert_tokens(
            "a: 1\r\nb:\r\n@x\r\n",
            &[
                (MapKey, "a"),
                (Constant, "1"),
                (LineBreak, "\r\n"),
                (MapKey, "b"),
                (LineBreak, "\r\n"),
                (Directive, "x"),
                (LineBreak, "\r\n"),
            ],
        );
    }

    #[test]
    fn test_unicode() {
        assert_tokens(
            "ключ: значение\n",
            &[(MapKey, "ключ"), (Constant, "значение"), (LineBreak, "\n")],
        );
    }

    #[test]
    fn test_terminal_token_repeats() {
        let mut lexer = Lexer::new("t", "a");
        assert_eq!(lexer.next_token().kind, Constant);
        assert_eq!(lexer.next_token().kind, End);
        assert_eq!(lexer.next_token().kind, End);
        assert_eq!(lexer.next_token().kind, End);
    }

    #[test]
    fn test_nul_is_an_error() {
        let mut lexer = Lexer::new("t", "a: 1\nb\0c\n");
        let tokens: Vec<Token> = lexer.by_ref().collect();
        let error = tokens.last().unwrap();
        assert_eq!(error.kind, Error);
        assert_eq!(error.text, "unexpected NUL character at offset 6");
        assert_eq!(error.span, Span::new(6, 7));

        // no resurrection
        assert_eq!(lexer.next_token(), *error);
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_iterator_ends_after_terminal() {
        let kinds: Vec<TokenKind> = Lexer::new("t", "x").map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Constant, End]);
    }

    proptest! {
        #[test]
        fn lexing_is_lossless(input in r"[a-z0-9é:@ \t\r\n-]{0,64}") {
            let tokens: Vec<Token> = Lexer::new("prop", input.as_str()).collect();
            let raw: String = tokens.iter().map(|t| t.raw(&input)).collect();
            prop_assert_eq!(raw, input);
        }

        #[test]
        fn lexing_ends_with_one_end_token(input in r"[a-z:@ \t\n-]{0,64}") {
            let tokens: Vec<Token> = Lexer::new("prop", input.as_str()).collect();
            let ends = tokens.iter().filter(|t| t.kind == End).count();
            prop_assert_eq!(ends, 1);
            prop_assert_eq!(tokens.last().map(|t| t.kind), Some(End));
        }
    }
}
