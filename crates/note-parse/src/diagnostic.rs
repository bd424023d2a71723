//! Diagnostic rendering for parse errors.

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::error::{ParseError, ParseErrorKind};

impl ParseError {
    /// Render this error with ariadne.
    ///
    /// Errors without a location (the root document could not be read)
    /// render as their plain message.
    pub fn render(&self) -> String {
        let mut output = Vec::new();
        if self.write_report(&mut output).is_err() {
            return self.to_string();
        }
        String::from_utf8(output).unwrap_or_else(|_| self.to_string())
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, mut writer: W) -> std::io::Result<()> {
        let Some(location) = &self.location else {
            return writeln!(writer, "error: {}", self.kind);
        };
        let filename = location.source_id.as_str();
        let range = location.span.range();
        self.build_report(filename, range)
            .finish()
            .write((filename, Source::from(&*location.text)), writer)
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        range: Range<usize>,
    ) -> ariadne::ReportBuilder<'static, (&'a str, Range<usize>)> {
        let report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.kind.to_string());
        let label = |message: &str| {
            Label::new((filename, range.clone()))
                .with_message(message)
                .with_color(Color::Red)
        };

        match &self.kind {
            ParseErrorKind::SourceUnavailable { cause, .. } => report
                .with_label(label("imported here"))
                .with_note(cause.to_string()),
            ParseErrorKind::LexError(_) => report.with_label(label("here")),
            ParseErrorKind::UnknownDirective(_) => report
                .with_label(label("unknown directive"))
                .with_help("the only directive is @import <path>"),
            ParseErrorKind::MalformedImport(_) => report
                .with_label(label("malformed import"))
                .with_help("write @import followed by exactly one path or URL"),
            ParseErrorKind::IndentationTypeConflict { found, .. } => report
                .with_label(label(&format!("{found} already open at this indentation")))
                .with_help("indent this line further, or start it the same way as its siblings"),
            ParseErrorKind::UnexpectedRootConstant(_) => report
                .with_label(label("second top-level value"))
                .with_help("a document whose root is a constant can hold only that constant"),
            ParseErrorKind::MissingKey => report
                .with_label(label("value without a key"))
                .with_help("map entries are written as key: value"),
            ParseErrorKind::DetachedContent { .. } => report
                .with_label(label("not inside the root container"))
                .with_help("indent this line at least as far as the first line of the document"),
            ParseErrorKind::NestingTooDeep { .. } => report
                .with_label(label("nested too deeply"))
                .with_help("flatten the document, or raise the nesting limit"),
            ParseErrorKind::ImportCycle { .. } => report
                .with_label(label("imported again here"))
                .with_help("a document cannot import itself, directly or indirectly"),
            ParseErrorKind::ImportDepthExceeded { .. } => {
                report.with_label(label("too many nested imports"))
            }
            ParseErrorKind::RemoteImportDisabled { .. } => report
                .with_label(label("remote import"))
                .with_help("remote imports are turned off for this parse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{MemoryProvider, Parser};

    fn render(text: &str) -> String {
        let provider = MemoryProvider::new().with("test.note", text);
        let error = Parser::new(provider).parse("test.note").unwrap_err();
        let rendered = error.render();
        String::from_utf8(strip_ansi_escapes::strip(rendered.as_bytes())).unwrap()
    }

    #[test]
    fn test_unknown_directive_report() {
        let report = render("a: 1\n@foo\n");
        assert!(report.contains("unknown directive @foo"), "{report}");
        assert!(report.contains("test.note"), "{report}");
        assert!(report.contains("the only directive is @import <path>"), "{report}");
    }

    #[test]
    fn test_type_conflict_report() {
        let report = render("- a\nb: 1\n");
        assert!(
            report.contains("indentation 0 is already open as array, cannot continue it as map"),
            "{report}"
        );
        assert!(report.contains("array already open at this indentation"), "{report}");
    }

    #[test]
    fn test_missing_root_renders_plain() {
        let error = Parser::new(MemoryProvider::new())
            .parse("gone.note")
            .unwrap_err();
        assert_eq!(
            error.render(),
            "error: source \"gone.note\" is unavailable: no source named \"gone.note\"\n"
        );
    }
}
