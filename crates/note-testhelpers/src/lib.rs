//! Test utilities shared by the note crates.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a tracing subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; defaults to `debug` for the note crates. Safe to call
/// from every test.
pub fn setup() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("note_tokenizer=debug,note_tree=debug,note_parse=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
        tracing::trace!("test tracing initialized");
    });
}

/// Strip the common leading indentation from a multi-line literal.
///
/// A leading newline is dropped so documents can start on the line after
/// the opening quote. Blank lines do not count towards the common indent.
pub fn unindent(text: &str) -> String {
    let text = text.strip_prefix('\n').unwrap_or(text);
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            out.push_str(line.trim_start_matches(' '));
        } else {
            out.push_str(&line[indent..]);
        }
    }
    out
}
