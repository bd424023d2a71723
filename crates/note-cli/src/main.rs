//! note CLI tool
//!
//! Parses a note document (with its imports) and prints the tree.
//!
//! Examples:
//!   note config.note                    - s-expression dump
//!   note config.note --format json      - JSON
//!   note https://example.com/a.note     - fetch over HTTP
//!   note -                              - read stdin

use std::fmt;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser as _, ValueEnum};
use note_parse::{DefaultProvider, ParseError, ParseOptions, Parser};
use note_tree::Node;
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Exit codes
// ============================================================================

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_SOURCE_UNAVAILABLE: u8 = 3;

// ============================================================================
// Arguments
// ============================================================================

#[derive(clap::Parser, Debug)]
#[command(name = "note", version)]
#[command(about = "Parse a note document and print its tree")]
struct Args {
    /// Path or URL of the document, or `-` for stdin
    input: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Sexp)]
    format: Format,

    /// How many imports may be open at once
    #[arg(long, default_value_t = ParseOptions::default().max_import_depth)]
    max_import_depth: usize,

    /// How deeply containers may nest
    #[arg(long, default_value_t = ParseOptions::default().max_nesting_depth)]
    max_nesting_depth: usize,

    /// Refuse `http://` and `https://` imports
    #[arg(long)]
    no_remote: bool,

    /// More logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Sexp,
    Json,
}

impl Args {
    fn options(&self) -> ParseOptions {
        ParseOptions::new()
            .max_import_depth(self.max_import_depth)
            .max_nesting_depth(self.max_nesting_depth)
            .allow_remote(!self.no_remote)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            match &e {
                CliError::Parse(error) => {
                    let _ = error.write_report(io::stderr());
                }
                _ => eprintln!("error: {e}"),
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn run(args: &Args) -> Result<(), CliError> {
    let parser = Parser::new(DefaultProvider::new()).with_options(args.options());
    debug!("Options: {:?}", parser.options());

    let doc = if args.input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        parser.parse_str("<stdin>", text)?
    } else {
        parser.parse(&args.input)?
    };

    let output = match args.format {
        Format::Sexp => doc.root.to_sexp(),
        Format::Json => serde_json::to_string_pretty(&node_to_json(&doc.root))
            .map_err(|e| CliError::Io(io::Error::other(e)))?,
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

/// Maps become objects (key order kept), arrays become arrays, and every
/// constant is a string.
fn node_to_json(node: &Node) -> serde_json::Value {
    match node {
        Node::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.to_string(), node_to_json(value)))
                .collect(),
        ),
        Node::Array(array) => serde_json::Value::Array(array.iter().map(node_to_json).collect()),
        Node::Constant(constant) => serde_json::Value::String(constant.value.clone()),
    }
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Parse(ParseError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Io(_) => EXIT_SOURCE_UNAVAILABLE,
            CliError::Parse(error) if error.is_source_unavailable() => EXIT_SOURCE_UNAVAILABLE,
            CliError::Parse(_) => EXIT_PARSE_ERROR,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        CliError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;
    use note_parse::{MemoryProvider, ParseErrorKind, SourceError};

    fn parse(text: &str) -> Node {
        Parser::new(MemoryProvider::new())
            .parse_str("test.note", text)
            .unwrap()
            .root
    }

    #[test]
    fn test_json_keeps_key_order() {
        let json = node_to_json(&parse("b: 1\na:\n  - x\n  - y\n"));
        assert_eq!(json.to_string(), r#"{"b":"1","a":["x","y"]}"#);
    }

    #[test]
    fn test_json_constant_root() {
        assert_eq!(node_to_json(&parse("42\n")), serde_json::json!("42"));
    }

    #[test]
    fn test_deep_document_is_a_parse_error() {
        let text = format!("{}a\n", "- ".repeat(10_000));
        let error = Parser::new(MemoryProvider::new())
            .parse_str("deep.note", text)
            .unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::NestingTooDeep { .. }));
        assert_eq!(CliError::from(error).exit_code(), EXIT_PARSE_ERROR);
    }

    #[test]
    fn test_exit_codes() {
        let missing = ParseError::new(ParseErrorKind::SourceUnavailable {
            path: "x".into(),
            cause: SourceError::NotFound("x".into()),
        });
        assert_eq!(CliError::from(missing).exit_code(), EXIT_SOURCE_UNAVAILABLE);

        let syntax = ParseError::new(ParseErrorKind::UnknownDirective("foo".into()));
        assert_eq!(CliError::from(syntax).exit_code(), EXIT_PARSE_ERROR);
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["note", "a.note", "--format", "json", "--no-remote", "-vv"])
            .unwrap();
        assert_eq!(args.format, Format::Json);
        assert_eq!(args.verbose, 2);
        assert!(!args.options().allow_remote);
        assert_eq!(args.options().max_import_depth, 32);
        assert_eq!(args.options().max_nesting_depth, 256);

        let args = Args::try_parse_from(["note", "a.note", "--max-nesting-depth", "8"]).unwrap();
        assert_eq!(args.options().max_nesting_depth, 8);

        let error = Args::try_parse_from(["note"]).unwrap_err();
        assert_eq!(error.exit_code(), 2);
        assert!(Args::try_parse_from(["note", "a", "b"]).is_err());
    }
}
