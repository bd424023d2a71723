//! `@` directives.

/// A recognized directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `@import <path>`: splice another document in at this position.
    Import { path: String },
}

/// Why a directive body was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    Unknown,
    MalformedImport,
}

impl Directive {
    /// Parse the body of a directive token (the text after `@`).
    pub fn parse(body: &str) -> Result<Self, DirectiveError> {
        let segments: Vec<&str> = body.split_whitespace().collect();
        match segments.as_slice() {
            ["import", path] => Ok(Directive::Import {
                path: (*path).to_string(),
            }),
            ["import", ..] => Err(DirectiveError::MalformedImport),
            _ => Err(DirectiveError::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import() {
        assert_eq!(
            Directive::parse("import other.note"),
            Ok(Directive::Import {
                path: "other.note".into()
            })
        );
        assert_eq!(
            Directive::parse("import   https://example.com/a.note  "),
            Ok(Directive::Import {
                path: "https://example.com/a.note".into()
            })
        );
    }

    #[test]
    fn test_malformed_import() {
        assert_eq!(
            Directive::parse("import"),
            Err(DirectiveError::MalformedImport)
        );
        assert_eq!(
            Directive::parse("import a b"),
            Err(DirectiveError::MalformedImport)
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(Directive::parse("foo"), Err(DirectiveError::Unknown));
        assert_eq!(Directive::parse(""), Err(DirectiveError::Unknown));
        assert_eq!(Directive::parse("imports x"), Err(DirectiveError::Unknown));
    }
}
