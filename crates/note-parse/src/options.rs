//! Parse options.

/// Options for a parse session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// How many imports may be open at once (default: 32).
    /// Zero forbids imports entirely.
    pub max_import_depth: usize,

    /// Follow `http://` and `https://` imports (default: true)
    pub allow_remote: bool,

    /// Deepest container nesting accepted (default: 256).
    pub max_nesting_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_import_depth: 32,
            allow_remote: true,
            max_nesting_depth: note_tree::DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the import nesting limit.
    pub fn max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    /// Set the container nesting limit.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Refuse remote imports.
    pub fn local_only(mut self) -> Self {
        self.allow_remote = false;
        self
    }

    pub fn allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }
}
