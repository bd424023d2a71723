//! Value types for note documents.
//!
//! Every node is one of three things:
//! - `name: john` puts a `Constant` under the key `name` of a `Map`
//! - `- a` appends a `Constant` to an `Array`
//! - a line with no `:` and no marker is a bare `Constant`
//!
//! Constants are never coerced: `42`, `true` and `~` are all just text.

use std::str::FromStr;

use indexmap::IndexMap;

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `key: value` entries, in insertion order.
    Map(Map),
    /// `- item` elements.
    Array(Array),
    /// A scalar, kept as written.
    Constant(Constant),
}

/// The kind of a node, without its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Map,
    Array,
    Constant,
}

/// An ordered mapping of keys to nodes.
///
/// Writing an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    pub entries: IndexMap<String, Node>,
}

/// An ordered sequence of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Array {
    pub elements: Vec<Node>,
}

/// A scalar leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub value: String,
}

/// A parsed note document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The first node created while parsing (an empty map for empty input).
    pub root: Node,
    /// Path or URI the document was read from.
    pub source_id: String,
}

impl Node {
    /// Create a constant node.
    pub fn constant(value: impl Into<String>) -> Self {
        Node::Constant(Constant::new(value))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Map(_) => NodeKind::Map,
            Node::Array(_) => NodeKind::Array,
            Node::Constant(_) => NodeKind::Constant,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Node::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Node::Constant(constant) => Some(constant),
            _ => None,
        }
    }

    /// Text of a constant node.
    pub fn as_str(&self) -> Option<&str> {
        self.as_constant().map(Constant::as_str)
    }

    /// Look up a descendant by path.
    ///
    /// Paths are map keys joined with `.`, with `[n]` indexing arrays:
    /// `servers[0].host`. The empty path is the node itself.
    pub fn get(&self, path: &str) -> Option<&Node> {
        if path.is_empty() {
            return Some(self);
        }

        let (segment, rest) = split_path(path);
        let child = match segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(index) => self.as_array()?.get(index.parse().ok()?)?,
            None => self.as_map()?.get(segment)?,
        };
        child.get(rest)
    }
}

impl From<Map> for Node {
    fn from(map: Map) -> Self {
        Node::Map(map)
    }
}

impl From<Array> for Node {
    fn from(array: Array) -> Self {
        Node::Array(array)
    }
}

impl From<Constant> for Node {
    fn from(constant: Constant) -> Self {
        Node::Constant(constant)
    }
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.elements.push(node.into());
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.elements.get(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.elements.iter()
    }
}

impl Constant {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Parse the text as `T`. The tree itself never does this.
    pub fn parse<T: FromStr>(&self) -> Result<T, T::Err> {
        self.value.parse()
    }
}

impl Document {
    /// Get a node by path, see [`Node::get`].
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.root.get(path)
    }
}

fn split_path(path: &str) -> (&str, &str) {
    if path.starts_with('[') {
        if let Some(end) = path.find(']') {
            let segment = &path[..=end];
            let rest = &path[end + 1..];
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            return (segment, rest);
        }
    }

    let dot_pos = path.find('.');
    let bracket_pos = path.find('[');

    match (dot_pos, bracket_pos) {
        (Some(d), Some(b)) if b < d => (&path[..b], &path[b..]),
        (Some(d), _) => (&path[..d], &path[d + 1..]),
        (None, Some(b)) => (&path[..b], &path[b..]),
        (None, None) => (path, ""),
    }
}
