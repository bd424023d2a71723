//! Tree builder driven by indentation levels.
//!
//! Containers live in an arena while the document is being built; the frame
//! stack and the pending map key refer to them by [`NodeId`]. `finish` moves
//! everything into an owned [`Node`] tree.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::value::{Array, Constant, Document, Map, Node};

/// Index of a container in the builder's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The two kinds of node that can hold children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Map,
    Array,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Map => write!(f, "map"),
            ContainerKind::Array => write!(f, "array"),
        }
    }
}

/// Error during tree building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A container of the other kind is already open at this indentation.
    IndentationTypeConflict {
        level: usize,
        expected: ContainerKind,
        found: ContainerKind,
    },
    /// A value was added to a map with no key waiting for it.
    MissingKey,
    /// A second top-level constant.
    UnexpectedRootConstant(String),
    /// Content shallower than every open container, after the root exists.
    DetachedContent { level: usize },
    /// A container would nest deeper than the builder allows.
    NestingTooDeep { limit: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::IndentationTypeConflict {
                level,
                expected,
                found,
            } => write!(
                f,
                "indentation {level} is already open as {found}, cannot continue it as {expected}"
            ),
            BuildError::MissingKey => write!(f, "map value has no key"),
            BuildError::UnexpectedRootConstant(value) => {
                write!(f, "unexpected top-level constant {value:?}")
            }
            BuildError::DetachedContent { level } => {
                write!(f, "content at indentation {level} is outside the document root")
            }
            BuildError::NestingTooDeep { limit } => {
                write!(f, "containers nest deeper than the limit of {limit}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// A child slot: either an arena container or an inline constant.
#[derive(Debug)]
enum Child {
    Container(NodeId),
    Constant(String),
}

#[derive(Debug)]
enum Container {
    Map(IndexMap<String, Child>),
    Array(Vec<Child>),
}

impl Container {
    fn kind(&self) -> ContainerKind {
        match self {
            Container::Map(_) => ContainerKind::Map,
            Container::Array(_) => ContainerKind::Array,
        }
    }
}

/// An open container and the indentation it was opened at.
#[derive(Debug, Clone, Copy)]
struct Frame {
    indentation: usize,
    container: NodeId,
}

/// A key whose value has not arrived yet.
#[derive(Debug)]
struct PendingKey {
    map: NodeId,
    key: String,
}

/// Deepest container nesting a builder accepts unless told otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Builder that constructs a tree from indentation-tagged structure.
#[derive(Debug)]
pub struct TreeBuilder {
    arena: Vec<Container>,
    /// Nesting depth of each arena container, the root being 1.
    depths: Vec<usize>,
    max_depth: usize,
    /// Open containers, indentation strictly increasing towards the top.
    frames: Vec<Frame>,
    root: Option<Child>,
    /// Container that receives the next value.
    active: Option<NodeId>,
    pending_key: Option<PendingKey>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl TreeBuilder {
    /// Create a new tree builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder that refuses containers nested deeper than
    /// `max_depth`.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            arena: Vec::new(),
            depths: Vec::new(),
            max_depth,
            frames: Vec::new(),
            root: None,
            active: None,
            pending_key: None,
        }
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Indentation levels of the open containers, outermost first.
    pub fn levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.iter().map(|frame| frame.indentation)
    }

    /// Resolve the container of `kind` for content at indentation `level`,
    /// creating it if needed. It becomes the active container.
    pub fn open(&mut self, kind: ContainerKind, level: usize) -> Result<NodeId, BuildError> {
        while let Some(frame) = self.frames.last() {
            if frame.indentation <= level {
                break;
            }
            trace!("Closing frame at indentation {}", frame.indentation);
            self.frames.pop();
        }

        if let Some(top) = self.frames.last().copied() {
            if top.indentation == level {
                let found = self.arena[top.container.index()].kind();
                if found != kind {
                    return Err(BuildError::IndentationTypeConflict {
                        level,
                        expected: kind,
                        found,
                    });
                }
                self.flush_pending_key();
                self.active = Some(top.container);
                return Ok(top.container);
            }
        }

        if self.frames.is_empty() && self.root.is_some() {
            return Err(BuildError::DetachedContent { level });
        }

        let parent = self.active.filter(|_| !self.frames.is_empty());
        let depth = parent.map_or(0, |parent| self.depths[parent.index()]) + 1;
        if depth > self.max_depth {
            return Err(BuildError::NestingTooDeep {
                limit: self.max_depth,
            });
        }

        let id = NodeId::new(self.arena.len());
        self.arena.push(match kind {
            ContainerKind::Map => Container::Map(IndexMap::new()),
            ContainerKind::Array => Container::Array(Vec::new()),
        });
        self.depths.push(depth);

        match parent {
            Some(parent) => self.attach(parent, Child::Container(id))?,
            None => self.root = Some(Child::Container(id)),
        }

        debug!("Opened {} at indentation {}", kind, level);
        self.frames.push(Frame {
            indentation: level,
            container: id,
        });
        self.active = Some(id);
        Ok(id)
    }

    /// Open (or reuse) the map at `level` and wait for the value of `key`.
    pub fn key(&mut self, level: usize, key: impl Into<String>) -> Result<(), BuildError> {
        self.open(ContainerKind::Map, level)?;
        self.set_key(key)
    }

    /// Make `key` wait for the next value of the active map. A key already
    /// waiting there gets an empty value.
    ///
    /// Fails with [`BuildError::MissingKey`] when the active container is not
    /// a map, since the key would have nowhere to go.
    pub fn set_key(&mut self, key: impl Into<String>) -> Result<(), BuildError> {
        let map = self
            .active
            .filter(|id| matches!(self.arena[id.index()], Container::Map(_)))
            .ok_or(BuildError::MissingKey)?;
        self.flush_pending_key();
        self.pending_key = Some(PendingKey {
            map,
            key: key.into(),
        });
        Ok(())
    }

    /// Add a constant to the active container.
    ///
    /// With nothing open yet, the constant becomes the whole document.
    pub fn constant(&mut self, value: impl Into<String>) -> Result<(), BuildError> {
        let value = value.into();
        match self.active {
            Some(parent) => self.attach(parent, Child::Constant(value)),
            None if self.root.is_none() => {
                self.root = Some(Child::Constant(value));
                Ok(())
            }
            None => Err(BuildError::UnexpectedRootConstant(value)),
        }
    }

    /// Finish building and return the document.
    pub fn finish(mut self, source_id: impl Into<String>) -> Document {
        self.flush_pending_key();
        let root = match self.root.take() {
            Some(child) => self.materialize(child),
            None => Node::Map(Map::new()),
        };
        Document {
            root,
            source_id: source_id.into(),
        }
    }

    fn attach(&mut self, parent: NodeId, child: Child) -> Result<(), BuildError> {
        match &mut self.arena[parent.index()] {
            Container::Array(elements) => elements.push(child),
            Container::Map(entries) => {
                let pending = self
                    .pending_key
                    .take()
                    .filter(|pending| pending.map == parent)
                    .ok_or(BuildError::MissingKey)?;
                entries.insert(pending.key, child);
            }
        }
        Ok(())
    }

    /// A key that never got a value holds an empty constant.
    fn flush_pending_key(&mut self) {
        if let Some(pending) = self.pending_key.take() {
            trace!("Key {:?} has no value", pending.key);
            if let Container::Map(entries) = &mut self.arena[pending.map.index()] {
                entries.insert(pending.key, Child::Constant(String::new()));
            }
        }
    }

    fn materialize(&mut self, child: Child) -> Node {
        let id = match child {
            Child::Constant(value) => return Node::Constant(Constant::new(value)),
            Child::Container(id) => id,
        };
        let container = std::mem::replace(&mut self.arena[id.index()], Container::Array(Vec::new()));
        match container {
            Container::Map(entries) => Node::Map(Map {
                entries: entries
                    .into_iter()
                    .map(|(key, child)| (key, self.materialize(child)))
                    .collect(),
            }),
            Container::Array(elements) => Node::Array(Array {
                elements: elements
                    .into_iter()
                    .map(|child| self.materialize(child))
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_root() {
        let mut builder = TreeBuilder::new();
        builder.constant("hello").unwrap();
        let doc = builder.finish("t");
        assert_eq!(doc.root, Node::constant("hello"));
    }

    #[test]
    fn test_second_root_constant() {
        let mut builder = TreeBuilder::new();
        builder.constant("hello").unwrap();
        assert_eq!(
            builder.constant("world"),
            Err(BuildError::UnexpectedRootConstant("world".into()))
        );
    }

    #[test]
    fn test_frames_pop_on_dedent() {
        let mut builder = TreeBuilder::new();
        builder.key(0, "a").unwrap();
        builder.key(2, "b").unwrap();
        builder.key(4, "c").unwrap();
        assert_eq!(builder.levels().collect::<Vec<_>>(), vec![0, 2, 4]);

        builder.key(2, "d").unwrap();
        assert_eq!(builder.levels().collect::<Vec<_>>(), vec![0, 2]);
        builder.key(0, "e").unwrap();
        assert_eq!(builder.depth(), 1);
    }

    #[test]
    fn test_same_level_reuses_frame() {
        let mut builder = TreeBuilder::new();
        let first = builder.open(ContainerKind::Array, 0).unwrap();
        builder.constant("a").unwrap();
        let second = builder.open(ContainerKind::Array, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_type_conflict() {
        let mut builder = TreeBuilder::new();
        builder.open(ContainerKind::Array, 0).unwrap();
        assert_eq!(
            builder.key(0, "a"),
            Err(BuildError::IndentationTypeConflict {
                level: 0,
                expected: ContainerKind::Map,
                found: ContainerKind::Array,
            })
        );
    }

    #[test]
    fn test_value_without_key() {
        let mut builder = TreeBuilder::new();
        builder.key(0, "a").unwrap();
        builder.constant("1").unwrap();
        assert_eq!(builder.constant("2"), Err(BuildError::MissingKey));
    }

    #[test]
    fn test_detached_content() {
        let mut builder = TreeBuilder::new();
        builder.key(2, "a").unwrap();
        builder.constant("1").unwrap();
        assert_eq!(
            builder.key(0, "b"),
            Err(BuildError::DetachedContent { level: 0 })
        );
    }

    #[test]
    fn test_set_key_replaces_waiting_key() {
        let mut builder = TreeBuilder::new();
        builder.open(ContainerKind::Map, 0).unwrap();
        builder.set_key("a").unwrap();
        builder.set_key("b").unwrap();
        builder.constant("1").unwrap();
        let doc = builder.finish("t");
        let map = doc.root.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&Node::constant("")));
        assert_eq!(map.get("b"), Some(&Node::constant("1")));
    }

    #[test]
    fn test_set_key_needs_an_open_map() {
        let mut builder = TreeBuilder::new();
        assert_eq!(builder.set_key("a"), Err(BuildError::MissingKey));

        builder.open(ContainerKind::Array, 0).unwrap();
        assert_eq!(builder.set_key("a"), Err(BuildError::MissingKey));
        builder.constant("x").unwrap();
        let doc = builder.finish("t");
        let array = doc.root.as_array().unwrap();
        assert_eq!(array.iter().collect::<Vec<_>>(), vec![&Node::constant("x")]);
    }

    #[test]
    fn test_nesting_limit() {
        let mut builder = TreeBuilder::with_max_depth(3);
        builder.open(ContainerKind::Array, 0).unwrap();
        builder.open(ContainerKind::Array, 2).unwrap();
        builder.open(ContainerKind::Array, 4).unwrap();
        assert_eq!(
            builder.open(ContainerKind::Array, 6),
            Err(BuildError::NestingTooDeep { limit: 3 })
        );
    }

    #[test]
    fn test_nesting_limit_counts_containers_under_closed_frames() {
        // `c` dedents past `b`'s map but still nests inside it
        let mut builder = TreeBuilder::with_max_depth(2);
        builder.key(0, "a").unwrap();
        builder.key(4, "b").unwrap();
        assert_eq!(
            builder.key(2, "c"),
            Err(BuildError::NestingTooDeep { limit: 2 })
        );
    }

    #[test]
    fn test_conflict_message() {
        let error = BuildError::IndentationTypeConflict {
            level: 2,
            expected: ContainerKind::Map,
            found: ContainerKind::Array,
        };
        assert_eq!(
            error.to_string(),
            "indentation 2 is already open as array, cannot continue it as map"
        );
    }
}
