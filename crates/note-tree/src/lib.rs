//! Document tree for note documents.
//!
//! A parsed document is a [`Node`] tree: maps, arrays and string constants.
//! The [`TreeBuilder`] rebuilds that tree from indentation levels: it keeps a
//! stack of open containers keyed by the indentation they were opened at, so
//! a dedent closes every container nested deeper than the new line.

mod builder;
mod sexp;
mod value;

pub use builder::{BuildError, ContainerKind, DEFAULT_MAX_DEPTH, NodeId, TreeBuilder};
pub use value::{Array, Constant, Document, Map, Node, NodeKind};
