//! S-expression dump of a tree, for inspecting parse results.

use std::fmt::Write;

use crate::value::Node;

impl Node {
    /// Render the tree as an s-expression.
    ///
    /// ```text
    /// (map
    ///   "a" (array
    ///     "1"
    ///     "2")
    ///   "b" "x")
    /// ```
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(self, 0, &mut out);
        out
    }
}

fn write_sexp(node: &Node, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth + 1);
    match node {
        Node::Constant(constant) => {
            let _ = write!(out, "{:?}", constant.value);
        }
        Node::Array(array) => {
            out.push_str("(array");
            for element in array.iter() {
                out.push('\n');
                out.push_str(&pad);
                write_sexp(element, depth + 1, out);
            }
            out.push(')');
        }
        Node::Map(map) => {
            out.push_str("(map");
            for (key, value) in map.iter() {
                let _ = write!(out, "\n{pad}{key:?} ");
                write_sexp(value, depth + 1, out);
            }
            out.push(')');
        }
    }
}
