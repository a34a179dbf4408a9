//! S-expression printer for request trees.
//!
//! Renders a request on one line, e.g.
//! `(map (stored_items people) (attribute (context 1) "age"))`, and records
//! the byte range every node occupies in the output so diagnostics can point
//! at a node by its [`NodePath`].

use std::fmt;
use std::ops::Range;

use rustc_hash::FxHashMap;

use crate::path::NodePath;
use crate::request::Request;

/// A printed request together with the span of every node.
#[derive(Clone, Debug)]
pub struct Printed {
    pub text: String,
    spans: FxHashMap<NodePath, Range<usize>>,
}

impl Printed {
    /// The byte range of the node at `path`.
    pub fn span(&self, path: &NodePath) -> Option<Range<usize>> {
        self.spans.get(path).cloned()
    }
}

/// Print a request, recording node spans.
pub fn print(request: &Request) -> Printed {
    let mut printer = Printer {
        out: String::new(),
        spans: FxHashMap::default(),
    };
    printer.node(request, NodePath::root());
    Printed {
        text: printer.out,
        spans: printer.spans,
    }
}

struct Printer {
    out: String,
    spans: FxHashMap<NodePath, Range<usize>>,
}

impl Printer {
    fn node(&mut self, request: &Request, path: NodePath) {
        let start = self.out.len();
        match request {
            Request::Literal(value) => self.out.push_str(&value.to_string()),
            Request::List(items) => {
                self.out.push('[');
                self.items(items.iter(), &path, ", ");
                self.out.push(']');
            }
            Request::Tuple(items) => {
                self.out.push_str("(tuple");
                if !items.is_empty() {
                    self.out.push(' ');
                }
                self.items(items.iter(), &path, " ");
                self.out.push(')');
            }
            Request::Record(fields) => {
                self.out.push('{');
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(name);
                    self.out.push_str(": ");
                    self.node(value, path.child(i));
                }
                self.out.push('}');
            }
            Request::Context { scope_depth } => {
                self.out.push_str(&format!("(context {})", scope_depth));
            }
            Request::StoredItems(storage) => {
                self.out.push_str(&format!("(stored_items {})", storage.name));
            }
            Request::Operation(op) => {
                self.out.push('(');
                self.out.push_str(&op.operator.to_string());
                self.out.push(' ');
                let children = std::iter::once(op.subject.as_ref()).chain(op.operands.iter());
                self.items(children, &path, " ");
                self.out.push(')');
            }
        }
        self.spans.insert(path, start..self.out.len());
    }

    fn items<'r>(&mut self, items: impl Iterator<Item = &'r Request>, path: &NodePath, sep: &str) {
        for (i, item) in items.enumerate() {
            if i > 0 {
                self.out.push_str(sep);
            }
            self.node(item, path.child(i));
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print(self).text)
    }
}
