//! Inference entry points.
//!
//! Inference is a pure recursive walk: wrap the tree once, then ask the
//! root (or any wrapped node) for its type under a context stack. Nothing
//! is mutated, so independent calls may run on any number of threads
//! against the same registry.

use multicorn_requests::{NodePath, Request};
use multicorn_types::Ty;

use crate::contexts::Contexts;
use crate::error::TypeError;
use crate::registry::WrapperRegistry;
use crate::wrapper::{Operands, Wrapped};

/// The outcome of typing a batch of requests.
///
/// `types[i]` is the type of the `i`-th request, `None` if it failed;
/// `errors` holds the failure of each failed request with its index.
#[derive(Debug, Default)]
pub struct TypeckResult {
    pub types: Vec<Option<Ty>>,
    pub errors: Vec<(usize, TypeError)>,
}

impl TypeckResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl WrapperRegistry {
    /// The type of `request` with no enclosing scopes.
    pub fn infer(&self, request: &Request) -> Result<Ty, TypeError> {
        self.infer_in(request, &Contexts::new())
    }

    /// The type of `request` evaluated inside the given scopes.
    pub fn infer_in(&self, request: &Request, contexts: &Contexts) -> Result<Ty, TypeError> {
        self.wrap(request)?.return_type(contexts)
    }

    /// The type of the node at `path` within `request`.
    ///
    /// The node is typed under the scopes its ancestors introduce: the
    /// operand of `map`, the key of `groupby`, the predicate of `filter` and
    /// the keys of `sort` see the subject's item type as the innermost
    /// scope. Returns `Ok(None)` if no node sits at `path`.
    pub fn infer_at(&self, request: &Request, path: &NodePath) -> Result<Option<Ty>, TypeError> {
        let root = self.wrap(request)?;
        let mut node = &root;
        let mut contexts = Contexts::new();
        while node.path() != path {
            let Some(child) = node
                .children()
                .into_iter()
                .find(|child| path.starts_with(child.path()))
            else {
                return Ok(None);
            };
            if introduces_scope(node, child) {
                let subject = node.expect_subject()?.return_type(&contexts)?;
                let scope = subject.inner_type().cloned().unwrap_or_else(Ty::unknown);
                contexts = contexts.push(scope);
            }
            node = child;
        }
        node.return_type(&contexts).map(Some)
    }

    /// Type every request, collecting every failure instead of stopping at
    /// the first.
    pub fn check_all<'a>(&self, requests: impl IntoIterator<Item = &'a Request>) -> TypeckResult {
        let mut result = TypeckResult::default();
        for (index, request) in requests.into_iter().enumerate() {
            match self.infer(request) {
                Ok(ty) => result.types.push(Some(ty)),
                Err(err) => {
                    log::debug!("request {} failed at {}: {}", index, err.path(), err);
                    result.types.push(None);
                    result.errors.push((index, err));
                }
            }
        }
        result
    }
}

/// Whether `child` of `node` is evaluated with the subject's item bound.
fn introduces_scope<'r>(node: &Wrapped<'r>, child: &Wrapped<'r>) -> bool {
    match node.operands() {
        Some(Operands::Map { operation: w })
        | Some(Operands::Groupby { key: w })
        | Some(Operands::Filter { predicate: w }) => std::ptr::eq(&**w, child),
        Some(Operands::Sort { keys }) => keys.iter().any(|k| std::ptr::eq(k.node(), child)),
        _ => false,
    }
}

/// The type of `request` using the shared built-in registry.
pub fn infer(request: &Request) -> Result<Ty, TypeError> {
    WrapperRegistry::shared().infer(request)
}

/// The type of `request` inside `contexts` using the shared built-in
/// registry.
pub fn infer_in(request: &Request, contexts: &Contexts) -> Result<Ty, TypeError> {
    WrapperRegistry::shared().infer_in(request, contexts)
}
