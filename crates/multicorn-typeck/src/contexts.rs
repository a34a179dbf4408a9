//! The context stack.
//!
//! Scope-introducing operators (`map`, `groupby`) bind the item type of
//! their subject while typing their operand. The bindings form a stack,
//! innermost first, addressed by depth: depth 1 is the innermost scope.
//!
//! The stack is persistent. Pushing returns a new stack that shares its
//! tail with the old one; nothing is ever popped or mutated, so every
//! recursive call sees exactly the scopes that enclose it.

use std::sync::Arc;

use multicorn_types::Ty;

struct Frame {
    ty: Ty,
    outer: Contexts,
    len: usize,
}

/// An immutable stack of scope types.
#[derive(Clone, Default)]
pub struct Contexts {
    head: Option<Arc<Frame>>,
}

impl Contexts {
    /// The empty stack: no enclosing scopes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack with `ty` as the new innermost scope.
    pub fn push(&self, ty: Ty) -> Contexts {
        Contexts {
            head: Some(Arc::new(Frame {
                ty,
                outer: self.clone(),
                len: self.len() + 1,
            })),
        }
    }

    /// The type bound `depth` scopes out; depth 1 is the innermost.
    ///
    /// Returns `None` for depth 0 and for depths beyond the stack.
    pub fn get(&self, depth: usize) -> Option<&Ty> {
        if depth == 0 {
            return None;
        }
        self.iter().nth(depth - 1)
    }

    /// Number of enclosing scopes.
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |frame| frame.len)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Scope types from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = &Ty> {
        let mut current = self.head.as_deref();
        std::iter::from_fn(move || {
            let frame = current?;
            current = frame.outer.head.as_deref();
            Some(&frame.ty)
        })
    }
}

impl FromIterator<Ty> for Contexts {
    /// Build a stack from types given outermost first.
    fn from_iter<I: IntoIterator<Item = Ty>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Contexts::new(), |contexts, ty| contexts.push(ty))
    }
}

impl std::fmt::Debug for Contexts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
