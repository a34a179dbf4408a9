//! The wrapper registry: node kind -> typing rule.
//!
//! Rules are registered against kind identifiers. Resolution walks the
//! node kind's lineage in the [`Taxonomy`] (the kind itself, then its
//! fallback kinds, most specific first) and returns the first registered
//! rule. Operator families share one rule instance registered against the
//! family kind, so adding an operator to a family needs no new rule.
//!
//! The registry is populated before first use and then shared read-only;
//! `&WrapperRegistry` is all inference ever needs.

use std::fmt;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;

use multicorn_requests::kind::TaxonomyError;
use multicorn_requests::{Arity, KindId, NodePath, Taxonomy};
use multicorn_types::Ty;

use crate::contexts::Contexts;
use crate::error::TypeError;
use crate::wrapper::Wrapped;

/// A typing rule: computes the return type of a wrapped node.
///
/// Rules are pure functions of the node and the enclosing context stack.
pub trait ReturnTypeRule: fmt::Debug + Send + Sync {
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError>;
}

/// A shared handle to a registered rule.
pub type RuleRef = Arc<dyn ReturnTypeRule>;

/// A rule backed by a closure, for extensions that do not warrant a type.
pub struct FnRule<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnRule({})", self.name)
    }
}

impl<F> ReturnTypeRule for FnRule<F>
where
    F: Fn(&Wrapped<'_>, &Contexts) -> Result<Ty, TypeError> + Send + Sync,
{
    fn return_type(&self, node: &Wrapped<'_>, contexts: &Contexts) -> Result<Ty, TypeError> {
        (self.f)(node, contexts)
    }
}

/// Wrap a closure as a rule.
pub fn rule_fn<F>(name: &'static str, f: F) -> RuleRef
where
    F: Fn(&Wrapped<'_>, &Contexts) -> Result<Ty, TypeError> + Send + Sync + 'static,
{
    Arc::new(FnRule { name, f })
}

/// Maps node kinds to typing rules, with taxonomy-aware fallback.
pub struct WrapperRegistry {
    taxonomy: Taxonomy,
    rules: FxHashMap<KindId, RuleRef>,
}

impl WrapperRegistry {
    /// An empty registry over the given taxonomy.
    pub fn new(taxonomy: Taxonomy) -> Self {
        WrapperRegistry {
            taxonomy,
            rules: FxHashMap::default(),
        }
    }

    /// A registry with the built-in taxonomy and every built-in rule.
    pub fn with_builtins() -> Self {
        Self::with_taxonomy(Taxonomy::builtin())
    }

    /// A registry with every built-in rule over a taxonomy that may already
    /// declare extension kinds.
    pub fn with_taxonomy(taxonomy: Taxonomy) -> Self {
        let mut registry = Self::new(taxonomy);
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    /// The process-wide registry of built-in rules, created on first use.
    pub fn shared() -> &'static WrapperRegistry {
        static SHARED: OnceLock<WrapperRegistry> = OnceLock::new();
        SHARED.get_or_init(WrapperRegistry::with_builtins)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Declare an extension operator kind; see [`Taxonomy::declare`].
    pub fn declare(
        &mut self,
        kind: KindId,
        arity: Arity,
        falls_back_to: impl IntoIterator<Item = KindId>,
    ) -> Result<(), TaxonomyError> {
        self.taxonomy.declare(kind, arity, falls_back_to)
    }

    /// Associate `rule` with `kind`.
    ///
    /// The last registration for a kind wins; the replaced rule is returned.
    pub fn register(&mut self, kind: KindId, rule: RuleRef) -> Option<RuleRef> {
        let previous = self.rules.insert(kind.clone(), rule);
        if let Some(previous) = &previous {
            log::debug!("rule for `{}` overrides {:?}", kind, previous);
        } else {
            log::trace!("registered rule for `{}`", kind);
        }
        previous
    }

    /// Whether `kind` itself has a rule (ignoring fallbacks).
    pub fn is_registered(&self, kind: &str) -> bool {
        self.rules.contains_key(kind)
    }

    /// The rule for `kind`: its own, or that of its nearest registered
    /// ancestor.
    pub fn resolve(&self, kind: &KindId) -> Result<RuleRef, TypeError> {
        self.resolve_at(kind, &NodePath::root())
    }

    pub(crate) fn resolve_at(&self, kind: &KindId, path: &NodePath) -> Result<RuleRef, TypeError> {
        for candidate in self.taxonomy.lineage(kind) {
            if let Some(rule) = self.rules.get(&candidate) {
                if candidate != *kind {
                    log::trace!("`{}` resolved through `{}`", kind, candidate);
                }
                return Ok(Arc::clone(rule));
            }
        }
        Err(TypeError::UnresolvedKind {
            kind: kind.clone(),
            path: path.clone(),
        })
    }
}

impl Default for WrapperRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for WrapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.rules.keys().map(KindId::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("WrapperRegistry")
            .field("rules", &kinds)
            .finish()
    }
}
