//! Node addressing within a request tree.

use std::fmt;
use std::str::FromStr;

/// The position of a node relative to the root of the tree it was reached
/// from: the child index taken at each step.
///
/// Children are numbered in a fixed order: list and tuple items by
/// position, record fields by name order, and for operations the subject
/// first (`0`) followed by the operands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> NodePath {
        NodePath(Vec::new())
    }

    /// The path of this node's `index`-th child.
    pub fn child(&self, index: usize) -> NodePath {
        let mut steps = self.0.clone();
        steps.push(index);
        NodePath(steps)
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The path of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        let (_, rest) = self.0.split_last()?;
        Some(NodePath(rest.to_vec()))
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(steps: Vec<usize>) -> NodePath {
        NodePath(steps)
    }
}

/// A path that is not of the form `$` or `$.i.j...`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsePathError(String);

impl fmt::Display for ParsePathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid node path `{}`: expected `$` or `$.i.j...`", self.0)
    }
}

impl std::error::Error for ParsePathError {}

impl FromStr for NodePath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<NodePath, ParsePathError> {
        let err = || ParsePathError(s.to_string());
        let rest = s.trim().strip_prefix('$').ok_or_else(err)?;
        if rest.is_empty() {
            return Ok(NodePath::root());
        }
        rest.strip_prefix('.')
            .ok_or_else(err)?
            .split('.')
            .map(|step| step.parse::<usize>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()
            .map(NodePath)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.0 {
            write!(f, ".{}", step)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_and_parent() {
        let path = NodePath::root().child(0).child(2);
        assert_eq!(path.steps(), &[0, 2]);
        assert_eq!(path.to_string(), "$.0.2");
        assert_eq!(path.parent(), Some(NodePath::root().child(0)));
        assert!(NodePath::root().is_root());
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(NodePath::root().to_string(), "$");
        assert!(path.starts_with(&NodePath::root().child(0)));
        assert!(path.starts_with(&path));
        assert!(!path.starts_with(&NodePath::root().child(1)));
    }

    #[test]
    fn parse() {
        assert_eq!("$".parse::<NodePath>(), Ok(NodePath::root()));
        assert_eq!("$.1.0".parse::<NodePath>(), Ok(NodePath::from(vec![1, 0])));
        assert!("1.0".parse::<NodePath>().is_err());
        assert!("$.".parse::<NodePath>().is_err());
        assert!("$.a".parse::<NodePath>().is_err());
        assert!("$1".parse::<NodePath>().is_err());
    }
}
