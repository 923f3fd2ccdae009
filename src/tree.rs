//! Hierarchical view over a package's flat part list.
//!
//! A package stores parts under flat slash-delimited names; the tree
//! groups them by path segment so a host can present folder-style
//! navigation. The tree knows nothing about part contents or the store.

use crate::error::{PackageError, Result};
use crate::partname::PartName;
use std::collections::BTreeMap;

/// One segment of the part hierarchy.
///
/// A node is either an actual part (`is_part`) or an intermediate
/// grouping segment synthesized because a deeper part's name passes
/// through it. Children are kept ordered by name so the tree renders
/// deterministically regardless of enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    /// The last path segment ("document.xml")
    name: String,

    /// The full path from the root ("/word/document.xml"; "/" for root)
    full_path: String,

    /// Whether this node corresponds to an actual package part
    is_part: bool,

    /// Child nodes keyed by segment name
    children: BTreeMap<String, PathNode>,
}

impl PathNode {
    fn new(name: &str, full_path: String) -> Self {
        Self {
            name: name.to_string(),
            full_path,
            is_part: false,
            children: BTreeMap::new(),
        }
    }

    /// Get the last path segment of this node.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the full path of this node from the root.
    #[inline]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Whether this node corresponds to an actual package part rather
    /// than an implied grouping segment.
    #[inline]
    pub fn is_part(&self) -> bool {
        self.is_part
    }

    /// Get a child node by segment name.
    #[inline]
    pub fn child(&self, name: &str) -> Option<&PathNode> {
        self.children.get(name)
    }

    /// Iterate over child nodes in name order.
    #[inline]
    pub fn children(&self) -> impl Iterator<Item = &PathNode> {
        self.children.values()
    }

    /// Get the number of child nodes.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// The part hierarchy of one open package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTree {
    root: PathNode,
}

impl PathTree {
    /// Create an empty tree holding only the root node.
    pub fn new() -> Self {
        Self {
            root: PathNode::new("/", "/".to_string()),
        }
    }

    /// Build a tree from a collection of part names, in any order.
    pub fn from_parts<I: IntoIterator<Item = PartName>>(parts: I) -> Self {
        let mut tree = Self::new();
        for part in parts {
            tree.insert(&part);
        }
        tree
    }

    /// Get the root node.
    #[inline]
    pub fn root(&self) -> &PathNode {
        &self.root
    }

    /// Insert a part, synthesizing any missing intermediate nodes.
    ///
    /// Idempotent: re-inserting a part, or inserting a part whose name
    /// was already created as an intermediate node, reuses the existing
    /// nodes and only promotes the final node's part flag.
    pub fn insert(&mut self, part: &PartName) {
        let mut node = &mut self.root;
        for segment in part.segments() {
            let full_path = if node.full_path == "/" {
                format!("/{segment}")
            } else {
                format!("{}/{}", node.full_path, segment)
            };
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| PathNode::new(segment, full_path));
        }
        node.is_part = true;
    }

    /// Resolve a full path to its node by descending through children
    /// keyed by segment name. "/" resolves to the root.
    pub fn find(&self, path: &str) -> Result<&PathNode> {
        if path.is_empty() {
            return Err(PackageError::NodeNotFound(path.to_string()));
        }
        let mut node = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node
                .child(segment)
                .ok_or_else(|| PackageError::NodeNotFound(path.to_string()))?;
        }
        Ok(node)
    }

    /// Detach the node at the given path from its parent, returning it.
    ///
    /// Returns None when the path does not resolve to a node. The root
    /// cannot be removed.
    pub fn remove(&mut self, path: &str) -> Option<PathNode> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (last, ancestors) = segments.split_last()?;
        let mut node = &mut self.root;
        for segment in ancestors {
            node = node.children.get_mut(*segment)?;
        }
        node.children.remove(*last)
    }
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}
