//! Labeled ordered trees and APTED preprocessing (spec §3, §4.1 step 1).
//!
//! Trees are stored in a flat arena indexed by [`NodeId`] rather than as a
//! pointer graph: parent back-references are plain indices, never a strong
//! reference, so there is no possibility of a reference cycle between a
//! parent and its children (see spec §9, "Ownership of trees").

use crate::ast::AstNode;

/// Index into a [`LabeledTree`]'s arena. Stable for the lifetime of the tree.
pub type NodeId = usize;

/// A node's label: the AST node kind plus whatever disambiguator it carries.
/// Cost models (see [`crate::apted::cost`]) decide how to weigh differences
/// between two labels' fields; the tree itself is agnostic to cost policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    /// The closed-vocabulary node kind.
    pub kind: crate::ast::AstNodeKind,
    /// Disambiguator: function/class name, identifier name, and so on.
    pub name: Option<String>,
    /// Disambiguator: literal value text.
    pub value: Option<String>,
    /// Disambiguator: operator symbol.
    pub operator: Option<String>,
}

impl Label {
    /// Render the label as a single string for feature hashing (spec §4.3,
    /// "every node label" / k-subtree serialization).
    pub fn as_feature_string(&self) -> String {
        let mut s = format!("{:?}", self.kind);
        if let Some(name) = &self.name {
            s.push(':');
            s.push_str(name);
        }
        if let Some(value) = &self.value {
            s.push('=');
            s.push_str(value);
        }
        if let Some(op) = &self.operator {
            s.push('#');
            s.push_str(op);
        }
        s
    }

    /// True iff the two labels differ only in `name` — the "identifier-only"
    /// distinction the language-aware cost model treats specially.
    pub fn differs_only_by_name(&self, other: &Label) -> bool {
        self.kind == other.kind && self.value == other.value && self.operator == other.operator && self.name != other.name
    }

    /// True iff the two labels differ only in `value` — the "literal-only"
    /// distinction the language-aware cost model treats specially.
    pub fn differs_only_by_value(&self, other: &Label) -> bool {
        self.kind == other.kind && self.name == other.name && self.operator == other.operator && self.value != other.value
    }
}

/// A node in the arena: children, a non-owning parent index, and the three
/// APTED-specific indices populated by [`LabeledTree::preprocess`].
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// This node's label.
    pub label: Label,
    /// Child node ids, in source order.
    pub children: Vec<NodeId>,
    /// Non-owning back-reference to the parent, `None` for the root.
    pub parent: Option<NodeId>,
    /// Post-order position, assigned by [`LabeledTree::preprocess`].
    pub post_order: usize,
    /// Post-order position of this node's left-most leaf descendant.
    pub leftmost_leaf: usize,
    /// True iff this node is a key root (spec §4.1 step 1).
    pub is_key_root: bool,
}

/// An ordered labeled tree, preprocessed for APTED (spec §3 invariants).
#[derive(Debug, Clone)]
pub struct LabeledTree {
    arena: Vec<TreeNode>,
    root: Option<NodeId>,
    /// `post_order_index[p]` is the `NodeId` whose `post_order == p`.
    post_order_index: Vec<NodeId>,
    /// Key roots, in ascending post-order.
    key_roots: Vec<NodeId>,
}

impl LabeledTree {
    /// An empty tree (no nodes). Used for the empty-tree boundary case
    /// (spec §4.1 edge cases, §8 property 4).
    pub fn empty() -> Self {
        Self {
            arena: Vec::new(),
            root: None,
            post_order_index: Vec::new(),
            key_roots: Vec::new(),
        }
    }

    /// True iff the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Total node count.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// The root node id, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.arena[id]
    }

    /// Key roots in ascending post-order (spec §4.1 step 2 enumeration order).
    pub fn key_roots(&self) -> &[NodeId] {
        &self.key_roots
    }

    /// The `NodeId` at a given post-order position.
    pub fn node_at_post_order(&self, post_order: usize) -> NodeId {
        self.post_order_index[post_order]
    }

    /// Build and preprocess a tree from a collaborator-owned AST subtree,
    /// flattening the four ordered child lists (primary, body, orelse,
    /// finalbody, handlers) into one ordered child list per spec §6.
    ///
    /// Recursion is bounded by `max_depth`; nodes beyond that depth are
    /// treated as leaves and not descended into further (spec §4.1 edge
    /// cases, §9 "Recursion").
    pub fn build<T: AstNode>(root: &T, max_depth: usize) -> Self {
        Self::build_with_options(root, max_depth, false)
    }

    /// Like [`Self::build`], additionally dropping a leading docstring-only
    /// statement from the `body()` of any node that can carry one (spec §4.2
    /// "skip docstrings") when `skip_docstrings` is set.
    pub fn build_with_options<T: AstNode>(root: &T, max_depth: usize, skip_docstrings: bool) -> Self {
        let mut arena = Vec::new();
        build_recursive(root, None, 0, max_depth, skip_docstrings, &mut arena);
        let mut tree = Self {
            arena,
            root: Some(0),
            post_order_index: Vec::new(),
            key_roots: Vec::new(),
        };
        tree.preprocess();
        tree
    }

    /// Assign post-order ids, left-most-leaf ids, and key-root flags
    /// (spec §4.1 step 1). Iterative (explicit work stack), so depth is not
    /// bounded by the host's call stack (spec §9 "Recursion").
    fn preprocess(&mut self) {
        let Some(root) = self.root else {
            return;
        };

        // Iterative post-order traversal: an explicit stack of
        // (node, next-child-index) frames, so traversal depth is bounded by
        // heap, not by the host call stack.
        let mut order: Vec<NodeId> = Vec::with_capacity(self.arena.len());
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        while let Some(&(node, child_idx)) = stack.last() {
            let children = &self.arena[node].children;
            if child_idx < children.len() {
                let child = children[child_idx];
                stack.last_mut().unwrap().1 += 1;
                stack.push((child, 0));
            } else {
                order.push(node);
                stack.pop();
            }
        }

        for (post_order, &node_id) in order.iter().enumerate() {
            self.arena[node_id].post_order = post_order;
        }
        self.post_order_index = order.clone();

        // Left-most leaf: a leaf's left-most leaf is itself; an internal
        // node's is its first child's left-most leaf.
        for &node_id in &order {
            let lml = if self.arena[node_id].children.is_empty() {
                self.arena[node_id].post_order
            } else {
                let first_child = self.arena[node_id].children[0];
                self.arena[first_child].leftmost_leaf
            };
            self.arena[node_id].leftmost_leaf = lml;
        }

        // Key roots: a node is a key root iff no node with a *higher*
        // post-order shares its left-most leaf, i.e. it is the last node in
        // its left-most-leaf equivalence class. The root is always a key
        // root, since no node has a higher post-order than it at all.
        let mut last_with_leftmost: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        for &node_id in &order {
            let lml = self.arena[node_id].leftmost_leaf;
            last_with_leftmost.insert(lml, node_id);
        }
        let mut key_roots: Vec<usize> = last_with_leftmost.into_values().collect();
        for &node_id in &key_roots {
            self.arena[node_id].is_key_root = true;
        }
        key_roots.sort_by_key(|&id| self.arena[id].post_order);
        self.key_roots = key_roots;
    }
}

/// True iff `stmt` is a bare string-literal expression statement — the shape
/// a docstring takes once parsed (spec §4.2 "skip docstrings").
fn is_docstring_statement<T: AstNode>(stmt: &T) -> bool {
    stmt.kind() == crate::ast::AstNodeKind::Expression
        && matches!(
            stmt.primary_children().first().map(AstNode::kind),
            Some(crate::ast::AstNodeKind::Constant)
        )
}

fn build_recursive<T: AstNode>(
    node: &T,
    parent: Option<NodeId>,
    depth: usize,
    max_depth: usize,
    skip_docstrings: bool,
    arena: &mut Vec<TreeNode>,
) -> NodeId {
    let label = Label {
        kind: node.kind(),
        name: node.name().map(str::to_string),
        value: node.value().map(str::to_string),
        operator: node.operator().map(str::to_string),
    };

    let id = arena.len();
    arena.push(TreeNode {
        label,
        children: Vec::new(),
        parent,
        post_order: 0,
        leftmost_leaf: 0,
        is_key_root: false,
    });

    if depth >= max_depth {
        // Recursion-depth guard tripped: treat as a leaf (spec §7).
        return id;
    }

    let body = node.body();
    let drop_first_body =
        skip_docstrings && node.kind().can_have_docstring() && body.first().is_some_and(is_docstring_statement);

    let mut child_ids = Vec::new();
    for (group_idx, group) in [node.primary_children(), body, node.orelse(), node.finalbody(), node.handlers()]
        .into_iter()
        .enumerate()
    {
        let is_body_group = group_idx == 1;
        for (child_idx, child) in group.iter().enumerate() {
            if is_body_group && drop_first_body && child_idx == 0 {
                continue;
            }
            child_ids.push(build_recursive(child, Some(id), depth + 1, max_depth, skip_docstrings, arena));
        }
    }
    arena[id].children = child_ids;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNodeKind, SourceSpan};

    /// A minimal in-memory [`AstNode`] implementation for tests.
    #[derive(Debug, Clone)]
    pub struct TestNode {
        pub kind: AstNodeKind,
        pub name: Option<String>,
        pub children: Vec<TestNode>,
    }

    impl TestNode {
        pub fn leaf(kind: AstNodeKind) -> Self {
            Self {
                kind,
                name: None,
                children: Vec::new(),
            }
        }

        pub fn named(kind: AstNodeKind, name: &str) -> Self {
            Self {
                kind,
                name: Some(name.to_string()),
                children: Vec::new(),
            }
        }

        pub fn with_children(mut self, children: Vec<TestNode>) -> Self {
            self.children = children;
            self
        }
    }

    impl AstNode for TestNode {
        fn kind(&self) -> AstNodeKind {
            self.kind
        }
        fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }
        fn value(&self) -> Option<&str> {
            None
        }
        fn operator(&self) -> Option<&str> {
            None
        }
        fn location(&self) -> SourceSpan {
            SourceSpan {
                start_line: 0,
                start_col: 0,
                end_line: 0,
                end_col: 0,
            }
        }
        fn primary_children(&self) -> &[Self] {
            &self.children
        }
        fn body(&self) -> &[Self] {
            &[]
        }
        fn orelse(&self) -> &[Self] {
            &[]
        }
        fn finalbody(&self) -> &[Self] {
            &[]
        }
        fn handlers(&self) -> &[Self] {
            &[]
        }
    }

    fn small_function() -> TestNode {
        TestNode::named(AstNodeKind::Function, "f").with_children(vec![
            TestNode::named(AstNodeKind::Name, "a"),
            TestNode::named(AstNodeKind::Name, "b").with_children(vec![TestNode::leaf(AstNodeKind::Constant)]),
        ])
    }

    #[test]
    fn post_order_is_contiguous_within_subtree() {
        let ast = small_function();
        let tree = LabeledTree::build(&ast, 1_000);
        assert_eq!(tree.len(), 4);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).post_order, 3, "root is visited last");
    }

    #[test]
    fn leftmost_leaf_is_smallest_post_order_in_subtree() {
        let ast = small_function();
        let tree = LabeledTree::build(&ast, 1_000);
        for id in 0..tree.len() {
            let node = tree.node(id);
            assert!(node.leftmost_leaf <= node.post_order);
        }
    }

    #[test]
    fn root_is_always_a_key_root() {
        let ast = small_function();
        let tree = LabeledTree::build(&ast, 1_000);
        let root = tree.root().unwrap();
        assert!(tree.node(root).is_key_root);
    }

    #[test]
    fn key_root_count_bounded_by_leaf_count() {
        let ast = small_function();
        let tree = LabeledTree::build(&ast, 1_000);
        let leaf_count = (0..tree.len())
            .filter(|&id| tree.node(id).children.is_empty())
            .count();
        assert!(tree.key_roots().len() <= leaf_count);
    }

    #[test]
    fn depth_guard_treats_over_deep_subtree_as_leaf() {
        // A chain of 5 nested nodes, but max_depth = 2.
        let mut leaf = TestNode::leaf(AstNodeKind::Expression);
        for _ in 0..5 {
            leaf = TestNode::leaf(AstNodeKind::If).with_children(vec![leaf]);
        }
        let tree = LabeledTree::build(&leaf, 2);
        // Depths 0,1,2 are built (3 nodes); the node at depth 2 is truncated to a leaf.
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = LabeledTree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }
}
