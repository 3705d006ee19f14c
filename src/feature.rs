//! Feature extraction for locality-sensitive hashing (spec §4.3).
//!
//! Pure and deterministic given the same fragment and [`DetectionConfig`]:
//! every node label, every bounded-height k-subtree, and every pre-order
//! label k-gram are folded into a single feature bag that [`crate::minhash`]
//! reduces to a fixed-width signature.

use std::collections::{HashMap, HashSet};

use crate::ast::AstNodeKind;
use crate::config::DetectionConfig;
use crate::tree::{LabeledTree, NodeId};

/// A fragment's feature bag as a plain set (spec §4.3 default path).
pub type FeatureSet = HashSet<String>;

/// A fragment's feature bag with occurrence weights (SPEC_FULL.md §B.3,
/// consumed by [`crate::minhash::WeightedMinHash`]).
pub type WeightedFeatureSet = HashMap<String, f64>;

/// Extract the unweighted feature set for `tree` (spec §4.3).
///
/// Returns an empty set for an empty tree; [`crate::minhash`] maps that to
/// the all-maximum signature per spec.
pub fn extract_features(tree: &LabeledTree, config: &DetectionConfig) -> FeatureSet {
    let mut features = FeatureSet::new();
    populate(tree, config, &mut features, None);
    features
}

/// Extract the occurrence-weighted feature bag for `tree` (SPEC_FULL.md §B.3).
pub fn extract_weighted_features(tree: &LabeledTree, config: &DetectionConfig) -> WeightedFeatureSet {
    let mut weighted = WeightedFeatureSet::new();
    populate(tree, config, &mut FeatureSet::new(), Some(&mut weighted));
    weighted
}

fn add_feature(feature: String, plain: &mut FeatureSet, weighted: Option<&mut WeightedFeatureSet>) {
    match weighted {
        Some(w) => *w.entry(feature).or_insert(0.0) += 1.0,
        None => {
            plain.insert(feature);
        }
    }
}

fn populate(
    tree: &LabeledTree,
    config: &DetectionConfig,
    plain: &mut FeatureSet,
    mut weighted: Option<&mut WeightedFeatureSet>,
) {
    let Some(root) = tree.root() else {
        return;
    };

    for id in postorder_ids(tree, root) {
        let node = tree.node(id);
        let label_feature = node.label.as_feature_string();
        let serialized = serialize_subtree(tree, id, config.max_subtree_height);

        add_feature(label_feature, plain, weighted.as_deref_mut());
        add_feature(serialized, plain, weighted.as_deref_mut());

        if config.include_literal_features {
            if let Some(value) = &node.label.value {
                add_feature(format!("literal:{value}"), plain, weighted.as_deref_mut());
            }
            if let Some(token) = structural_token(node.label.kind) {
                add_feature(format!("token:{token}"), plain, weighted.as_deref_mut());
            }
        }
    }

    // Pre-order label k-grams over the whole fragment.
    let preorder_labels = preorder_label_strings(tree, root);
    let k = config.kgram_length;
    if preorder_labels.len() >= k {
        for window in preorder_labels.windows(k) {
            let gram = window.join(">");
            add_feature(format!("kgram:{gram}"), plain, weighted.as_deref_mut());
        }
    }
}

/// Serialize the subtree rooted at `id`, truncated at `max_height` levels of
/// nesting, as a parenthesised label string (spec §4.3). Depth `0` yields
/// just the node's own label.
fn serialize_subtree(tree: &LabeledTree, id: NodeId, max_height: usize) -> String {
    let node = tree.node(id);
    let own_label = node.label.as_feature_string();
    if max_height == 0 || node.children.is_empty() {
        return own_label;
    }
    let mut s = String::with_capacity(own_label.len() + 2);
    s.push('(');
    s.push_str(&own_label);
    for &child in &node.children {
        s.push(' ');
        s.push_str(&serialize_subtree(tree, child, max_height - 1));
    }
    s.push(')');
    s
}

fn postorder_ids(tree: &LabeledTree, root: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    while let Some(&(node, idx)) = stack.last() {
        let children = &tree.node(node).children;
        if idx < children.len() {
            let child = children[idx];
            stack.last_mut().unwrap().1 += 1;
            stack.push((child, 0));
        } else {
            order.push(node);
            stack.pop();
        }
    }
    order
}

fn preorder_label_strings(tree: &LabeledTree, root: NodeId) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    // A plain stack visits children right-to-left; reverse-push to restore
    // left-to-right pre-order.
    let mut ordered = Vec::new();
    while let Some(node) = stack.pop() {
        ordered.push(node);
        for &child in tree.node(node).children.iter().rev() {
            stack.push(child);
        }
    }
    for id in ordered {
        out.push(tree.node(id).label.as_feature_string());
    }
    out
}

/// Branch/loop structural tokens (spec §4.3, "structural tokens").
fn structural_token(kind: AstNodeKind) -> Option<&'static str> {
    match kind {
        AstNodeKind::If | AstNodeKind::Try => Some("branch"),
        AstNodeKind::For | AstNodeKind::AsyncFor | AstNodeKind::While => Some("loop"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNodeKind;
    use crate::tree::tests::TestNode;

    fn sample_tree() -> LabeledTree {
        let ast = TestNode::named(AstNodeKind::Function, "f").with_children(vec![
            TestNode::named(AstNodeKind::Name, "a"),
            TestNode::named(AstNodeKind::Name, "b").with_children(vec![TestNode::leaf(AstNodeKind::Constant)]),
        ]);
        LabeledTree::build(&ast, 1_000)
    }

    #[test]
    fn empty_tree_yields_empty_feature_set() {
        let tree = LabeledTree::empty();
        let config = DetectionConfig::default();
        assert!(extract_features(&tree, &config).is_empty());
    }

    #[test]
    fn feature_set_contains_every_node_label() {
        let tree = sample_tree();
        let config = DetectionConfig::default();
        let features = extract_features(&tree, &config);
        for id in 0..tree.len() {
            let label = tree.node(id).label.as_feature_string();
            assert!(features.contains(&label), "missing label feature: {label}");
        }
    }

    #[test]
    fn feature_set_contains_kgrams_when_long_enough() {
        let tree = sample_tree();
        let mut config = DetectionConfig::default();
        config.kgram_length = 2;
        let features = extract_features(&tree, &config);
        assert!(features.iter().any(|f| f.starts_with("kgram:")));
    }

    #[test]
    fn extraction_is_deterministic() {
        let tree = sample_tree();
        let config = DetectionConfig::default();
        let a = extract_features(&tree, &config);
        let b = extract_features(&tree, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn weighted_features_count_repeated_kgrams() {
        let ast = TestNode::named(AstNodeKind::Function, "f").with_children(vec![
            TestNode::named(AstNodeKind::Name, "x"),
            TestNode::named(AstNodeKind::Name, "x"),
            TestNode::named(AstNodeKind::Name, "x"),
        ]);
        let tree = LabeledTree::build(&ast, 1_000);
        let config = DetectionConfig::default();
        let weighted = extract_weighted_features(&tree, &config);
        let name_label = tree.node(tree.node(tree.root().unwrap()).children[0]).label.as_feature_string();
        assert_eq!(weighted.get(&name_label), Some(&3.0));
    }
}
