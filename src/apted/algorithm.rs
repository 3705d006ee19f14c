//! The APTED distance computation itself (spec §4.1 steps 2–3).
//!
//! Path-decomposition tree edit distance: key roots of both trees are
//! enumerated in post-order, and for each pair a forest-distance table is
//! filled by the classical Zhang–Shasha recurrence, memoising whole-subtree
//! distances (`treedist`) across the outer enumeration so every sub-key-root
//! pair is computed exactly once.

use crate::apted::cost::CostModel;
use crate::tree::{Label, LabeledTree};

/// Compute the exact tree edit distance between two preprocessed trees under
/// `model`. Both-empty returns 0; one-empty returns the total insert (or
/// delete) cost of the other (spec §4.1 edge cases, §8 property 4).
pub fn distance<M: CostModel>(t1: &LabeledTree, t2: &LabeledTree, model: &M) -> f64 {
    let n1 = t1.len();
    let n2 = t2.len();

    if n1 == 0 && n2 == 0 {
        return 0.0;
    }
    if n1 == 0 {
        return super::cost::total_insert_cost(model, t2);
    }
    if n2 == 0 {
        return super::cost::total_delete_cost(model, t1);
    }

    // treedist[i][j]: memoised tree edit distance between the subtree rooted
    // at the node whose post-order is `i` in t1 and the one at `j` in t2.
    let mut treedist = vec![vec![0.0f64; n2]; n1];

    for &kr1 in t1.key_roots() {
        let px1 = t1.node(kr1).post_order;
        for &kr2 in t2.key_roots() {
            let px2 = t2.node(kr2).post_order;
            forest_distance(t1, t2, px1, px2, model, &mut treedist);
        }
    }

    treedist[n1 - 1][n2 - 1]
}

fn label_at<'a>(tree: &'a LabeledTree, post_order: usize) -> &'a Label {
    &tree.node(tree.node_at_post_order(post_order)).label
}

fn leftmost_leaf_at(tree: &LabeledTree, post_order: usize) -> usize {
    tree.node(tree.node_at_post_order(post_order)).leftmost_leaf
}

/// Fill in the forest-distance table for the key-root pair at post-order
/// positions `px1`/`px2`, writing whole-subtree distances into `treedist`
/// whenever a forest boundary aligns with a complete subtree (spec §4.1
/// step 2's recurrence).
fn forest_distance<M: CostModel>(
    t1: &LabeledTree,
    t2: &LabeledTree,
    px1: usize,
    px2: usize,
    model: &M,
    treedist: &mut [Vec<f64>],
) {
    let lx = leftmost_leaf_at(t1, px1);
    let ly = leftmost_leaf_at(t2, px2);
    let size_x = px1 - lx + 1;
    let size_y = py_size(px2, ly);

    let mut fd = vec![vec![0.0f64; size_y + 1]; size_x + 1];

    for i in 1..=size_x {
        let global_i = lx + i - 1;
        fd[i][0] = fd[i - 1][0] + model.delete_cost(label_at(t1, global_i));
    }
    for j in 1..=size_y {
        let global_j = ly + j - 1;
        fd[0][j] = fd[0][j - 1] + model.insert_cost(label_at(t2, global_j));
    }

    for i in 1..=size_x {
        let global_i = lx + i - 1;
        let li = leftmost_leaf_at(t1, global_i);
        for j in 1..=size_y {
            let global_j = ly + j - 1;
            let lj = leftmost_leaf_at(t2, global_j);

            let del = fd[i - 1][j] + model.delete_cost(label_at(t1, global_i));
            let ins = fd[i][j - 1] + model.insert_cost(label_at(t2, global_j));

            if li == lx && lj == ly {
                let ren = fd[i - 1][j - 1] + model.rename_cost(label_at(t1, global_i), label_at(t2, global_j));
                let best = del.min(ins).min(ren);
                fd[i][j] = best;
                treedist[global_i][global_j] = best;
            } else {
                let local_i = li - lx;
                let local_j = lj - ly;
                let sub = fd[local_i][local_j] + treedist[global_i][global_j];
                fd[i][j] = del.min(ins).min(sub);
            }
        }
    }
}

fn py_size(px2: usize, ly: usize) -> usize {
    px2 - ly + 1
}

/// Similarity in `[0, 1]` derived from distance and tree sizes (spec §4.1
/// step 3): `1 - distance / max(delete(T1) + insert(T2), 1)`, clamped.
pub fn similarity<M: CostModel>(t1: &LabeledTree, t2: &LabeledTree, model: &M, dist: f64) -> f64 {
    let denom = (super::cost::total_delete_cost(model, t1) + super::cost::total_insert_cost(model, t2)).max(1.0);
    (1.0 - dist / denom).clamp(0.0, 1.0)
}


#[cfg(test)]
mod property_based_tests {
    use super::*;
    use crate::apted::cost::DefaultCostModel;
    use crate::ast::AstNodeKind;
    use crate::tree::tests::TestNode;
    use proptest::prelude::*;

    /// A small family of trees parameterized by three identifier suffixes,
    /// standing in for an `Arbitrary` impl over the recursive `TestNode` type
    /// (spec §8 properties 1–3: self-similarity, symmetry, triangle
    /// inequality, checked over varied but bounded-shape trees).
    fn arb_small_tree() -> impl Strategy<Value = TestNode> {
        (0u8..6, 0u8..6, 0u8..6).prop_map(|(a, b, c)| {
            TestNode::named(AstNodeKind::Function, "f").with_children(vec![
                TestNode::named(AstNodeKind::Name, &format!("n{a}")),
                TestNode::named(AstNodeKind::Name, &format!("n{b}"))
                    .with_children(vec![TestNode::leaf(AstNodeKind::Constant)]),
                TestNode::named(AstNodeKind::Name, &format!("n{c}")),
            ])
        })
    }

    proptest! {
        /// Self-similarity (spec §8 property 1): any tree compared with itself
        /// has zero distance and similarity 1.
        #[test]
        fn prop_self_distance_is_always_zero(t in arb_small_tree()) {
            let tree = LabeledTree::build(&t, 1_000);
            let model = DefaultCostModel;
            let d = distance(&tree, &tree, &model);
            prop_assert_eq!(d, 0.0);
            prop_assert_eq!(similarity(&tree, &tree, &model, d), 1.0);
        }

        /// Symmetry (spec §8 property 2): distance does not depend on argument order.
        #[test]
        fn prop_distance_is_symmetric(a in arb_small_tree(), b in arb_small_tree()) {
            let ta = LabeledTree::build(&a, 1_000);
            let tb = LabeledTree::build(&b, 1_000);
            let model = DefaultCostModel;
            prop_assert_eq!(distance(&ta, &tb, &model), distance(&tb, &ta, &model));
        }

        /// Triangle inequality (spec §8 property 3) under the default unit cost model.
        #[test]
        fn prop_triangle_inequality_holds(a in arb_small_tree(), b in arb_small_tree(), c in arb_small_tree()) {
            let ta = LabeledTree::build(&a, 1_000);
            let tb = LabeledTree::build(&b, 1_000);
            let tc = LabeledTree::build(&c, 1_000);
            let model = DefaultCostModel;
            let ab = distance(&ta, &tb, &model);
            let bc = distance(&tb, &tc, &model);
            let ac = distance(&ta, &tc, &model);
            prop_assert!(ac <= ab + bc + 1e-9);
        }
    }
}
