//! Tree-edit-distance engine (spec §4.1): the dominant cost in the pipeline
//! and the only source of ground-truth similarity between two fragments.

pub mod algorithm;
pub mod cost;

use serde::{Deserialize, Serialize};

use crate::config::TypeThresholds;
use crate::tree::LabeledTree;
use cost::CostModel;

/// The four-tier clone classification a pair's similarity resolves to
/// (spec §4.1, "Clone-type classification").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneType {
    /// Identical modulo whitespace/formatting (`similarity >= tau1`).
    Type1,
    /// Identical modulo renamed identifiers/literals (`similarity >= tau2`).
    Type2,
    /// Near-miss with minor structural edits (`similarity >= tau3`).
    Type3,
    /// Semantic clone: same behavior, different structure (`similarity >= tau4`).
    Type4,
}

/// The result of comparing two fragments: distance, similarity, and
/// (if any threshold was cleared) clone-type classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Raw APTED edit distance.
    pub distance: f64,
    /// Normalized similarity in `[0, 1]`.
    pub similarity: f64,
    /// Clone-type classification, if `similarity` cleared `tau4`.
    pub clone_type: Option<CloneType>,
}

/// Compare two trees under `model`, returning distance, similarity, and
/// clone-type classification in one pass (spec §4.1 steps 2–4).
pub fn compare<M: CostModel>(
    t1: &LabeledTree,
    t2: &LabeledTree,
    model: &M,
    thresholds: &TypeThresholds,
) -> ComparisonResult {
    let distance = algorithm::distance(t1, t2, model);
    let similarity = algorithm::similarity(t1, t2, model, distance);
    let clone_type = classify_clone_type(similarity, thresholds);
    ComparisonResult {
        distance,
        similarity,
        clone_type,
    }
}

/// Map a similarity score onto the highest clone-type tier it clears, or
/// `None` if it falls below `tau4` (spec §4.1, "Clone-type classification").
pub fn classify_clone_type(similarity: f64, thresholds: &TypeThresholds) -> Option<CloneType> {
    if similarity >= thresholds.tau1 {
        Some(CloneType::Type1)
    } else if similarity >= thresholds.tau2 {
        Some(CloneType::Type2)
    } else if similarity >= thresholds.tau3 {
        Some(CloneType::Type3)
    } else if similarity >= thresholds.tau4 {
        Some(CloneType::Type4)
    } else {
        None
    }
}
