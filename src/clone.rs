//! Clone pairs and clone groups (spec §3): the data model shared by the
//! orchestrator ([`crate::pipeline`]) and the grouping strategies
//! ([`crate::grouping`]).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::apted::CloneType;
use crate::fragment::SourceLocation;

/// Which candidate-generation path produced a pair (SPEC_FULL.md §B.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairSource {
    /// Found via exhaustive pairwise enumeration (spec §4.5).
    Exhaustive,
    /// Found via the LSH candidate path (spec §4.5).
    Lsh,
}

/// Two fragments found similar enough to retain, plus the APTED verdict
/// that justified it (spec §3 "Clone pair").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonePair {
    /// First fragment's id (within the detection run that produced this pair).
    pub fragment_a_id: usize,
    /// Second fragment's id.
    pub fragment_b_id: usize,
    /// First fragment's source location.
    pub location_a: SourceLocation,
    /// Second fragment's source location.
    pub location_b: SourceLocation,
    /// First fragment's node count (SPEC_FULL.md §B.2).
    pub size_a: usize,
    /// Second fragment's node count.
    pub size_b: usize,
    /// APTED edit distance between the two fragments.
    pub distance: f64,
    /// Normalized similarity in `[0, 1]`.
    pub similarity: f64,
    /// Clone-type classification.
    pub clone_type: CloneType,
    /// Confidence in `[0, 1]` (spec §4.5 step 4).
    pub confidence: f64,
    /// Name of the cost model used for this comparison (SPEC_FULL.md §B.2).
    pub cost_model_name: &'static str,
    /// Which candidate-generation path produced this pair.
    pub source: PairSource,
}

impl ClonePair {
    /// Deterministic ordering key used for stable tie-breaking when
    /// similarities are equal: by first fragment's location, then second's
    /// (spec §4.6 "Ties").
    fn tie_break_key(&self) -> (&SourceLocation, &SourceLocation) {
        if self.location_a <= self.location_b {
            (&self.location_a, &self.location_b)
        } else {
            (&self.location_b, &self.location_a)
        }
    }

    /// Compare two pairs by descending similarity, breaking ties
    /// deterministically by source location (spec §4.5 step 6, §8 property 9).
    pub fn ranking_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.tie_break_key().cmp(&other.tie_break_key()))
    }
}

/// A set of mutually clone-related fragments under the active grouping
/// strategy (spec §3 "Clone group").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneGroup {
    /// Unique id for this group.
    pub id: Uuid,
    /// Member fragment ids, deterministically ordered by source location
    /// (spec §4.6 "Ties").
    pub fragment_ids: Vec<usize>,
    /// Member fragments' source locations, in the same order as `fragment_ids`.
    pub locations: Vec<SourceLocation>,
    /// Majority clone type over internal pair edges (spec §3; plurality per
    /// §4.6, defaulting to Type-3 on empty evidence).
    pub clone_type: CloneType,
    /// Arithmetic mean of internal pairwise similarities (spec §4.6
    /// "Group similarity").
    pub average_similarity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceSpan;

    fn loc(file: &str, line: usize) -> SourceLocation {
        SourceLocation {
            file: file.to_string(),
            span: SourceSpan {
                start_line: line,
                start_col: 0,
                end_line: line + 1,
                end_col: 0,
            },
        }
    }

    fn pair(sim: f64, a: &str, b: &str) -> ClonePair {
        ClonePair {
            fragment_a_id: 0,
            fragment_b_id: 1,
            location_a: loc(a, 0),
            location_b: loc(b, 0),
            size_a: 10,
            size_b: 10,
            distance: 0.0,
            similarity: sim,
            clone_type: CloneType::Type1,
            confidence: sim,
            cost_model_name: "default",
            source: PairSource::Exhaustive,
        }
    }

    #[test]
    fn ranking_orders_by_descending_similarity() {
        let mut pairs = vec![pair(0.5, "a", "b"), pair(0.9, "a", "c"), pair(0.7, "a", "d")];
        pairs.sort_by(ClonePair::ranking_cmp);
        let sims: Vec<f64> = pairs.iter().map(|p| p.similarity).collect();
        assert_eq!(sims, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn equal_similarity_breaks_tie_by_location() {
        let mut pairs = vec![pair(0.8, "zzz", "b"), pair(0.8, "aaa", "b")];
        pairs.sort_by(ClonePair::ranking_cmp);
        assert_eq!(pairs[0].location_a.file, "aaa");
    }
}
