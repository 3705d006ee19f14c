//! Complete-linkage grouping (spec §4.6): agglomerative clustering that
//! merges two clusters only when every cross-cluster pair clears `θ`.
//! Breaks chains; highest precision of the five strategies.

use std::collections::HashMap;

use super::{build_group, fragment_locations, order_groups, similarity_lookup, GroupingStrategy};
use crate::clone::{CloneGroup, ClonePair};
use crate::config::DetectionConfig;

pub struct CompleteLinkage;

impl GroupingStrategy for CompleteLinkage {
    fn name(&self) -> &'static str {
        "complete_linkage"
    }

    fn group_clones(&self, pairs: &[ClonePair], config: &DetectionConfig) -> Vec<CloneGroup> {
        let theta = config.grouping_threshold;
        let locations = fragment_locations(pairs);
        let similarities = similarity_lookup(pairs);

        // Seed one 2-element cluster per pair that already clears θ.
        let mut clusters: Vec<Vec<usize>> = pairs
            .iter()
            .filter(|p| p.similarity >= theta)
            .map(|p| vec![p.fragment_a_id, p.fragment_b_id])
            .collect();

        loop {
            let Some((i, j)) = find_mergeable_pair(&clusters, &similarities, theta) else {
                break;
            };
            // Remove the higher index first so the lower index stays valid.
            let (hi, lo) = if i > j { (i, j) } else { (j, i) };
            let mut merged = clusters.remove(hi);
            let mut base = clusters.remove(lo);
            base.append(&mut merged);
            base.sort_unstable();
            base.dedup();
            clusters.push(base);
        }

        let groups: Vec<CloneGroup> = clusters
            .into_iter()
            .filter(|c| c.len() >= 2)
            .map(|members| build_group(&members, &locations, pairs))
            .collect();

        order_groups(dedup_groups(groups))
    }
}

/// Find the first pair of distinct clusters `(i, j)` such that every
/// cross-cluster pair of members has a known similarity `>= theta` (spec
/// §4.6 "merge two clusters only if every cross-cluster pair has similarity
/// >= theta"). A missing similarity (pair never retained) blocks the merge.
fn find_mergeable_pair(
    clusters: &[Vec<usize>],
    similarities: &HashMap<(usize, usize), f64>,
    theta: f64,
) -> Option<(usize, usize)> {
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            if all_cross_pairs_clear(&clusters[i], &clusters[j], similarities, theta) {
                return Some((i, j));
            }
        }
    }
    None
}

fn all_cross_pairs_clear(
    a: &[usize],
    b: &[usize],
    similarities: &HashMap<(usize, usize), f64>,
    theta: f64,
) -> bool {
    for &x in a {
        for &y in b {
            if x == y {
                continue; // same fragment shared by both clusters pre-merge; trivially linked
            }
            let key = if x <= y { (x, y) } else { (y, x) };
            match similarities.get(&key) {
                Some(&sim) if sim >= theta => {}
                _ => return false,
            }
        }
    }
    true
}

/// Clusters built independently from overlapping seed pairs can duplicate a
/// fully-merged component; collapse duplicates by member set before ordering.
fn dedup_groups(groups: Vec<CloneGroup>) -> Vec<CloneGroup> {
    let mut seen = std::collections::HashSet::new();
    groups
        .into_iter()
        .filter(|g| seen.insert(g.fragment_ids.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceSpan;
    use crate::apted::CloneType;
    use crate::clone::PairSource;
    use crate::fragment::SourceLocation;

    fn loc(file: &str) -> SourceLocation {
        SourceLocation {
            file: file.to_string(),
            span: SourceSpan {
                start_line: 0,
                start_col: 0,
                end_line: 1,
                end_col: 0,
            },
        }
    }

    fn pair(a: usize, b: usize, sim: f64) -> ClonePair {
        ClonePair {
            fragment_a_id: a,
            fragment_b_id: b,
            location_a: loc(&format!("f{a}.py")),
            location_b: loc(&format!("f{b}.py")),
            size_a: 10,
            size_b: 10,
            distance: (1.0 - sim) * 10.0,
            similarity: sim,
            clone_type: CloneType::Type1,
            confidence: sim,
            cost_model_name: "default",
            source: PairSource::Exhaustive,
        }
    }

    #[test]
    fn clique_forms_one_group() {
        let pairs = vec![pair(1, 2, 0.95), pair(2, 3, 0.96), pair(1, 3, 0.97)];
        let mut config = DetectionConfig::default();
        config.grouping_threshold = 0.85;
        let groups = CompleteLinkage.group_clones(&pairs, &config);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fragment_ids.len(), 3);
    }

    #[test]
    fn chain_breaks_into_pairs_not_one_group() {
        let pairs = vec![
            pair(1, 2, 0.90),
            pair(2, 3, 0.90),
            pair(3, 4, 0.90),
            pair(1, 3, 0.50),
            pair(2, 4, 0.50),
            pair(1, 4, 0.30),
        ];
        let mut config = DetectionConfig::default();
        config.grouping_threshold = 0.85;
        let groups = CompleteLinkage.group_clones(&pairs, &config);
        assert!(groups.iter().all(|g| g.fragment_ids.len() <= 2));
    }

    #[test]
    fn star_scenario_yields_no_group_larger_than_pair() {
        let pairs = vec![
            pair(1, 2, 0.92),
            pair(1, 3, 0.91),
            pair(1, 4, 0.90),
            pair(2, 3, 0.10),
            pair(2, 4, 0.10),
            pair(3, 4, 0.10),
        ];
        let mut config = DetectionConfig::default();
        config.grouping_threshold = 0.85;
        let groups = CompleteLinkage.group_clones(&pairs, &config);
        assert!(groups.iter().all(|g| g.fragment_ids.len() <= 2));
    }
}
