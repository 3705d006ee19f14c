//! Pair-to-group aggregation (spec §4.6): five pluggable cluster-shape
//! strategies over the retained clone-pair graph, dispatched from the
//! orchestrator by [`crate::config::GroupingMode`].

mod centroid;
mod complete_linkage;
mod connected_components;
mod k_core;
mod star_medoid;

use std::collections::HashMap;

use uuid::Uuid;

use crate::apted::CloneType;
use crate::clone::{CloneGroup, ClonePair};
use crate::config::DetectionConfig;
use crate::fragment::SourceLocation;

/// A pluggable grouping policy (spec §9 "Pluggable grouping").
pub trait GroupingStrategy {
    /// Human-readable strategy name.
    fn name(&self) -> &'static str;

    /// Group the retained pair set under this strategy's rules, given
    /// `config`'s grouping threshold (and any strategy-specific knobs it
    /// also carries, e.g. `k_core_k`).
    fn group_clones(&self, pairs: &[ClonePair], config: &DetectionConfig) -> Vec<CloneGroup>;
}

/// Dispatch to the strategy named by `config.grouping_mode` (spec §4.5 step 7).
pub fn group_clones(pairs: &[ClonePair], config: &DetectionConfig) -> Vec<CloneGroup> {
    use crate::config::GroupingMode::*;
    match config.grouping_mode {
        ConnectedComponents => connected_components::ConnectedComponents.group_clones(pairs, config),
        KCore => k_core::KCore.group_clones(pairs, config),
        CompleteLinkage => complete_linkage::CompleteLinkage.group_clones(pairs, config),
        StarMedoid => star_medoid::StarMedoid.group_clones(pairs, config),
        Centroid => centroid::Centroid.group_clones(pairs, config),
    }
}

/// Map every fragment id appearing in `pairs` to its source location, so
/// grouping strategies never need the original fragment list — "isolated
/// fragments are never reported" (spec §3) falls out for free since ids
/// only enter this map by appearing in a retained pair.
fn fragment_locations(pairs: &[ClonePair]) -> HashMap<usize, SourceLocation> {
    let mut locations = HashMap::new();
    for pair in pairs {
        locations.entry(pair.fragment_a_id).or_insert_with(|| pair.location_a.clone());
        locations.entry(pair.fragment_b_id).or_insert_with(|| pair.location_b.clone());
    }
    locations
}

/// Pairwise similarity lookup keyed by an order-independent `(min, max)` id
/// pair, built once and shared by every strategy that needs "the similarity
/// between these two specific fragments" rather than a threshold graph.
fn similarity_lookup(pairs: &[ClonePair]) -> HashMap<(usize, usize), f64> {
    pairs
        .iter()
        .map(|p| (edge_key(p.fragment_a_id, p.fragment_b_id), p.similarity))
        .collect()
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Build a [`CloneGroup`] from a member id set, deterministically ordering
/// members by source location and deriving clone type / average similarity
/// from the internal edges of `pairs` that connect two members
/// (spec §4.6 "Group similarity", "Group clone type", "Ties").
fn build_group(
    member_ids: &[usize],
    locations: &HashMap<usize, SourceLocation>,
    pairs: &[ClonePair],
) -> CloneGroup {
    let member_set: std::collections::HashSet<usize> = member_ids.iter().copied().collect();

    let mut ordered: Vec<usize> = member_ids.to_vec();
    ordered.sort_by(|&a, &b| locations[&a].cmp(&locations[&b]));

    let internal: Vec<&ClonePair> = pairs
        .iter()
        .filter(|p| member_set.contains(&p.fragment_a_id) && member_set.contains(&p.fragment_b_id))
        .collect();

    let average_similarity = if internal.is_empty() {
        0.0
    } else {
        internal.iter().map(|p| p.similarity).sum::<f64>() / internal.len() as f64
    };

    let clone_type = plurality_clone_type(&internal);

    CloneGroup {
        id: group_id(&ordered),
        locations: ordered.iter().map(|id| locations[id].clone()).collect(),
        fragment_ids: ordered,
        clone_type,
        average_similarity,
    }
}

/// Deterministic per-run group id derived from member ids, so the same
/// input always yields the same id (spec §8 property 9, "Determinism") —
/// `Uuid::new_v4` would break that, and `Date.now`-seeded ids are
/// unavailable here besides.
fn group_id(ordered_members: &[usize]) -> Uuid {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    ordered_members.hash(&mut hasher);
    let bits = hasher.finish();
    Uuid::from_u64_pair(bits, ordered_members.len() as u64)
}

/// Plurality clone type among internal pair edges; defaults to Type-3 on
/// empty evidence (spec §4.6 "Group clone type").
fn plurality_clone_type(internal: &[&ClonePair]) -> CloneType {
    if internal.is_empty() {
        return CloneType::Type3;
    }
    let mut counts: HashMap<u8, usize> = HashMap::new();
    for pair in internal {
        *counts.entry(clone_type_tag(pair.clone_type)).or_insert(0) += 1;
    }
    let winner = counts
        .into_iter()
        .max_by_key(|&(_, count)| count)
        .map(|(tag, _)| tag)
        .unwrap_or(3);
    clone_type_from_tag(winner)
}

fn clone_type_tag(t: CloneType) -> u8 {
    match t {
        CloneType::Type1 => 1,
        CloneType::Type2 => 2,
        CloneType::Type3 => 3,
        CloneType::Type4 => 4,
    }
}

fn clone_type_from_tag(tag: u8) -> CloneType {
    match tag {
        1 => CloneType::Type1,
        2 => CloneType::Type2,
        4 => CloneType::Type4,
        _ => CloneType::Type3,
    }
}

/// Order groups by descending average similarity, then descending size,
/// then by the location of the first fragment (spec §4.6 "Ties").
pub fn order_groups(mut groups: Vec<CloneGroup>) -> Vec<CloneGroup> {
    groups.sort_by(|a, b| {
        b.average_similarity
            .total_cmp(&a.average_similarity)
            .then_with(|| b.fragment_ids.len().cmp(&a.fragment_ids.len()))
            .then_with(|| a.locations[0].cmp(&b.locations[0]))
    });
    groups
}
