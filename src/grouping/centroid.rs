//! Centroid grouping (spec §4.6): picks one central fragment per threshold-
//! graph component and admits members by their similarity to it alone,
//! classified against the full `tau1..tau4` ladder rather than a single
//! grouping threshold.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use super::{build_group, fragment_locations, order_groups, similarity_lookup, GroupingStrategy};
use crate::apted::classify_clone_type;
use crate::clone::{CloneGroup, ClonePair};
use crate::config::DetectionConfig;

pub struct Centroid;

impl GroupingStrategy for Centroid {
    fn name(&self) -> &'static str {
        "centroid"
    }

    fn group_clones(&self, pairs: &[ClonePair], config: &DetectionConfig) -> Vec<CloneGroup> {
        let theta = config.grouping_threshold;
        let locations = fragment_locations(pairs);
        let similarities = similarity_lookup(pairs);

        let mut index_of: HashMap<usize, usize> = HashMap::new();
        for &id in locations.keys() {
            let next = index_of.len();
            index_of.entry(id).or_insert(next);
        }
        let mut uf = UnionFind::new(index_of.len());
        for pair in pairs {
            if pair.similarity >= theta {
                uf.union(index_of[&pair.fragment_a_id], index_of[&pair.fragment_b_id]);
            }
        }

        let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
        for (&id, &idx) in &index_of {
            components.entry(uf.find(idx)).or_default().push(id);
        }

        let groups: Vec<CloneGroup> = components
            .into_values()
            .filter(|members| members.len() >= 2)
            .filter_map(|members| admit_around_centroid(&members, &similarities, config))
            .map(|members| build_group(&members, &locations, pairs))
            .collect();

        order_groups(groups)
    }
}

/// Pick the member with the greatest similarity mass to the rest of the
/// component, then admit every other member whose similarity to it clears
/// `tau4` (spec §4.6 "admit only fragments whose similarity to the centroid
/// meets a per-clone-type threshold"). Returns `None` if fewer than two
/// members survive admission.
fn admit_around_centroid(
    members: &[usize],
    similarities: &HashMap<(usize, usize), f64>,
    config: &DetectionConfig,
) -> Option<Vec<usize>> {
    let centroid = members
        .iter()
        .copied()
        .max_by(|&a, &b| {
            similarity_mass(members, a, similarities).total_cmp(&similarity_mass(members, b, similarities))
        })?;

    let mut admitted: Vec<usize> = vec![centroid];
    for &member in members {
        if member == centroid {
            continue;
        }
        let sim = sim_of(similarities, member, centroid);
        if classify_clone_type(sim, &config.thresholds).is_some() {
            admitted.push(member);
        }
    }

    if admitted.len() >= 2 {
        Some(admitted)
    } else {
        None
    }
}

fn similarity_mass(members: &[usize], target: usize, similarities: &HashMap<(usize, usize), f64>) -> f64 {
    members
        .iter()
        .copied()
        .filter(|&m| m != target)
        .map(|other| sim_of(similarities, target, other))
        .sum()
}

fn sim_of(similarities: &HashMap<(usize, usize), f64>, a: usize, b: usize) -> f64 {
    if a == b {
        return 1.0;
    }
    let key = if a <= b { (a, b) } else { (b, a) };
    similarities.get(&key).copied().unwrap_or(0.0)
}
