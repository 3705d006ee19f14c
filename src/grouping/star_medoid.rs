//! Star/medoid grouping (spec §4.6): iterative medoid-based reassignment.
//! Balanced and robust to outliers compared to the chain-prone connected
//! components strategy.

use std::collections::HashMap;

use super::{build_group, fragment_locations, order_groups, similarity_lookup, GroupingStrategy};
use crate::clone::{CloneGroup, ClonePair};
use crate::config::DetectionConfig;

const MAX_ITERATIONS: usize = 10;
const EARLY_STOP_STALE_ROUNDS: usize = 3;

pub struct StarMedoid;

impl GroupingStrategy for StarMedoid {
    fn name(&self) -> &'static str {
        "star_medoid"
    }

    fn group_clones(&self, pairs: &[ClonePair], config: &DetectionConfig) -> Vec<CloneGroup> {
        let theta = config.grouping_threshold;
        let locations = fragment_locations(pairs);
        let similarities = similarity_lookup(pairs);
        let ids: Vec<usize> = locations.keys().copied().collect();

        if ids.is_empty() {
            return Vec::new();
        }

        // Each fragment starts in its own singleton cluster, named by its own id.
        let mut assignment: HashMap<usize, usize> = ids.iter().map(|&id| (id, id)).collect();
        let mut stale_rounds = 0;

        for _ in 0..MAX_ITERATIONS {
            let clusters = clusters_from_assignment(&assignment);
            let medoids = pick_medoids(&clusters, &similarities);

            let mut next = assignment.clone();
            for (&rep, members) in &clusters {
                let medoid = medoids[&rep];
                for &member in members {
                    if member == medoid {
                        continue;
                    }
                    let best = medoids
                        .values()
                        .copied()
                        .max_by(|&a, &b| sim_of(&similarities, member, a).total_cmp(&sim_of(&similarities, member, b)))
                        .unwrap_or(medoid);
                    next.insert(member, best);
                }
            }

            if next == assignment {
                stale_rounds += 1;
                if stale_rounds >= EARLY_STOP_STALE_ROUNDS {
                    break;
                }
            } else {
                stale_rounds = 0;
            }
            assignment = next;
        }

        let final_clusters = clusters_from_assignment(&assignment);
        let final_medoids = pick_medoids(&final_clusters, &similarities);

        let groups: Vec<CloneGroup> = final_clusters
            .into_iter()
            .filter_map(|(rep, members)| {
                let medoid = final_medoids[&rep];
                let retained: Vec<usize> = members
                    .into_iter()
                    .filter(|&m| m == medoid || sim_of(&similarities, m, medoid) >= theta)
                    .collect();
                if retained.len() >= 2 {
                    Some(build_group(&retained, &locations, pairs))
                } else {
                    None
                }
            })
            .collect();

        order_groups(groups)
    }
}

fn clusters_from_assignment(assignment: &HashMap<usize, usize>) -> HashMap<usize, Vec<usize>> {
    let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
    for (&member, &rep) in assignment {
        clusters.entry(rep).or_default().push(member);
    }
    clusters
}

/// For each cluster, pick the member maximizing average similarity to the
/// rest of the cluster (spec §4.6 "Medoid").
fn pick_medoids(
    clusters: &HashMap<usize, Vec<usize>>,
    similarities: &HashMap<(usize, usize), f64>,
) -> HashMap<usize, usize> {
    clusters
        .iter()
        .map(|(&rep, members)| {
            let medoid = members
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    avg_similarity_to_others(members, a, similarities)
                        .total_cmp(&avg_similarity_to_others(members, b, similarities))
                })
                .unwrap_or(rep);
            (rep, medoid)
        })
        .collect()
}

fn avg_similarity_to_others(members: &[usize], target: usize, similarities: &HashMap<(usize, usize), f64>) -> f64 {
    let others: Vec<usize> = members.iter().copied().filter(|&m| m != target).collect();
    if others.is_empty() {
        return 0.0;
    }
    others.iter().map(|&other| sim_of(similarities, target, other)).sum::<f64>() / others.len() as f64
}

fn sim_of(similarities: &HashMap<(usize, usize), f64>, a: usize, b: usize) -> f64 {
    if a == b {
        return 1.0;
    }
    let key = if a <= b { (a, b) } else { (b, a) };
    similarities.get(&key).copied().unwrap_or(0.0)
}
