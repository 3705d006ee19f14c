//! K-core grouping (spec §4.6): the same threshold graph as connected
//! components, but vertices of degree `< k` are iteratively peeled away
//! first — excluding weakly connected chain ends.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::unionfind::UnionFind;

use super::{build_group, fragment_locations, order_groups, GroupingStrategy};
use crate::clone::{CloneGroup, ClonePair};
use crate::config::DetectionConfig;

pub struct KCore;

impl GroupingStrategy for KCore {
    fn name(&self) -> &'static str {
        "k_core"
    }

    fn group_clones(&self, pairs: &[ClonePair], config: &DetectionConfig) -> Vec<CloneGroup> {
        let theta = config.grouping_threshold;
        let k = config.k_core_k;
        let locations = fragment_locations(pairs);

        let mut adjacency: HashMap<usize, HashSet<usize>> = HashMap::new();
        for pair in pairs {
            if pair.similarity >= theta {
                adjacency.entry(pair.fragment_a_id).or_default().insert(pair.fragment_b_id);
                adjacency.entry(pair.fragment_b_id).or_default().insert(pair.fragment_a_id);
            }
        }

        // Iteratively peel vertices with residual degree < k via a queue.
        let mut degree: HashMap<usize, usize> = adjacency.iter().map(|(&id, n)| (id, n.len())).collect();
        let mut removed: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<usize> = degree
            .iter()
            .filter(|&(_, &d)| d < k)
            .map(|(&id, _)| id)
            .collect();

        while let Some(id) = queue.pop_front() {
            if removed.contains(&id) {
                continue;
            }
            removed.insert(id);
            if let Some(neighbors) = adjacency.get(&id) {
                for &neighbor in neighbors {
                    if removed.contains(&neighbor) {
                        continue;
                    }
                    if let Some(d) = degree.get_mut(&neighbor) {
                        *d = d.saturating_sub(1);
                        if *d < k {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        }

        let residual: Vec<usize> = adjacency.keys().copied().filter(|id| !removed.contains(id)).collect();
        if residual.is_empty() {
            return Vec::new();
        }

        let mut index_of: HashMap<usize, usize> = HashMap::new();
        for &id in &residual {
            let next = index_of.len();
            index_of.insert(id, next);
        }
        let mut uf = UnionFind::new(residual.len());
        for &id in &residual {
            for &neighbor in &adjacency[&id] {
                if !removed.contains(&neighbor) {
                    uf.union(index_of[&id], index_of[&neighbor]);
                }
            }
        }

        let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
        for &id in &residual {
            components.entry(uf.find(index_of[&id])).or_default().push(id);
        }

        let groups: Vec<CloneGroup> = components
            .into_values()
            .filter(|members| members.len() >= 2)
            .map(|members| build_group(&members, &locations, pairs))
            .collect();

        order_groups(groups)
    }
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
    fn chain_yields_no_group_under_k_core_2() {
        // Spec §8 "Chain" scenario: k-core(k=2) yields no groups since the
        // chain A-B-C-D has degree-1 endpoints once weak edges are excluded.
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
        config.k_core_k = 2;
        let groups = KCore.group_clones(&pairs, &config);
        assert!(groups.is_empty());
    }

    #[test]
    fn clique_survives_k_core_2() {
        let pairs = vec![pair(1, 2, 0.95), pair(2, 3, 0.96), pair(1, 3, 0.97)];
        let mut config = DetectionConfig::default();
        config.grouping_threshold = 0.85;
        config.k_core_k = 2;
        let groups = KCore.group_clones(&pairs, &config);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fragment_ids.len(), 3);
    }

    #[test]
    fn residual_subgraph_respects_minimum_degree() {
        let pairs = vec![
            pair(1, 2, 0.9),
            pair(2, 3, 0.9),
            pair(3, 1, 0.9),
            pair(3, 4, 0.9),
        ];
        let mut config = DetectionConfig::default();
        config.grouping_threshold = 0.85;
        config.k_core_k = 2;
        let groups = KCore.group_clones(&pairs, &config);
        // Vertex 4 has degree 1 and must be peeled; {1,2,3} survive as a triangle.
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].fragment_ids.contains(&4));
    }
}
