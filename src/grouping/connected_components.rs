//! Connected-components grouping (spec §4.6): highest recall, lowest
//! precision. Permits transitive chaining — committed as the default
//! grouping strategy (SPEC_FULL.md §B.5).

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use super::{build_group, fragment_locations, order_groups, GroupingStrategy};
use crate::clone::{CloneGroup, ClonePair};
use crate::config::DetectionConfig;

pub struct ConnectedComponents;

impl GroupingStrategy for ConnectedComponents {
    fn name(&self) -> &'static str {
        "connected_components"
    }

    fn group_clones(&self, pairs: &[ClonePair], config: &DetectionConfig) -> Vec<CloneGroup> {
        let theta = config.grouping_threshold;
        let locations = fragment_locations(pairs);

        // Union-find by rank with path compression over a dense index space,
        // since fragment ids need not be contiguous (spec §4.6).
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
            .map(|members| build_group(&members, &locations, pairs))
            .collect();

        order_groups(groups)
    }
}
