//! Approach-level search — nearest covered ancestor by backwards traversal.
//!
//! Starting from a candidate node, walk the graph backwards (child to parent
//! via the precomputed reverse adjacency) until a covered node is reached.
//! Control-decision edges weigh 2 and plain edges weigh 1 when ordering the
//! traversal, so among equally deep ancestors the one reachable through
//! fewer branch decisions wins. The reported approach distance is the hop
//! count of the chosen path.
//!
//! No reachable covered ancestor is not an error: the caller treats the
//! objective as currently unreachable and leaves it dormant.

use crate::graph::ControlFlowGraph;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

/// Result of a successful ancestor search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    /// Id of the nearest covered ancestor.
    pub node_id: String,
    /// Approach distance: hops on the chosen backwards path.
    pub distance: u32,
}

impl ControlFlowGraph {
    /// Find the nearest covered ancestor of `from`.
    ///
    /// Returns `None` when no covered node can be reached backwards from
    /// `from`. The start node itself is never returned, even if covered.
    pub fn closest_covered_ancestor(
        &self,
        from: &str,
        covered: &BTreeSet<String>,
    ) -> Option<Ancestor> {
        if self.node(from).is_none() {
            log::warn!("ancestor search from unknown node {from}");
            return None;
        }

        // Best-first over (weighted cost, hops, id). The id component makes
        // tie-breaking deterministic.
        let mut heap = BinaryHeap::new();
        let mut seen = BTreeSet::new();
        heap.push(Reverse((0u32, 0u32, from.to_string())));

        while let Some(Reverse((cost, hops, id))) = heap.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }

            if id != from && covered.contains(&id) {
                return Some(Ancestor {
                    node_id: id,
                    distance: hops,
                });
            }

            for edge in self.incoming_edges(&id) {
                if seen.contains(&edge.from) {
                    continue;
                }
                let weight = if edge.is_control() { 2 } else { 1 };
                heap.push(Reverse((cost + weight, hops + 1, edge.from.clone())));
            }
        }

        None
    }
}
