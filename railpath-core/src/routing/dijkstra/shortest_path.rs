use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, hash_map::Entry};
use log::trace;
use petgraph::{
    stable_graph::NodeIndex,
    visit::{EdgeRef, NodeIndexable},
};

use super::state::State;
use crate::model::RailNetwork;

/// Node sequence of a cheapest route and its total cost
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShortestPath {
    pub(crate) cost: f64,
    pub(crate) nodes: Vec<NodeIndex>,
}

/// Dijkstra's algorithm between two nodes of the rail network, weighted by
/// [`RailNetwork::edge_weight`].
///
/// Returns `None` if `target` cannot be reached, or if the search settles
/// more than `max_explored` nodes first.
pub(crate) fn shortest_path(
    network: &RailNetwork,
    start: NodeIndex,
    target: NodeIndex,
    max_explored: Option<usize>,
) -> Option<ShortestPath> {
    let graph = network.graph();
    let estimated_nodes = graph.node_count().min(1000);
    let mut distances: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(estimated_nodes);
    let mut settled = FixedBitSet::with_capacity(graph.node_bound());
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);
    let mut explored = 0_usize;

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }
        if settled.put(node.index()) {
            continue;
        }

        explored += 1;
        if max_explored.is_some_and(|max| explored > max) {
            trace!("Search from {start:?} gave up after {max_explored:?} nodes");
            return None;
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            if settled.contains(next.index()) {
                continue;
            }
            let next_cost = cost + network.edge_weight(edge.weight());

            match distances.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                }
                Entry::Occupied(mut entry) => {
                    if next_cost >= *entry.get() {
                        continue;
                    }
                    *entry.get_mut() = next_cost;
                }
            }
            heap.push(State {
                cost: next_cost,
                node: next,
            });
            predecessors.insert(next, node);
        }
    }

    let cost = *distances.get(&target)?;
    let mut nodes = vec![target];
    let mut current = target;
    while current != start {
        current = *predecessors.get(&current)?;
        nodes.push(current);
    }
    nodes.reverse();

    Some(ShortestPath { cost, nodes })
}
