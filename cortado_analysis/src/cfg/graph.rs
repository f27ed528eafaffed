use crate::ids::BlockId;
use ahash::AHashMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

/// A directed graph over basic blocks.
///
/// Blocks are identified by [`BlockId`]; edges are deduplicated, so
/// repeated construction of the same edge is a no-op.
#[derive(Debug, Default)]
pub struct BlockGraph {
    graph: DiGraph<BlockId, ()>,
    nodes: AHashMap<BlockId, NodeIndex>,
}

impl BlockGraph {
    pub(crate) fn add_node(&mut self, block: BlockId) -> NodeIndex {
        if let Some(&node) = self.nodes.get(&block) {
            node
        } else {
            let node = self.graph.add_node(block);
            self.nodes.insert(block, node);
            node
        }
    }

    pub(crate) fn add_edge(&mut self, from: BlockId, to: BlockId) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.graph.update_edge(from, to, ());
    }

    /// True when the block appears in the graph.
    #[must_use]
    pub fn contains(&self, block: BlockId) -> bool {
        self.nodes.contains_key(&block)
    }

    /// True when the graph has an edge `from -> to`.
    #[must_use]
    pub fn has_edge(&self, from: BlockId, to: BlockId) -> bool {
        let (Some(&from), Some(&to)) = (self.nodes.get(&from), self.nodes.get(&to)) else {
            return false;
        };
        self.graph.contains_edge(from, to)
    }

    /// The successor blocks of `block`.
    #[must_use]
    pub fn next_blocks(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Outgoing)
    }

    /// The predecessor blocks of `block`.
    #[must_use]
    pub fn prev_blocks(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Incoming)
    }

    /// All simple paths from `source` to `sink`.
    #[must_use]
    pub fn paths(&self, source: BlockId, sink: BlockId) -> Vec<Vec<BlockId>> {
        let (Some(&source), Some(&sink)) = (self.nodes.get(&source), self.nodes.get(&sink)) else {
            return Vec::new();
        };
        petgraph::algo::all_simple_paths::<Vec<NodeIndex>, _, std::collections::hash_map::RandomState>(
            &self.graph,
            source,
            sink,
            0,
            None,
        )
            .map(|path| path.into_iter().map(|node| self.graph[node]).collect())
            .collect()
    }

    /// The number of blocks in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn neighbors(&self, block: BlockId, direction: Direction) -> Vec<BlockId> {
        let Some(&node) = self.nodes.get(&block) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(node, direction)
            .map(|node| self.graph[node])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_deduplicate() {
        let mut graph = BlockGraph::default();
        graph.add_edge(BlockId(0), BlockId(1));
        graph.add_edge(BlockId(0), BlockId(1));
        assert_eq!(1, graph.edge_count());
        assert!(graph.has_edge(BlockId(0), BlockId(1)));
        assert!(!graph.has_edge(BlockId(1), BlockId(0)));
    }

    #[test]
    fn test_neighbors() {
        let mut graph = BlockGraph::default();
        graph.add_edge(BlockId(0), BlockId(1));
        graph.add_edge(BlockId(0), BlockId(2));
        graph.add_edge(BlockId(2), BlockId(1));
        let mut next = graph.next_blocks(BlockId(0));
        next.sort();
        assert_eq!(vec![BlockId(1), BlockId(2)], next);
        let mut prev = graph.prev_blocks(BlockId(1));
        prev.sort();
        assert_eq!(vec![BlockId(0), BlockId(2)], prev);
    }

    #[test]
    fn test_paths() {
        let mut graph = BlockGraph::default();
        graph.add_edge(BlockId(0), BlockId(1));
        graph.add_edge(BlockId(1), BlockId(2));
        graph.add_edge(BlockId(0), BlockId(2));
        let mut paths = graph.paths(BlockId(0), BlockId(2));
        paths.sort();
        assert_eq!(
            vec![
                vec![BlockId(0), BlockId(1), BlockId(2)],
                vec![BlockId(0), BlockId(2)],
            ],
            paths
        );
        assert!(graph.paths(BlockId(2), BlockId(0)).is_empty());
    }
}
