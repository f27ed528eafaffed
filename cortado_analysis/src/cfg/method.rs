use crate::cfg::{BlockGraph, add_method_edges};
use crate::ids::{BlockId, MethodId};
use crate::project::Project;
use cortado_ir::MethodKey;

/// The intra-method control-flow graph of a single method.
#[derive(Debug)]
pub struct CfgMethod {
    method: MethodId,
    key: MethodKey,
    graph: BlockGraph,
}

impl CfgMethod {
    /// Build the CFG of `method`.
    #[must_use]
    pub fn new(project: &Project, method: MethodId) -> Self {
        let mut graph = BlockGraph::default();
        add_method_edges(project, method, &mut graph, |_, _, _| {});
        Self {
            method,
            key: project.method(method).key(),
            graph,
        }
    }

    /// The method this CFG covers.
    #[must_use]
    pub fn method(&self) -> MethodId {
        self.method
    }

    /// The `(class, name, params)` identity of the covered method.
    #[must_use]
    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    /// The underlying block graph.
    #[must_use]
    pub fn graph(&self) -> &BlockGraph {
        &self.graph
    }

    /// The successor blocks of `block`.
    #[must_use]
    pub fn next_blocks(&self, block: BlockId) -> Vec<BlockId> {
        self.graph.next_blocks(block)
    }

    /// The predecessor blocks of `block`.
    #[must_use]
    pub fn prev_blocks(&self, block: BlockId) -> Vec<BlockId> {
        self.graph.prev_blocks(block)
    }
}
