use crate::ids::{MethodId, StmtId};
use crate::project::Project;
use ahash::AHashMap;
use cortado_ir::InvokeExpr;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

/// The method-level call graph.
///
/// For every invoke statement of the project the targets are resolved
/// through the [`Hierarchy`](crate::Hierarchy); each concrete target whose
/// class is in the project contributes an edge `caller -> target` and a
/// call-site record. External targets are silently dropped.
#[derive(Debug)]
pub struct CallGraph {
    graph: DiGraph<MethodId, ()>,
    /// Node handle per method, indexed by method id.
    nodes: Vec<NodeIndex>,
    call_sites: AHashMap<(MethodId, MethodId), Vec<StmtId>>,
}

impl CallGraph {
    /// Build the call graph for the given project.
    #[must_use]
    pub fn new(project: &Project) -> Self {
        let hierarchy = project.hierarchy();
        let mut graph = DiGraph::new();
        let nodes = project
            .method_ids()
            .map(|method| graph.add_node(method))
            .collect::<Vec<_>>();
        let mut call_sites: AHashMap<(MethodId, MethodId), Vec<StmtId>> = AHashMap::new();

        for block_id in project.block_ids() {
            let container = project.block_method(block_id);
            let block = project.block(block_id);
            for (stmt_index, stmt) in block.statements.iter().enumerate() {
                if !stmt.is_invoke() {
                    continue;
                }
                for target in hierarchy.resolve_stmt_targets(project, stmt, container) {
                    graph.update_edge(nodes[container.index()], nodes[target.index()], ());
                    call_sites
                        .entry((container, target))
                        .or_default()
                        .push(project.stmt_id_at(block_id, stmt_index));
                }
            }
        }

        Self {
            graph,
            nodes,
            call_sites,
        }
    }

    /// The methods `method` may call.
    #[must_use]
    pub fn next(&self, method: MethodId) -> Vec<MethodId> {
        self.neighbors(method, Direction::Outgoing)
    }

    /// The methods that may call `method`.
    #[must_use]
    pub fn prev(&self, method: MethodId) -> Vec<MethodId> {
        self.neighbors(method, Direction::Incoming)
    }

    /// True when the graph has an edge `caller -> target`.
    #[must_use]
    pub fn has_edge(&self, caller: MethodId, target: MethodId) -> bool {
        self.graph
            .contains_edge(self.nodes[caller.index()], self.nodes[target.index()])
    }

    /// The recorded call sites of `caller` invoking `target`.
    #[must_use]
    pub fn call_sites(&self, caller: MethodId, target: MethodId) -> &[StmtId] {
        self.call_sites
            .get(&(caller, target))
            .map_or(&[], Vec::as_slice)
    }

    /// The invoke expressions recorded for `caller` invoking `target`.
    pub fn call_site_exprs<'a>(
        &'a self,
        project: &'a Project,
        caller: MethodId,
        target: MethodId,
    ) -> impl Iterator<Item = &'a InvokeExpr> {
        self.call_sites(caller, target)
            .iter()
            .filter_map(|stmt| project.stmt(*stmt).invoke_expr())
    }

    fn neighbors(&self, method: MethodId, direction: Direction) -> Vec<MethodId> {
        self.graph
            .neighbors_directed(self.nodes[method.index()], direction)
            .map(|node| self.graph[node])
            .collect()
    }
}
