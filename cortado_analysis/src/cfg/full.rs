use crate::cfg::{BlockGraph, add_method_edges};
use crate::hierarchy::Hierarchy;
use crate::ids::{BlockId, MethodId};
use crate::project::Project;
use cortado_ir::{MethodKey, Statement};
use tracing::warn;

/// The interprocedural control-flow graph.
///
/// On top of the intra-method edges, every invoke statement links the
/// calling block to the entry block of each resolved concrete target.
/// With `ret_edges` enabled, every target block containing a return links
/// back to the calling block.
///
/// Calls into classes outside the project, and targets that are abstract or
/// native, contribute no edges; the caller still falls through to the next
/// block in source order.
#[derive(Debug)]
pub struct CfgFull {
    graph: BlockGraph,
    ret_edges: bool,
}

impl CfgFull {
    /// Build the interprocedural CFG over all methods of all classes.
    #[must_use]
    pub fn new(project: &Project, ret_edges: bool) -> Self {
        let mut graph = BlockGraph::default();
        let hierarchy = project.hierarchy();
        for method_id in project.method_ids() {
            add_method_edges(project, method_id, &mut graph, |graph, block_id, stmt| {
                Self::add_invoke(project, &hierarchy, ret_edges, graph, method_id, block_id, stmt);
            });
        }
        Self { graph, ret_edges }
    }

    fn add_invoke(
        project: &Project,
        hierarchy: &Hierarchy,
        ret_edges: bool,
        graph: &mut BlockGraph,
        container: MethodId,
        block_id: BlockId,
        stmt: &Statement,
    ) {
        let Some(expr) = stmt.invoke_expr() else {
            return;
        };
        if project.class_id(&expr.class_name).is_none() {
            // external classes are not supported
            return;
        }
        let key = MethodKey {
            class_name: expr.class_name.clone(),
            name: expr.method_name.clone(),
            params: expr.method_params.clone(),
        };
        let Some(static_method) = project.method_id(&key) else {
            warn!("Cannot handle call to external method {key}");
            return;
        };
        let targets = match hierarchy.resolve_invoke(project, expr, static_method, container) {
            Ok(targets) => targets,
            Err(error) => {
                warn!("Could not resolve concrete dispatch: {error}");
                return;
            }
        };

        for target in targets {
            let method = project.method(target);
            if method.is_native() || method.is_abstract() {
                continue;
            }
            let Some(entry) = project.entry_block_id(target) else {
                continue;
            };
            graph.add_edge(block_id, entry);

            if ret_edges {
                for target_block in project.method_block_ids(target) {
                    if project
                        .block(target_block)
                        .statements
                        .iter()
                        .any(Statement::is_ret)
                    {
                        graph.add_edge(target_block, block_id);
                    }
                }
            }
        }
    }

    /// Whether return edges were added.
    #[must_use]
    pub fn has_ret_edges(&self) -> bool {
        self.ret_edges
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

    /// All simple paths from `source` to `sink`.
    #[must_use]
    pub fn paths(&self, source: BlockId, sink: BlockId) -> Vec<Vec<BlockId>> {
        self.graph.paths(source, sink)
    }
}
