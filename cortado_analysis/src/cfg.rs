//! Control-flow graph constructors over basic blocks.
//!
//! [`CfgMethod`] covers a single method; [`CfgFull`] spans every method of
//! every class and adds block-to-callee-entry edges (and, optionally,
//! callee-return-to-caller edges). Both share the intra-method edge rules:
//!
//! - each block links to its goto/if/switch targets;
//! - a block falls through to the next block in source order unless its
//!   last statement is a goto, a return, or an invoke of
//!   `java.lang.System.exit`;
//! - exceptional predecessor edges are added as recorded by the lifter;
//! - throws, monitor bracketing and breakpoints neither cut nor add edges.

mod full;
mod graph;
mod method;

pub use full::CfgFull;
pub use graph::BlockGraph;
pub use method::CfgMethod;

use crate::ids::{BlockId, MethodId};
use crate::project::Project;
use cortado_ir::{Block, Statement};
use tracing::{debug, warn};

/// Add the intra-method edges of `method_id` to `graph`, handing invoke
/// statements to `on_invoke` for the interprocedural variants.
pub(crate) fn add_method_edges<F>(
    project: &Project,
    method_id: MethodId,
    graph: &mut BlockGraph,
    mut on_invoke: F,
) where
    F: FnMut(&mut BlockGraph, BlockId, &Statement),
{
    let method = project.method(method_id);
    for (index, block) in method.blocks.iter().enumerate() {
        let block_id = project.block_id_at(method_id, index);
        graph.add_node(block_id);

        for stmt in &block.statements {
            if stmt.is_invoke() {
                on_invoke(graph, block_id, stmt);
            }
            match stmt {
                Statement::Goto { target } | Statement::If { target, .. } => {
                    add_branch_edge(project, method_id, graph, block_id, *target);
                }
                Statement::Switch {
                    default_target,
                    lookup_values_and_targets,
                    ..
                } => {
                    add_branch_edge(project, method_id, graph, block_id, *default_target);
                    for target in lookup_values_and_targets.values() {
                        add_branch_edge(project, method_id, graph, block_id, *target);
                    }
                }
                _ => {
                    if stmt.is_unknown() {
                        debug!("Unknown statement: {stmt:?}");
                    }
                }
            }
        }

        if index + 1 < method.blocks.len() && links_to_next(block) {
            graph.add_edge(block_id, project.block_id_at(method_id, index + 1));
        }
    }

    for (block_index, preds) in &method.exceptional_preds {
        let block_id = project.block_id_at(method_id, *block_index);
        for pred in preds {
            graph.add_edge(project.block_id_at(method_id, *pred), block_id);
        }
    }
}

fn add_branch_edge(
    project: &Project,
    method_id: MethodId,
    graph: &mut BlockGraph,
    from: BlockId,
    label: cortado_ir::Label,
) {
    match project.method(method_id).block_index_by_label(label) {
        Ok(index) => graph.add_edge(from, project.block_id_at(method_id, index)),
        Err(error) => warn!("Skipping branch edge: {error}"),
    }
}

/// Link to the next block unless the last statement is a goto, a return, or
/// a call that never returns.
fn links_to_next(block: &Block) -> bool {
    let Some(last) = block.last_statement() else {
        return true;
    };
    if last.is_jump() || last.is_ret() {
        return false;
    }
    if let Some(expr) = last.invoke_expr()
        && expr.class_name == "java.lang.System"
        && expr.method_name == "exit"
    {
        return false;
    }
    true
}
