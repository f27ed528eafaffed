use crate::ids::{BlockId, MethodId};
use crate::project::Project;
use crate::slicer::{SliceSeed, Taint, TaintMap, merge_tainted};
use ahash::{AHashMap, AHashSet};
use cortado_ir::{MethodKey, Statement, Value};
use indexmap::IndexSet;
use std::collections::VecDeque;
use tracing::warn;

/// A seed block paired with the seeded local.
#[derive(Clone, Debug)]
struct SeedPoint {
    block: BlockId,
    var_name: String,
}

/// Forward slicer: starting from a seed value, follow the code paths that
/// are affected by it.
///
/// Symmetric to the backward slicer, the walk follows the successor edges
/// of the interprocedural CFG. In each block it chains use-def forwards
/// (statements using a tainted value taint the values they set), pushes
/// tainted arguments into the parameter bindings of resolved callees,
/// records the targets of conditionals reading tainted values as affected
/// (control dependence), and taints stored-to fields under every method of
/// the declaring class.
#[derive(Debug)]
pub struct ForwardSlicer<'a> {
    project: &'a Project,
    max_iter: usize,
    iters_per_block: AHashMap<BlockId, usize>,
    affected_blocks: IndexSet<BlockId>,
    tainted: AHashMap<BlockId, TaintMap>,
    seed_points: Vec<SeedPoint>,
}

impl<'a> ForwardSlicer<'a> {
    /// Total dequeue budget per seed point.
    pub const MAX_ITER: usize = 5000;
    /// Reprocessing budget per block; once reached, the block is no longer
    /// reprocessed but the walk continues elsewhere.
    pub const MAX_ITERS_BLOCK: usize = 30;

    /// Create a slicer bound to the given project.
    #[must_use]
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            max_iter: Self::MAX_ITER,
            iters_per_block: AHashMap::new(),
            affected_blocks: IndexSet::new(),
            tainted: AHashMap::new(),
            seed_points: Vec::new(),
        }
    }

    /// Override the total dequeue budget.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// The blocks the seed descriptor resolved to.
    #[must_use]
    pub fn input_blocks(&self) -> Vec<BlockId> {
        self.seed_points.iter().map(|point| point.block).collect()
    }

    /// Every block that produced a new taint during the walk, plus the
    /// branch targets of conditionals reading a tainted value.
    #[must_use]
    pub fn affected_blocks(&self) -> &IndexSet<BlockId> {
        &self.affected_blocks
    }

    /// The taints `block` carries under its own method scope.
    #[must_use]
    pub fn tainted_in_block(&self, block: BlockId) -> IndexSet<Taint> {
        let method = self.project.block_method(block);
        self.taints_of(block, method)
    }

    /// The union of the taints registered for `method` over all its blocks.
    #[must_use]
    pub fn tainted_in_method(&self, method: MethodId) -> IndexSet<Taint> {
        let mut taints = IndexSet::new();
        for block in self.project.method_block_ids(method) {
            if let Some(map) = self.tainted.get(&block)
                && let Some(block_taints) = map.get(&method)
            {
                taints.extend(block_taints.iter().cloned());
            }
        }
        taints
    }

    /// How many times `block` was reprocessed after its first visit.
    #[must_use]
    pub fn iterations_of(&self, block: BlockId) -> usize {
        self.iters_per_block.get(&block).copied().unwrap_or(0)
    }

    /// Run the slice for the given seed.
    ///
    /// Missing seed methods or classes yield an empty affected set with a
    /// warning; budget exhaustion silently truncates the result.
    pub fn slice(&mut self, seed: &SliceSeed) {
        self.seed_points = self.locate_seeds(seed);
        let seed_points = self.seed_points.clone();
        for point in &seed_points {
            self.run(point);
        }
    }

    fn run(&mut self, point: &SeedPoint) {
        let cfg = self.project.cfgfull();
        let seed_method = self.project.block_method(point.block);

        let mut queue = VecDeque::new();
        queue.push_back(point.block);
        let mut iterations = 0;
        let mut visited = AHashSet::new();

        let mut seed_taints = TaintMap::new();
        seed_taints.insert(
            seed_method,
            IndexSet::from([Taint::var(point.var_name.clone())]),
        );
        self.tainted.insert(point.block, seed_taints);
        self.affected_blocks.insert(point.block);

        while iterations < self.max_iter {
            let Some(curr) = queue.pop_front() else {
                break;
            };
            iterations += 1;
            let curr_method = self.project.block_method(curr);

            if visited.contains(&curr) {
                let iters = self.iters_per_block.entry(curr).or_insert(0);
                *iters += 1;
                if *iters >= Self::MAX_ITERS_BLOCK {
                    continue;
                }
            } else {
                visited.insert(curr);
            }

            let block_len = self.project.block(curr).statements.len();

            // each pass reruns the matching over the grown taint set; cheap
            // fixed point bounded by the statement count
            for _ in 0..block_len {
                let curr_taints = self.taints_of(curr, curr_method);
                let (assign_stmts, call_stmts) = self.get_use_stmts(curr, &curr_taints);
                let (cond_stmts, target_blocks) =
                    self.get_conditional_stmts(curr, &curr_taints);

                for target in target_blocks {
                    self.affected_blocks.insert(target);
                }

                if assign_stmts.is_empty() && call_stmts.is_empty() && cond_stmts.is_empty() {
                    continue;
                }
                self.affected_blocks.insert(curr);

                for (name, method) in self.get_set(curr, &assign_stmts) {
                    self.tainted
                        .entry(curr)
                        .or_default()
                        .entry(method)
                        .or_default()
                        .insert(Taint::var(name));
                }
                for (name, method) in self.get_calls_set(curr, &call_stmts) {
                    self.tainted
                        .entry(curr)
                        .or_default()
                        .entry(method)
                        .or_default()
                        .insert(Taint::var(name));
                }
                for (name, method) in self.get_fields_set(curr, &assign_stmts) {
                    self.tainted
                        .entry(curr)
                        .or_default()
                        .entry(method)
                        .or_default()
                        .insert(Taint::var(name));
                }
            }

            for next in cfg.next_blocks(curr) {
                queue.push_back(next);
                let curr_map = self.tainted.get(&curr).cloned().unwrap_or_default();
                let merged = merge_tainted(&curr_map, self.tainted.get(&next));
                self.tainted.insert(next, merged);
            }
        }
    }

    fn taints_of(&self, block: BlockId, method: MethodId) -> IndexSet<Taint> {
        self.tainted
            .get(&block)
            .and_then(|map| map.get(&method))
            .cloned()
            .unwrap_or_default()
    }

    fn locate_seeds(&self, seed: &SliceSeed) -> Vec<SeedPoint> {
        match seed {
            SliceSeed::MethodReturn {
                class_name,
                method_name,
            } => {
                let mut points = Vec::new();
                for (stmt_id, stmt) in self.project.walk_statements() {
                    if !stmt.is_assign() {
                        continue;
                    }
                    let Some(Value::InvokeExpr(expr)) = stmt.right_op() else {
                        continue;
                    };
                    if expr.class_name == *class_name
                        && expr.method_name == *method_name
                        && let Some(name) = stmt.left_op().and_then(Value::local_name)
                    {
                        points.push(SeedPoint {
                            block: self.project.stmt_block(stmt_id),
                            var_name: name.to_string(),
                        });
                    }
                }
                points
            }
            SliceSeed::MethodVar {
                class_name,
                method_name,
                method_params,
                var_name,
            } => {
                let key = MethodKey {
                    class_name: class_name.clone(),
                    name: method_name.clone(),
                    params: method_params.clone(),
                };
                let Some(method_id) = self.project.method_id(&key) else {
                    warn!("Input method not found: {key}");
                    return Vec::new();
                };
                let mut points = Vec::new();
                for (block_index, block) in
                    self.project.method(method_id).blocks.iter().enumerate()
                {
                    for stmt in &block.statements {
                        if (stmt.is_assign() || stmt.is_identity())
                            && stmt.left_op().and_then(Value::local_name)
                                == Some(var_name.as_str())
                        {
                            points.push(SeedPoint {
                                block: self.project.block_id_at(method_id, block_index),
                                var_name: var_name.clone(),
                            });
                        }
                    }
                }
                points
            }
            SliceSeed::ObjectField { .. } => {
                warn!("Forward slicing does not support object-field seeds");
                Vec::new()
            }
        }
    }

    /// The statements of `block` that use any of the tainted variables,
    /// plus the call sites passing a tainted value, paired with the tainted
    /// argument index.
    fn get_use_stmts(
        &self,
        block: BlockId,
        taints: &IndexSet<Taint>,
    ) -> (Vec<usize>, Vec<(usize, usize)>) {
        let statements = &self.project.block(block).statements;
        let mut assigns = Vec::new();
        let mut calls = Vec::new();

        for taint in taints {
            let Some(var) = taint.var_name() else {
                continue;
            };
            for (index, stmt) in statements.iter().enumerate() {
                if stmt.is_assign()
                    && let Some(Value::InvokeExpr(expr)) = stmt.right_op()
                {
                    if expr.base_name() == Some(var) {
                        // the receiver counts as argument zero
                        assigns.push(index);
                        calls.push((index, 0));
                    }
                    for (arg_index, arg) in expr.args.iter().enumerate() {
                        if arg.local_name() == Some(var) {
                            assigns.push(index);
                            calls.push((index, arg_index));
                        }
                    }
                } else if stmt.is_assign() {
                    match stmt.right_op() {
                        Some(Value::BinOp { value1, value2, .. }) => {
                            if value1.local_name() == Some(var) {
                                assigns.push(index);
                            }
                            if value2.local_name() == Some(var) {
                                assigns.push(index);
                            }
                        }
                        Some(Value::CastExpr { value, .. })
                        | Some(Value::LengthExpr { value }) => {
                            if value.local_name() == Some(var) {
                                assigns.push(index);
                            }
                        }
                        Some(Value::Local { name, .. }) => {
                            if name == var {
                                assigns.push(index);
                            }
                        }
                        Some(Value::InstanceFieldRef { base, field }) => {
                            if field.name == var {
                                assigns.push(index);
                            }
                            if base.local_name() == Some(var) {
                                assigns.push(index);
                            }
                        }
                        Some(Value::Phi { values }) => {
                            for (value, _) in values {
                                if value.local_name() == Some(var) {
                                    assigns.push(index);
                                }
                            }
                        }
                        Some(Value::ArrayRef { base, index: array_index }) => {
                            if base.local_name() == Some(var) {
                                assigns.push(index);
                            }
                            if array_index.local_name() == Some(var) {
                                assigns.push(index);
                            }
                        }
                        _ => {}
                    }
                } else if let Statement::Invoke(expr) = stmt {
                    let mut tainted_arg = false;
                    for (arg_index, arg) in expr.args.iter().enumerate() {
                        if arg.local_name() == Some(var) {
                            calls.push((index, arg_index));
                            tainted_arg = true;
                        }
                    }
                    // a tainted argument taints the receiver, and a tainted
                    // receiver taints the call
                    if tainted_arg && expr.base_name().is_some() {
                        assigns.push(index);
                    }
                    if expr.base_name() == Some(var) {
                        assigns.push(index);
                    }
                } else if let Some(condition) = stmt.condition() {
                    if condition_reads(condition, var) {
                        assigns.push(index);
                    }
                }
            }
        }
        (assigns, calls)
    }

    /// Conditionals of `block` reading a tainted value, paired with the
    /// blocks they branch to (control dependence).
    fn get_conditional_stmts(
        &self,
        block: BlockId,
        taints: &IndexSet<Taint>,
    ) -> (Vec<usize>, Vec<BlockId>) {
        let method_id = self.project.block_method(block);
        let method = self.project.method(method_id);
        let statements = &self.project.block(block).statements;
        let mut cond_stmts = Vec::new();
        let mut target_blocks = Vec::new();

        for taint in taints {
            let Some(var) = taint.var_name() else {
                continue;
            };
            for (index, stmt) in statements.iter().enumerate() {
                match stmt {
                    Statement::Switch {
                        key,
                        default_target,
                        lookup_values_and_targets,
                    } if key.local_name() == Some(var) => {
                        cond_stmts.push(index);
                        let mut labels = vec![*default_target];
                        labels.extend(lookup_values_and_targets.values().copied());
                        for label in labels {
                            match method.block_index_by_label(label) {
                                Ok(block_index) => target_blocks
                                    .push(self.project.block_id_at(method_id, block_index)),
                                Err(error) => warn!("Skipping switch target: {error}"),
                            }
                        }
                    }
                    Statement::If { condition, target } if condition_reads(condition, var) => {
                        cond_stmts.push(index);
                        match method.block_index_by_label(*target) {
                            Ok(block_index) => target_blocks
                                .push(self.project.block_id_at(method_id, block_index)),
                            Err(error) => warn!("Skipping branch target: {error}"),
                        }
                    }
                    _ => {}
                }
            }
        }
        (cond_stmts, target_blocks)
    }

    /// The variables set by the given use statements, under the enclosing
    /// method: assignment targets, field/array store bases, call receivers
    /// and arguments, and condition operands.
    fn get_set(&self, block: BlockId, stmt_indices: &[usize]) -> IndexSet<(String, MethodId)> {
        let method = self.project.block_method(block);
        let statements = &self.project.block(block).statements;
        let mut var_sets = IndexSet::new();

        for &index in stmt_indices {
            let stmt = &statements[index];
            if stmt.is_assign() {
                match stmt.left_op() {
                    Some(Value::Local { name, .. }) => {
                        var_sets.insert((name.clone(), method));
                    }
                    Some(Value::InstanceFieldRef { base, .. })
                    | Some(Value::ArrayRef { base, .. }) => {
                        if let Some(name) = base.local_name() {
                            var_sets.insert((name.to_string(), method));
                        }
                    }
                    _ => {}
                }
            }
            if stmt.is_invoke()
                && let Some(expr) = stmt.invoke_expr()
            {
                // the receiver is tainted even when the call returns a value
                if let Some(base) = expr.base_name() {
                    var_sets.insert((base.to_string(), method));
                }
                for arg in &expr.args {
                    if let Some(name) = arg.local_name() {
                        var_sets.insert((name.to_string(), method));
                    }
                }
            }
            if let Some(Value::BinOp { value1, value2, .. }) = stmt.condition() {
                if let Some(name) = value1.local_name() {
                    var_sets.insert((name.to_string(), method));
                } else if let Some(name) = value2.local_name() {
                    var_sets.insert((name.to_string(), method));
                }
            }
        }
        var_sets
    }

    /// Push tainted arguments into the parameter bindings of the resolved
    /// callees; results are keyed by the callee method.
    fn get_calls_set(
        &self,
        block: BlockId,
        call_stmts: &[(usize, usize)],
    ) -> IndexSet<(String, MethodId)> {
        let hierarchy = self.project.hierarchy();
        let container = self.project.block_method(block);
        let statements = &self.project.block(block).statements;
        let mut res = IndexSet::new();

        for &(index, arg_index) in call_stmts {
            let stmt = &statements[index];
            for target in hierarchy.resolve_stmt_targets(self.project, stmt, container) {
                // parameters are bound in the entry block
                let Ok(entry) = self.project.method(target).entry_block() else {
                    continue;
                };
                let mut var_name = None;
                for entry_stmt in &entry.statements {
                    if let Some(Value::ParamRef { index: param_index, .. }) = entry_stmt.right_op()
                        && *param_index == arg_index
                    {
                        var_name = entry_stmt
                            .left_op()
                            .and_then(Value::local_name)
                            .map(String::from);
                    }
                }
                if let Some(name) = var_name {
                    res.insert((name, target));
                }
            }
        }
        res
    }

    /// Field stores taint the field name under every method of the
    /// declaring class; fields accessed outside those methods are missed.
    fn get_fields_set(
        &self,
        block: BlockId,
        stmt_indices: &[usize],
    ) -> IndexSet<(String, MethodId)> {
        let statements = &self.project.block(block).statements;
        let mut field_sets = IndexSet::new();

        for &index in stmt_indices {
            let stmt = &statements[index];
            if !stmt.is_assign() {
                continue;
            }
            let Some(Value::InstanceFieldRef { field, .. }) = stmt.left_op() else {
                continue;
            };
            let Some(class_id) = self.project.class_id(&field.class_name) else {
                continue;
            };
            for method in &self.project.class(class_id).methods {
                if let Some(method_id) = self.project.method_id(&method.key()) {
                    field_sets.insert((field.name.clone(), method_id));
                }
            }
        }
        field_sets
    }
}

/// True when the condition expression reads the named local.
fn condition_reads(condition: &Value, var: &str) -> bool {
    match condition {
        Value::BinOp { value1, value2, .. } => {
            value1.local_name() == Some(var) || value2.local_name() == Some(var)
        }
        Value::CastExpr { value, .. } | Value::LengthExpr { value } => {
            value.local_name() == Some(var)
        }
        _ => false,
    }
}
