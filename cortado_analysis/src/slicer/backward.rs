use crate::ids::{BlockId, MethodId, StmtId};
use crate::project::Project;
use crate::slicer::{SliceSeed, Taint, TaintMap, contains_var, merge_tainted};
use ahash::{AHashMap, AHashSet};
use cortado_ir::{FieldSignature, MethodKey, Value};
use indexmap::IndexSet;
use std::collections::VecDeque;
use tracing::warn;

/// A seed block paired with the seeded local and the statement index of its
/// defining assignment.
#[derive(Clone, Debug)]
struct SeedPoint {
    block: BlockId,
    var_name: String,
    stmt_index: usize,
}

/// Backward slicer: starting from a seed value, walk back over the code
/// paths that affect it.
///
/// The walk follows the predecessor edges of the interprocedural CFG. In
/// each block it chains def-use backwards (statements assigning a tainted
/// local taint the values they use), expands call returns into callee
/// bodies, propagates receiver/argument taint through side-effectful calls,
/// and lifts tainted parameter bindings to the argument locals at every
/// call site of the enclosing method.
#[derive(Debug)]
pub struct BackwardSlicer<'a> {
    project: &'a Project,
    max_iter: usize,
    iters_per_block: AHashMap<BlockId, usize>,
    affected_blocks: IndexSet<BlockId>,
    tainted: AHashMap<BlockId, TaintMap>,
    seed_points: Vec<SeedPoint>,
}

impl<'a> BackwardSlicer<'a> {
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

    /// Every block that produced a new taint during the walk.
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
            let stmt_limit = (curr == point.block).then_some(point.stmt_index + 1);
            let passes = stmt_limit.unwrap_or(block_len).min(block_len);

            // each pass reruns the matching over the grown taint set; cheap
            // fixed point bounded by the statement count
            for _ in 0..passes {
                let curr_taints = self.taints_of(curr, curr_method);
                let set_stmts = self.get_set_stmts(curr, &curr_taints, stmt_limit);
                if !set_stmts.is_empty() {
                    self.affected_blocks.insert(curr);
                    let (new_use, call_assigns) = self.get_use(curr, &set_stmts);
                    {
                        let taints = self
                            .tainted
                            .entry(curr)
                            .or_default()
                            .entry(curr_method)
                            .or_default();
                        for taint in new_use {
                            taints.insert(taint);
                        }
                    }
                    for (ret_block, ret_var) in self.get_call_ret(curr, &call_assigns) {
                        let called = self.project.block_method(ret_block);
                        self.tainted
                            .entry(ret_block)
                            .or_default()
                            .entry(called)
                            .or_default()
                            .insert(Taint::var(ret_var));
                        queue.push_back(ret_block);
                    }
                }

                let curr_taints = self.taints_of(curr, curr_method);
                let call_taints = self.get_call_taints(curr, &curr_taints, stmt_limit);
                if !call_taints.is_empty() {
                    self.affected_blocks.insert(curr);
                    let taints = self
                        .tainted
                        .entry(curr)
                        .or_default()
                        .entry(curr_method)
                        .or_default();
                    for name in call_taints {
                        taints.insert(Taint::var(name));
                    }
                }
            }

            let curr_taints = self.taints_of(curr, curr_method);
            for (caller, var_name) in self.tainted_params(curr, &curr_taints) {
                self.tainted
                    .entry(curr)
                    .or_default()
                    .entry(caller)
                    .or_default()
                    .insert(Taint::var(var_name));
            }

            for prev in cfg.prev_blocks(curr) {
                queue.push_back(prev);
                let curr_map = self.tainted.get(&curr).cloned().unwrap_or_default();
                let merged = merge_tainted(&curr_map, self.tainted.get(&prev));
                self.tainted.insert(prev, merged);
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
            SliceSeed::MethodVar {
                class_name,
                method_name,
                method_params,
                var_name,
            } => {
                let Some(class_id) = self.project.class_id(class_name) else {
                    warn!("Input class not found: {class_name}");
                    return Vec::new();
                };
                let mut points = Vec::new();
                for method in &self.project.class(class_id).methods {
                    if method.name != *method_name || method.params != *method_params {
                        continue;
                    }
                    let Some(method_id) = self.project.method_id(&method.key()) else {
                        continue;
                    };
                    for (block_index, block) in method.blocks.iter().enumerate() {
                        for (stmt_index, stmt) in block.statements.iter().enumerate() {
                            if (stmt.is_assign() || stmt.is_identity())
                                && stmt.left_op().and_then(Value::local_name)
                                    == Some(var_name.as_str())
                            {
                                points.push(SeedPoint {
                                    block: self.project.block_id_at(method_id, block_index),
                                    var_name: var_name.clone(),
                                    stmt_index,
                                });
                            }
                        }
                    }
                }
                points
            }
            SliceSeed::ObjectField {
                class_name,
                method_name,
                method_params,
                object_class,
                field_name,
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
                let field = FieldSignature {
                    name: field_name.clone(),
                    class_name: object_class.clone(),
                };
                let mut points = Vec::new();
                for block in &self.project.method(method_id).blocks {
                    for stmt in &block.statements {
                        if !(stmt.is_assign() || stmt.is_identity()) {
                            continue;
                        }
                        let stores_field = stmt
                            .left_op()
                            .is_some_and(|left| left.is_instance_field_ref() && left.field() == Some(&field));
                        if !stores_field {
                            continue;
                        }
                        if let Some(local) = stmt.right_op().and_then(Value::local_name) {
                            let reduced = SliceSeed::MethodVar {
                                class_name: class_name.clone(),
                                method_name: method_name.clone(),
                                method_params: method_params.clone(),
                                var_name: local.to_string(),
                            };
                            points.extend(self.locate_seeds(&reduced));
                        } else {
                            warn!("Field {field} assigned from a non-local; skipping");
                        }
                    }
                }
                points
            }
            SliceSeed::MethodReturn { .. } => {
                warn!("Backward slicing does not support method-return seeds");
                Vec::new()
            }
        }
    }

    /// The statements of `block` (up to `stmt_limit`) that assign to any of
    /// the tainted variables: plain assignments, field stores matched by
    /// field name, array stores matched by base name, and identity bindings.
    fn get_set_stmts(
        &self,
        block: BlockId,
        taints: &IndexSet<Taint>,
        stmt_limit: Option<usize>,
    ) -> Vec<usize> {
        let statements = &self.project.block(block).statements;
        let limit = stmt_limit.unwrap_or(statements.len()).min(statements.len());
        let mut res = Vec::new();

        for taint in taints {
            let Some(var) = taint.var_name() else {
                continue;
            };
            for (index, stmt) in statements[..limit].iter().enumerate() {
                if stmt.is_assign() {
                    match stmt.left_op() {
                        Some(Value::Local { name, .. }) if name == var => res.push(index),
                        // field matching is by name only; fields with the
                        // same name on different classes alias
                        Some(Value::InstanceFieldRef { field, .. }) if field.name == var => {
                            res.push(index);
                        }
                        Some(Value::ArrayRef { base, .. })
                            if base.local_name() == Some(var) =>
                        {
                            res.push(index);
                        }
                        _ => {}
                    }
                }
                if stmt.is_identity()
                    && stmt.left_op().and_then(Value::local_name) == Some(var)
                {
                    res.push(index);
                }
            }
        }
        res
    }

    /// The values used by the given assignment statements, plus the subset
    /// of statements that assign the return value of a call.
    fn get_use(&self, block: BlockId, stmt_indices: &[usize]) -> (IndexSet<Taint>, Vec<usize>) {
        let statements = &self.project.block(block).statements;
        let mut used = IndexSet::new();
        let mut call_assigns = Vec::new();

        for &index in stmt_indices {
            let stmt = &statements[index];
            if stmt.is_assign()
                && let Some(Value::InvokeExpr(expr)) = stmt.right_op()
            {
                if let Some(base) = expr.base_name() {
                    used.insert(Taint::var(base));
                }
                for arg in &expr.args {
                    if let Some(name) = arg.local_name() {
                        used.insert(Taint::var(name));
                    }
                }
                call_assigns.push(index);
            } else if stmt.is_assign() {
                match stmt.right_op() {
                    Some(Value::BinOp { value1, value2, .. }) => {
                        for value in [value1, value2] {
                            if let Some(name) = value.local_name() {
                                used.insert(Taint::var(name));
                            }
                        }
                    }
                    Some(Value::CastExpr { value, .. }) => {
                        if let Some(name) = value.local_name() {
                            used.insert(Taint::var(name));
                        }
                    }
                    Some(Value::Local { name, .. }) => {
                        used.insert(Taint::var(name.clone()));
                    }
                    Some(Value::InstanceFieldRef { base, field }) => {
                        if let Some(name) = base.local_name() {
                            used.insert(Taint::var(name));
                        }
                        used.insert(Taint::var(field.name.clone()));
                    }
                    Some(Value::Phi { values }) => {
                        for (value, _) in values {
                            if let Some(name) = value.local_name() {
                                used.insert(Taint::var(name));
                            }
                        }
                    }
                    Some(Value::StaticFieldRef { field }) => {
                        used.insert(Taint::StaticField(field.clone()));
                    }
                    _ => {}
                }
            } else if stmt.is_identity() {
                // when `this` is in the slice, surface the bound type so the
                // class dependence is visible
                if let Some(type_name) = stmt.right_op().and_then(Value::type_name) {
                    used.insert(Taint::var(type_name));
                }
            }
        }
        (used, call_assigns)
    }

    /// For each call assignment, the blocks of the resolved targets that
    /// return a local, paired with the returned name.
    fn get_call_ret(&self, block: BlockId, call_assigns: &[usize]) -> Vec<(BlockId, String)> {
        let hierarchy = self.project.hierarchy();
        let container = self.project.block_method(block);
        let statements = &self.project.block(block).statements;
        let mut res = Vec::new();

        for &index in call_assigns {
            let stmt = &statements[index];
            for target in hierarchy.resolve_stmt_targets(self.project, stmt, container) {
                for (block_index, target_block) in
                    self.project.method(target).blocks.iter().enumerate()
                {
                    for target_stmt in &target_block.statements {
                        if target_stmt.is_ret()
                            && let Some(name) =
                                target_stmt.return_value().and_then(Value::local_name)
                        {
                            res.push((
                                self.project.block_id_at(target, block_index),
                                name.to_string(),
                            ));
                        }
                    }
                }
            }
        }
        res
    }

    /// Receiver-to-argument taint through side-effectful calls: for each
    /// standalone invoke, a tainted receiver taints every argument and a
    /// tainted argument taints the receiver.
    fn get_call_taints(
        &self,
        block: BlockId,
        taints: &IndexSet<Taint>,
        stmt_limit: Option<usize>,
    ) -> Vec<String> {
        let statements = &self.project.block(block).statements;
        let limit = stmt_limit.unwrap_or(statements.len()).min(statements.len());
        let mut res = Vec::new();

        for stmt in &statements[..limit] {
            if !stmt.is_invoke() || stmt.is_assign() {
                continue;
            }
            let Some(expr) = stmt.invoke_expr() else {
                continue;
            };
            if let Some(base) = expr.base_name()
                && contains_var(taints, base)
            {
                for arg in &expr.args {
                    if let Some(name) = arg.local_name() {
                        res.push(name.to_string());
                    }
                }
            }
            for arg in &expr.args {
                if let Some(name) = arg.local_name()
                    && contains_var(taints, name)
                    && let Some(base) = expr.base_name()
                {
                    res.push(base.to_string());
                }
            }
        }
        res
    }

    /// For each tainted parameter binding in `block`, the callers of the
    /// enclosing method paired with the argument local at each call site.
    fn tainted_params(&self, block: BlockId, taints: &IndexSet<Taint>) -> Vec<(MethodId, String)> {
        let method = self.project.block_method(block);
        let mut res = Vec::new();

        for stmt in &self.project.block(block).statements {
            let Some(Value::ParamRef { index, .. }) = stmt.right_op() else {
                continue;
            };
            let Some(left_name) = stmt.left_op().and_then(Value::local_name) else {
                continue;
            };
            if !contains_var(taints, left_name) {
                continue;
            }
            let callgraph = self.project.callgraph();
            for caller in callgraph.prev(method) {
                for call in self.get_method_calls(caller, method) {
                    let Some(expr) = self.project.stmt(call).invoke_expr() else {
                        continue;
                    };
                    if let Some(name) = expr.args.get(*index).and_then(Value::local_name) {
                        res.push((caller, name.to_string()));
                    }
                }
            }
        }
        res
    }

    /// The invoke statements of `caller` whose resolved targets include
    /// `called`.
    fn get_method_calls(&self, caller: MethodId, called: MethodId) -> Vec<StmtId> {
        let hierarchy = self.project.hierarchy();
        let mut res = Vec::new();

        for block_id in self.project.method_block_ids(caller) {
            for (stmt_index, stmt) in self.project.block(block_id).statements.iter().enumerate() {
                if !stmt.is_invoke() {
                    continue;
                }
                let targets = hierarchy.resolve_stmt_targets(self.project, stmt, caller);
                if targets.contains(&called) {
                    res.push(self.project.stmt_id_at(block_id, stmt_index));
                }
            }
        }
        res
    }
}
