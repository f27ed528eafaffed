//! Reflection heuristic: guess the concrete classes involved in reflective
//! dispatch sites.
//!
//! Every receiver of a `java.lang.Object.getClass()` call is treated as a
//! reflection target. Each target is backward-sliced, and the tainted
//! values the slice surfaces are matched against the class table: a taint
//! naming a class resolves to that class (or, preferably, to one of its
//! fields when a field name is tainted alongside it). Collection-typed
//! field resolvents are chased through `add` calls on the collection, and
//! fields populated by stubbed or external helpers are evaluated through
//! [`call_stub`](crate::call_stub).

use crate::project::Project;
use crate::slicer::{SliceSeed, Taint};
use crate::stub::call_stub;
use cortado_ir::{Statement, Value};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

/// A reflective dispatch site: the receiver local of a `getClass()` call
/// and the method containing it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ReflectionTarget {
    pub class_name: String,
    pub method_name: String,
    pub method_params: Vec<String>,
    pub var_name: String,
}

impl ReflectionTarget {
    fn seed(&self) -> SliceSeed {
        SliceSeed::MethodVar {
            class_name: self.class_name.clone(),
            method_name: self.method_name.clone(),
            method_params: self.method_params.clone(),
            var_name: self.var_name.clone(),
        }
    }
}

/// A classified taint from a reflection slice.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Resolvent {
    /// The taint names a project class directly.
    Class(String),
    /// The taint names a field of a project class found in the same slice.
    Field {
        class_name: String,
        field_name: String,
        type_name: String,
    },
}

/// Reflection target resolution over one project.
#[derive(Debug)]
pub struct Heuristic<'a> {
    project: &'a Project,
    collection_types: IndexSet<String>,
    stubbed_methods: IndexSet<(String, String)>,
    result: IndexSet<String>,
    /// Resolved concrete class names per reflection target; populated by
    /// [`resolve_reflection_targets`](Heuristic::resolve_reflection_targets).
    pub results: IndexMap<ReflectionTarget, IndexSet<String>>,
}

impl<'a> Heuristic<'a> {
    /// Create a heuristic bound to the given project.
    #[must_use]
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            collection_types: IndexSet::from([
                "java.util.LinkedList".to_string(),
                "java.util.List".to_string(),
            ]),
            stubbed_methods: IndexSet::from([(
                "com.ainfosec.Util".to_string(),
                "getClassesForPackage".to_string(),
            )]),
            result: IndexSet::new(),
            results: IndexMap::new(),
        }
    }

    /// Resolve every reflection target of the project; results are stored
    /// per target in [`results`](Heuristic::results).
    pub fn resolve_reflection_targets(&mut self) {
        let targets = self.find_reflection_targets();
        for target in targets {
            self.result = IndexSet::new();
            let resolved = self.analyze_reflection_target(&target);
            let mut combined = self.result.clone();
            combined.extend(resolved);
            self.results.insert(target, combined);
        }
    }

    /// The receivers of `java.lang.Object.getClass()` calls.
    fn find_reflection_targets(&self) -> IndexSet<ReflectionTarget> {
        let mut targets = IndexSet::new();
        for (stmt_id, stmt) in self.project.walk_statements() {
            if !stmt.is_invoke() {
                continue;
            }
            let Some(expr) = stmt.invoke_expr() else {
                continue;
            };
            if expr.class_name != "java.lang.Object" || expr.method_name != "getClass" {
                continue;
            }
            let Some(base) = expr.base_name() else {
                continue;
            };
            let method = self.project.method(
                self.project.block_method(self.project.stmt_block(stmt_id)),
            );
            targets.insert(ReflectionTarget {
                class_name: method.class_name.clone(),
                method_name: method.name.clone(),
                method_params: method.params.clone(),
                var_name: base.to_string(),
            });
        }
        targets
    }

    fn analyze_reflection_target(&mut self, target: &ReflectionTarget) -> IndexSet<String> {
        debug!(
            "Analyzing reflection target {}.{} var {}",
            target.class_name, target.method_name, target.var_name
        );
        let mut slicer = self.project.backwardslicer();
        slicer.slice(&target.seed());

        // classify the tainted values: class names, then fields of those
        // classes when a field name is tainted in the same set
        let mut resolvents = IndexSet::new();
        for &block in slicer.affected_blocks() {
            let tainted = slicer.tainted_in_block(block);
            for taint in &tainted {
                match taint {
                    Taint::StaticField(field) => {
                        let Some(class_id) = self.project.class_id(&field.class_name) else {
                            continue;
                        };
                        let class = self.project.class(class_id);
                        let Some(declared) = class.fields.get(&field.name) else {
                            continue;
                        };
                        resolvents.insert(Resolvent::Field {
                            class_name: class.name.clone(),
                            field_name: field.name.clone(),
                            type_name: declared.type_name.clone(),
                        });
                    }
                    Taint::Var(name) => {
                        let Some(class_id) = self.project.class_id(name) else {
                            continue;
                        };
                        let class = self.project.class(class_id);
                        let mut field_found = false;
                        for other in &tainted {
                            let Some(other_name) = other.var_name() else {
                                continue;
                            };
                            if let Some(declared) = class.fields.get(other_name) {
                                resolvents.insert(Resolvent::Field {
                                    class_name: class.name.clone(),
                                    field_name: other_name.to_string(),
                                    type_name: declared.type_name.clone(),
                                });
                                field_found = true;
                                break;
                            }
                        }
                        if !field_found {
                            resolvents.insert(Resolvent::Class(class.name.clone()));
                        }
                    }
                }
            }
        }

        let mut res = IndexSet::new();
        for resolvent in resolvents {
            match resolvent {
                Resolvent::Class(name) => {
                    res.insert(name);
                }
                Resolvent::Field { ref type_name, .. } => {
                    if self.collection_types.contains(type_name) {
                        // chase what is stored into the collection
                        for store in self.find_stores_to_list(&resolvent) {
                            let classes = self.analyze_reflection_target(&store);
                            self.result.extend(classes);
                        }
                    }
                    res.extend(self.store_to_field(&resolvent));
                }
            }
        }
        res
    }

    /// Locals added to the collection-typed field: find `collection.add(x)`
    /// calls in the declaring class whose receiver was read from the field,
    /// and return each `x` as a new slicing target.
    fn find_stores_to_list(&self, resolvent: &Resolvent) -> IndexSet<ReflectionTarget> {
        let Resolvent::Field {
            class_name,
            field_name,
            ..
        } = resolvent
        else {
            return IndexSet::new();
        };
        let Some(class_id) = self.project.class_id(class_name) else {
            return IndexSet::new();
        };
        let class = self.project.class(class_id);
        if !class.fields.contains_key(field_name) {
            return IndexSet::new();
        }

        let mut resolvents = IndexSet::new();
        let mut getters: IndexSet<ReflectionTarget> = IndexSet::new();
        for method in &class.methods {
            for block in &method.blocks {
                for stmt in &block.statements {
                    if let Some(getter) = who_gets_field(field_name, class, method, stmt) {
                        getters.insert(getter);
                    }
                    let Some(Value::InvokeExpr(expr)) = stmt.right_op() else {
                        continue;
                    };
                    if !expr.class_name.contains("java.util.LinkedList")
                        || !expr.method_name.contains("add")
                    {
                        continue;
                    }
                    let Some(base) = expr.base_name() else {
                        continue;
                    };
                    for getter in &getters {
                        if !base.contains(getter.var_name.as_str()) {
                            continue;
                        }
                        // the argument reveals what is stored
                        for arg in &expr.args {
                            if let Some(name) = arg.local_name() {
                                resolvents.insert(ReflectionTarget {
                                    class_name: class.name.clone(),
                                    method_name: method.name.clone(),
                                    method_params: method.params.clone(),
                                    var_name: name.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }
        resolvents
    }

    /// Resolve the writers of the field: when the stored value flows from a
    /// call to a stubbed or external helper, evaluate the stub against the
    /// class table.
    fn store_to_field(&self, resolvent: &Resolvent) -> IndexSet<String> {
        let Resolvent::Field {
            class_name,
            field_name,
            ..
        } = resolvent
        else {
            return IndexSet::new();
        };
        let Some(class_id) = self.project.class_id(class_name) else {
            return IndexSet::new();
        };
        let class = self.project.class(class_id);
        if !class.fields.contains_key(field_name) {
            return IndexSet::new();
        }

        let mut resolved = IndexSet::new();
        for method in &class.methods {
            for block in &method.blocks {
                for stmt in &block.statements {
                    let Some(stored) = stored_local(field_name, stmt) else {
                        continue;
                    };
                    let mut slicer = self.project.backwardslicer();
                    slicer.slice(&SliceSeed::MethodVar {
                        class_name: class.name.clone(),
                        method_name: method.name.clone(),
                        method_params: method.params.clone(),
                        var_name: stored,
                    });
                    for &sl_block in slicer.affected_blocks() {
                        for sl_stmt in &self.project.block(sl_block).statements {
                            let Some(Value::InvokeExpr(expr)) = sl_stmt.right_op() else {
                                continue;
                            };
                            if self.is_defined(&expr.class_name, &expr.method_name)
                                && !self.is_stubbed(&expr.class_name, &expr.method_name)
                            {
                                continue;
                            }
                            match call_stub(&expr.method_name, self.project.classes(), &expr.args)
                            {
                                Some(classes) => resolved.extend(classes),
                                None => {
                                    warn!(
                                        "No stub for {}.{}",
                                        expr.class_name, expr.method_name
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
        resolved
    }

    fn is_stubbed(&self, class_name: &str, method_name: &str) -> bool {
        self.stubbed_methods
            .contains(&(class_name.to_string(), method_name.to_string()))
    }

    fn is_defined(&self, class_name: &str, method_name: &str) -> bool {
        let Some(class_id) = self.project.class_id(class_name) else {
            return false;
        };
        self.project
            .class(class_id)
            .methods
            .iter()
            .any(|method| method.name.contains(method_name))
    }
}

/// A local read from the named field: `local = obj.field`.
fn who_gets_field(
    field_name: &str,
    class: &cortado_ir::Class,
    method: &cortado_ir::Method,
    stmt: &Statement,
) -> Option<ReflectionTarget> {
    if !stmt.is_assign() {
        return None;
    }
    let Some(Value::InstanceFieldRef { field, .. }) = stmt.right_op() else {
        return None;
    };
    if !field.name.contains(field_name) {
        return None;
    }
    let local = stmt.left_op().and_then(Value::local_name)?;
    Some(ReflectionTarget {
        class_name: class.name.clone(),
        method_name: method.name.clone(),
        method_params: method.params.clone(),
        var_name: local.to_string(),
    })
}

/// The local stored into the named static field: `Class.field = local`.
fn stored_local(field_name: &str, stmt: &Statement) -> Option<String> {
    if !stmt.is_assign() {
        return None;
    }
    let Some(Value::StaticFieldRef { field }) = stmt.left_op() else {
        return None;
    };
    if !field.name.contains(field_name) {
        return None;
    }
    stmt.right_op()
        .and_then(Value::local_name)
        .map(String::from)
}
