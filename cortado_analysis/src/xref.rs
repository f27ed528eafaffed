//! Cross-references: locate the syntactic uses of a named entity.

use crate::ids::{ClassId, MethodId, StmtId};
use crate::project::Project;
use cortado_ir::{MethodKey, Statement, Value};
use tracing::warn;

/// The entity a cross-reference query looks for.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum XRefQuery {
    /// Invocations of `class_name.method_name(params)`.
    Method {
        class_name: String,
        method_name: String,
        params: Vec<String>,
    },
    /// Uses of a class field, matched by `(field name, declaring class)` on
    /// field references and by `(name, type)` on locals.
    ClassVar { class_name: String, var_name: String },
    /// Uses of a local inside one method, matched by `(name, type)`.
    MethodVar {
        class_name: String,
        method_name: String,
        method_params: Vec<String>,
        var_name: String,
    },
}

/// Whether the referencing statement reads or writes the entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    Read,
    Write,
}

/// One cross-reference: the class, method and statement of the use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct XRef {
    pub class: ClassId,
    pub method: MethodId,
    pub stmt: StmtId,
    pub access: Access,
}

/// Find the cross-references matching `query`; see [`Project::x_ref`].
pub(crate) fn x_ref(project: &Project, query: &XRefQuery) -> Vec<XRef> {
    let (scope, entity, signature) = match query {
        XRefQuery::Method {
            class_name,
            method_name,
            params,
        } => {
            let signature = format!("{class_name}.{method_name}({})", params.join(", "));
            (None, None, Some(signature))
        }
        XRefQuery::ClassVar {
            class_name,
            var_name,
        } => (None, Some((class_name, var_name)), None),
        XRefQuery::MethodVar {
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
            let Some(method_id) = project.method_id(&key) else {
                warn!("Cross-reference method not found: {key}");
                return Vec::new();
            };
            (Some(method_id), Some((class_name, var_name)), None)
        }
    };

    let mut x_refs = Vec::new();
    for (stmt_id, stmt) in project.walk_statements() {
        let method = project.block_method(project.stmt_block(stmt_id));
        if scope.is_some_and(|scope| scope != method) {
            continue;
        }
        let class = project.stmt_class(stmt_id);
        let at = |access| XRef {
            class,
            method,
            stmt: stmt_id,
            access,
        };

        if stmt.is_invoke() {
            if invoke_matches(stmt, entity, signature.as_deref()) {
                x_refs.push(at(Access::Read));
            }
        } else if let Some((class_name, var_name)) = entity {
            for leaf in stmt.ast_nodes() {
                if leaf_matches(leaf, class_name, var_name) {
                    let access = if stmt.is_write_access(leaf) {
                        Access::Write
                    } else {
                        Access::Read
                    };
                    x_refs.push(at(access));
                }
            }
        }
    }
    x_refs
}

/// An invoke references a method when its serialized signature equals the
/// query, and a variable when an argument matches by `(name, type)`.
fn invoke_matches(
    stmt: &Statement,
    entity: Option<(&String, &String)>,
    signature: Option<&str>,
) -> bool {
    let Some(expr) = stmt.invoke_expr() else {
        return false;
    };
    if let Some(signature) = signature {
        return expr.to_string() == signature;
    }
    let Some((class_name, var_name)) = entity else {
        return false;
    };
    expr.args.iter().any(|arg| {
        arg.local_name() == Some(var_name.as_str()) && arg.type_name() == Some(class_name.as_str())
    })
}

fn leaf_matches(leaf: &Value, class_name: &str, var_name: &str) -> bool {
    if let Value::Local { name, type_name } = leaf
        && name == var_name
        && type_name == class_name
    {
        return true;
    }
    leaf.field()
        .is_some_and(|field| field.name == var_name && field.class_name == class_name)
}
