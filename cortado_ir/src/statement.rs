use crate::method::Label;
use crate::value::{InvokeExpr, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A statement of the three-address IR.
///
/// Statements are the unit the analyses classify; a statement either moves a
/// value, transfers control, or calls out. An [`Assign`](Statement::Assign)
/// whose right-hand side is an [`InvokeExpr`](Value::InvokeExpr) counts as
/// both an assignment and an invoke for classification purposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `left = right`
    Assign { left: Value, right: Value },
    /// Parameter or `this` binding, e.g. `r0 := @this`.
    Identity { left: Value, right: Value },
    /// A standalone call whose result is discarded.
    Invoke(InvokeExpr),
    /// Unconditional jump to the block at `target`.
    Goto { target: Label },
    /// Conditional jump to the block at `target`.
    If { condition: Value, target: Label },
    /// Multi-way jump over `key`.
    Switch {
        key: Value,
        default_target: Label,
        lookup_values_and_targets: IndexMap<i64, Label>,
    },
    /// Return a value to the caller.
    Return { value: Value },
    /// Return from a `void` method.
    ReturnVoid,
    /// Raise an exception.
    Throw { value: Value },
    /// Monitor (lock) entry.
    EnterMonitor { value: Value },
    /// Monitor (lock) exit.
    ExitMonitor { value: Value },
    /// Debugger breakpoint.
    Breakpoint,
}

impl Statement {
    #[must_use]
    pub fn is_assign(&self) -> bool {
        matches!(self, Statement::Assign { .. })
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        matches!(self, Statement::Identity { .. })
    }

    /// An invoke is either a standalone call or an assignment from a call.
    #[must_use]
    pub fn is_invoke(&self) -> bool {
        match self {
            Statement::Invoke(..) => true,
            Statement::Assign { right, .. } => right.is_invoke(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_jump(&self) -> bool {
        matches!(self, Statement::Goto { .. })
    }

    #[must_use]
    pub fn is_condition(&self) -> bool {
        matches!(self, Statement::If { .. })
    }

    #[must_use]
    pub fn is_switch(&self) -> bool {
        matches!(self, Statement::Switch { .. })
    }

    /// `Return` and `ReturnVoid` statements.
    #[must_use]
    pub fn is_ret(&self) -> bool {
        matches!(self, Statement::Return { .. } | Statement::ReturnVoid)
    }

    /// Statement kinds the control-flow construction neither cuts nor links:
    /// throws, monitor bracketing and breakpoints.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(
            self,
            Statement::Throw { .. }
                | Statement::EnterMonitor { .. }
                | Statement::ExitMonitor { .. }
                | Statement::Breakpoint
        )
    }

    /// The call expression of an invoke statement, standalone or embedded in
    /// an assignment.
    #[must_use]
    pub fn invoke_expr(&self) -> Option<&InvokeExpr> {
        match self {
            Statement::Invoke(expr) => Some(expr),
            Statement::Assign { right, .. } => right.invoke_expr(),
            _ => None,
        }
    }

    /// The left-hand side of an assignment or identity binding.
    #[must_use]
    pub fn left_op(&self) -> Option<&Value> {
        match self {
            Statement::Assign { left, .. } | Statement::Identity { left, .. } => Some(left),
            _ => None,
        }
    }

    /// The right-hand side of an assignment or identity binding.
    #[must_use]
    pub fn right_op(&self) -> Option<&Value> {
        match self {
            Statement::Assign { right, .. } | Statement::Identity { right, .. } => Some(right),
            _ => None,
        }
    }

    /// The condition of an `If` statement.
    #[must_use]
    pub fn condition(&self) -> Option<&Value> {
        match self {
            Statement::If { condition, .. } => Some(condition),
            _ => None,
        }
    }

    /// The value returned by a `Return` statement.
    #[must_use]
    pub fn return_value(&self) -> Option<&Value> {
        match self {
            Statement::Return { value } => Some(value),
            _ => None,
        }
    }

    /// Collect the expression nodes reachable from this statement for
    /// cross-referencing: both sides of moves, conditions, and returned or
    /// thrown values.
    #[must_use]
    pub fn ast_nodes(&self) -> Vec<&Value> {
        let mut nodes = Vec::new();
        match self {
            Statement::Assign { left, right } | Statement::Identity { left, right } => {
                right.ast_nodes(&mut nodes);
                left.ast_nodes(&mut nodes);
            }
            Statement::If { condition, .. } => condition.ast_nodes(&mut nodes),
            Statement::Return { value }
            | Statement::Throw { value }
            | Statement::EnterMonitor { value }
            | Statement::ExitMonitor { value } => value.ast_nodes(&mut nodes),
            _ => {}
        }
        nodes
    }

    /// True when `value` occurs on the left-hand-side path of this statement.
    #[must_use]
    pub fn is_write_access(&self, value: &Value) -> bool {
        let Some(left) = self.left_op() else {
            return false;
        };
        let mut nodes = Vec::new();
        left.ast_nodes(&mut nodes);
        nodes.iter().any(|node| *node == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::InvokeKind;

    fn invoke_expr() -> InvokeExpr {
        InvokeExpr {
            kind: InvokeKind::Static,
            class_name: "Example".to_string(),
            method_name: "func".to_string(),
            method_params: vec!["java.lang.String".to_string()],
            base: None,
            args: vec![Value::local("r1", "java.lang.String")],
        }
    }

    #[test]
    fn test_assign_from_invoke_is_both() {
        let stmt = Statement::Assign {
            left: Value::local("r0", "java.lang.String"),
            right: Value::InvokeExpr(invoke_expr()),
        };
        assert!(stmt.is_assign());
        assert!(stmt.is_invoke());
        assert_eq!(Some("func"), stmt.invoke_expr().map(|e| e.method_name.as_str()));
    }

    #[test]
    fn test_standalone_invoke() {
        let stmt = Statement::Invoke(invoke_expr());
        assert!(stmt.is_invoke());
        assert!(!stmt.is_assign());
    }

    #[test]
    fn test_is_ret() {
        assert!(Statement::ReturnVoid.is_ret());
        let ret = Statement::Return {
            value: Value::local("r0", "int"),
        };
        assert!(ret.is_ret());
        assert_eq!(Some("r0"), ret.return_value().and_then(Value::local_name));
        assert_eq!(None, Statement::ReturnVoid.return_value());
    }

    #[test]
    fn test_is_unknown() {
        let throw = Statement::Throw {
            value: Value::local("r0", "java.lang.Throwable"),
        };
        assert!(throw.is_unknown());
        assert!(Statement::Breakpoint.is_unknown());
        assert!(!Statement::ReturnVoid.is_unknown());
    }

    #[test]
    fn test_write_access() {
        let field_ref = Value::InstanceFieldRef {
            base: Box::new(Value::local("r0", "F")),
            field: crate::FieldSignature::new("x", "F"),
        };
        let stmt = Statement::Assign {
            left: field_ref.clone(),
            right: Value::local("r1", "int"),
        };
        assert!(stmt.is_write_access(&field_ref));
        assert!(!stmt.is_write_access(&Value::local("r1", "int")));
    }
}
