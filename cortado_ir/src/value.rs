use crate::method::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A field designator: the field name plus the class that declares it.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct FieldSignature {
    pub name: String,
    pub class_name: String,
}

impl FieldSignature {
    /// Create a new field signature.
    #[must_use]
    pub fn new<S: AsRef<str>>(name: S, class_name: S) -> Self {
        Self {
            name: name.as_ref().to_string(),
            class_name: class_name.as_ref().to_string(),
        }
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_name, self.name)
    }
}

/// The dispatch flavor of an invoke expression, as tagged by the lifter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum InvokeKind {
    /// Constructor, private or super call; the static target is exact.
    Special,
    /// Static call; the static target is exact.
    Static,
    /// Virtually dispatched instance call.
    Virtual,
    /// Interface call; dispatched over implementers.
    Interface,
}

/// A call site: static class/method/parameter signature, optional receiver
/// and an ordered argument list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    pub class_name: String,
    pub method_name: String,
    pub method_params: Vec<String>,
    pub base: Option<Box<Value>>,
    pub args: Vec<Value>,
}

impl InvokeExpr {
    /// The name of the receiver local, if the call has one.
    #[must_use]
    pub fn base_name(&self) -> Option<&str> {
        self.base.as_deref().and_then(Value::local_name)
    }
}

/// Display an invoke expression as `class.method(param, ...)`; this is the
/// serialization the cross-reference engine compares against.
impl fmt::Display for InvokeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.class_name,
            self.method_name,
            self.method_params.join(", ")
        )
    }
}

/// An expression of the three-address IR.
///
/// The right-hand side of an [`Assign`](crate::Statement::Assign) may be any
/// of these variants; most other positions are restricted by the lifter to
/// locals and constants, but the analyses only rely on the tags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A named local variable.
    Local { name: String, type_name: String },
    /// A literal constant.
    Const { value: String, type_name: String },
    /// A reference to the i-th parameter of the enclosing method.
    ParamRef { index: usize, type_name: String },
    /// The `this` reference of the enclosing method.
    ThisRef { type_name: String },
    /// The exception bound at the head of a handler block.
    CaughtExceptionRef,
    /// `base.field`
    InstanceFieldRef {
        base: Box<Value>,
        field: FieldSignature,
    },
    /// `Class.field`
    StaticFieldRef { field: FieldSignature },
    /// `base[index]`
    ArrayRef { base: Box<Value>, index: Box<Value> },
    /// `value1 op value2`
    BinOp {
        op: String,
        value1: Box<Value>,
        value2: Box<Value>,
    },
    /// `(cast_type) value`
    CastExpr { cast_type: String, value: Box<Value> },
    /// `value.length`
    LengthExpr { value: Box<Value> },
    /// `new type_name`
    NewExpr { type_name: String },
    /// SSA phi node; one value per incoming block label.
    Phi { values: Vec<(Value, Label)> },
    /// A call used as an expression.
    InvokeExpr(InvokeExpr),
}

impl Value {
    /// Convenience constructor for a local.
    #[must_use]
    pub fn local<S: AsRef<str>>(name: S, type_name: S) -> Self {
        Value::Local {
            name: name.as_ref().to_string(),
            type_name: type_name.as_ref().to_string(),
        }
    }

    /// Convenience constructor for a constant.
    #[must_use]
    pub fn constant<S: AsRef<str>>(value: S, type_name: S) -> Self {
        Value::Const {
            value: value.as_ref().to_string(),
            type_name: type_name.as_ref().to_string(),
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Value::Local { .. })
    }

    #[must_use]
    pub fn is_const(&self) -> bool {
        matches!(self, Value::Const { .. })
    }

    #[must_use]
    pub fn is_param_ref(&self) -> bool {
        matches!(self, Value::ParamRef { .. })
    }

    #[must_use]
    pub fn is_instance_field_ref(&self) -> bool {
        matches!(self, Value::InstanceFieldRef { .. })
    }

    #[must_use]
    pub fn is_static_field_ref(&self) -> bool {
        matches!(self, Value::StaticFieldRef { .. })
    }

    #[must_use]
    pub fn is_array_ref(&self) -> bool {
        matches!(self, Value::ArrayRef { .. })
    }

    #[must_use]
    pub fn is_binop(&self) -> bool {
        matches!(self, Value::BinOp { .. })
    }

    #[must_use]
    pub fn is_cast(&self) -> bool {
        matches!(self, Value::CastExpr { .. })
    }

    #[must_use]
    pub fn is_length(&self) -> bool {
        matches!(self, Value::LengthExpr { .. })
    }

    #[must_use]
    pub fn is_phi(&self) -> bool {
        matches!(self, Value::Phi { .. })
    }

    #[must_use]
    pub fn is_invoke(&self) -> bool {
        matches!(self, Value::InvokeExpr(..))
    }

    /// The name of this value if it is a local, `None` otherwise.
    #[must_use]
    pub fn local_name(&self) -> Option<&str> {
        match self {
            Value::Local { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The static type carried by this value, when the lifter records one.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Local { type_name, .. }
            | Value::Const { type_name, .. }
            | Value::ParamRef { type_name, .. }
            | Value::ThisRef { type_name }
            | Value::NewExpr { type_name } => Some(type_name),
            Value::CastExpr { cast_type, .. } => Some(cast_type),
            _ => None,
        }
    }

    /// The field designator of an instance or static field reference.
    #[must_use]
    pub fn field(&self) -> Option<&FieldSignature> {
        match self {
            Value::InstanceFieldRef { field, .. } | Value::StaticFieldRef { field } => Some(field),
            _ => None,
        }
    }

    /// The invoke expression if this value is a call.
    #[must_use]
    pub fn invoke_expr(&self) -> Option<&InvokeExpr> {
        match self {
            Value::InvokeExpr(expr) => Some(expr),
            _ => None,
        }
    }

    /// Collect this node and the nodes reachable through unary/binary
    /// operator edges (`value`, `value1`, `value2`).
    ///
    /// This deliberately does not descend into receiver, index or argument
    /// positions; cross-referencing treats those as opaque.
    pub fn ast_nodes<'a>(&'a self, nodes: &mut Vec<&'a Value>) {
        match self {
            Value::BinOp { value1, value2, .. } => {
                value1.ast_nodes(nodes);
                value2.ast_nodes(nodes);
            }
            Value::CastExpr { value, .. } | Value::LengthExpr { value } => {
                value.ast_nodes(nodes);
            }
            _ => {}
        }
        nodes.push(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoke_expr() -> InvokeExpr {
        InvokeExpr {
            kind: InvokeKind::Virtual,
            class_name: "MyClass".to_string(),
            method_name: "append".to_string(),
            method_params: vec![
                "java.lang.String".to_string(),
                "java.lang.String".to_string(),
            ],
            base: Some(Box::new(Value::local("r0", "MyClass"))),
            args: vec![Value::local("r1", "java.lang.String")],
        }
    }

    #[test]
    fn test_invoke_expr_display() {
        assert_eq!(
            "MyClass.append(java.lang.String, java.lang.String)",
            invoke_expr().to_string()
        );
    }

    #[test]
    fn test_invoke_expr_base_name() {
        assert_eq!(Some("r0"), invoke_expr().base_name());
    }

    #[test]
    fn test_local_name() {
        let local = Value::local("r1", "int");
        assert_eq!(Some("r1"), local.local_name());
        assert_eq!(None, Value::constant("0", "int").local_name());
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Some("int"), Value::local("r1", "int").type_name());
        let cast = Value::CastExpr {
            cast_type: "java.lang.Object".to_string(),
            value: Box::new(Value::local("r1", "int")),
        };
        assert_eq!(Some("java.lang.Object"), cast.type_name());
    }

    #[test]
    fn test_field() {
        let field_ref = Value::StaticFieldRef {
            field: FieldSignature::new("x", "F"),
        };
        let field = field_ref.field().expect("field");
        assert_eq!("x", field.name);
        assert_eq!("F", field.class_name);
    }

    #[test]
    fn test_ast_nodes_descends_operators() {
        let expr = Value::BinOp {
            op: "+".to_string(),
            value1: Box::new(Value::local("a", "int")),
            value2: Box::new(Value::CastExpr {
                cast_type: "int".to_string(),
                value: Box::new(Value::local("b", "long")),
            }),
        };
        let mut nodes = Vec::new();
        expr.ast_nodes(&mut nodes);
        let locals = nodes
            .iter()
            .filter_map(|value| value.local_name())
            .collect::<Vec<_>>();
        assert_eq!(vec!["a", "b"], locals);
    }

    #[test]
    fn test_ast_nodes_opaque_positions() {
        let expr = Value::ArrayRef {
            base: Box::new(Value::local("a", "int[]")),
            index: Box::new(Value::local("i", "int")),
        };
        let mut nodes = Vec::new();
        expr.ast_nodes(&mut nodes);
        assert_eq!(1, nodes.len());
    }
}
