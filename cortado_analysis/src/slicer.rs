//! Taint-style transitive-closure slicers over the interprocedural CFG.
//!
//! Both slicers walk the full CFG from a set of seed blocks with a FIFO
//! worklist, tracking per block which values are tainted and under which
//! method scope. The walks are bounded ([`BackwardSlicer::MAX_ITER`] total
//! dequeues per seed, [`BackwardSlicer::MAX_ITERS_BLOCK`] visits per block),
//! so results are may-be-incomplete under-approximations of a fixed point;
//! this is part of the contract.

mod backward;
mod forward;

pub use backward::BackwardSlicer;
pub use forward::ForwardSlicer;

use crate::ids::MethodId;
use cortado_ir::FieldSignature;
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Seed descriptor for a slice query.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SliceSeed {
    /// A local variable of one method: seeds every block of the method that
    /// assigns or identity-binds the named local.
    MethodVar {
        class_name: String,
        method_name: String,
        method_params: Vec<String>,
        var_name: String,
    },
    /// An object field assigned inside one method; reduced to the
    /// [`MethodVar`](SliceSeed::MethodVar) case on the stored local.
    ObjectField {
        class_name: String,
        method_name: String,
        method_params: Vec<String>,
        object_class: String,
        field_name: String,
    },
    /// Every block that assigns the return value of a call to
    /// `class_name.method_name` (forward slicing only).
    MethodReturn {
        class_name: String,
        method_name: String,
    },
}

/// A value tracked by a slicer within one block and method scope.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Taint {
    /// A local name. Identity bindings of `this` also surface the bound
    /// type name here, so class dependence shows up in the slice.
    Var(String),
    /// A static field designator.
    StaticField(FieldSignature),
}

impl Taint {
    pub(crate) fn var<S: Into<String>>(name: S) -> Self {
        Taint::Var(name.into())
    }

    /// The tracked name when this taint is a plain variable.
    #[must_use]
    pub fn var_name(&self) -> Option<&str> {
        match self {
            Taint::Var(name) => Some(name),
            Taint::StaticField(_) => None,
        }
    }
}

impl fmt::Display for Taint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Taint::Var(name) => write!(f, "{name}"),
            Taint::StaticField(field) => write!(f, "{field}"),
        }
    }
}

/// The taints one block carries, partitioned by the method the names belong
/// to: a block may track locals of its own method as well as of callees and
/// callers reached through it.
pub type TaintMap = IndexMap<MethodId, IndexSet<Taint>>;

/// Per-method union of two taint maps; entries present on one side only are
/// carried over unchanged.
pub(crate) fn merge_tainted(curr: &TaintMap, other: Option<&TaintMap>) -> TaintMap {
    let Some(other) = other else {
        return curr.clone();
    };
    let mut merged = other.clone();
    for (method, taints) in curr {
        merged
            .entry(*method)
            .or_default()
            .extend(taints.iter().cloned());
    }
    merged
}

pub(crate) fn contains_var(taints: &IndexSet<Taint>, name: &str) -> bool {
    taints.iter().any(|taint| taint.var_name() == Some(name))
}
