//! Stable identifiers for IR entities.
//!
//! A [`Project`](crate::Project) assigns ids once at setup, in class-table
//! iteration order. Graphs and slicer state are keyed by ids instead of
//! references, which keeps the derived structures free of borrows into the
//! class table and makes enumeration order reproducible across runs.

use std::fmt;

/// Identifies a class within a project.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClassId(pub(crate) usize);

/// Identifies a method within a project.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MethodId(pub(crate) usize);

/// Identifies a basic block within a project.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BlockId(pub(crate) usize);

/// Identifies a statement within a project.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StmtId(pub(crate) usize);

impl ClassId {
    /// The position of this class in the class table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl MethodId {
    /// The setup-order position of this method.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl BlockId {
    /// The setup-order position of this block.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl StmtId {
    /// The setup-order position of this statement.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method#{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt#{}", self.0)
    }
}
