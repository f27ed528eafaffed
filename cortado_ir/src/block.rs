use crate::method::Label;
use crate::statement::Statement;
use serde::{Deserialize, Serialize};

/// A basic block: a maximal run of statements with a single entry and a
/// single exit (modulo exceptional edges).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// The label branch targets resolve to through the enclosing method.
    pub label: Label,
    pub statements: Vec<Statement>,
}

impl Block {
    /// Create a new block with the given label and statements.
    #[must_use]
    pub fn new(label: Label, statements: Vec<Statement>) -> Self {
        Self { label, statements }
    }

    /// The last statement of the block, if any.
    #[must_use]
    pub fn last_statement(&self) -> Option<&Statement> {
        self.statements.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_statement() {
        let block = Block::new(0, vec![Statement::Breakpoint, Statement::ReturnVoid]);
        assert_eq!(Some(&Statement::ReturnVoid), block.last_statement());
        assert_eq!(None, Block::default().last_statement());
    }
}
