use crate::block::Block;
use crate::error::{Error, Result};
use crate::method_access_flags::MethodAccessFlags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch-target label of a block within its method.
pub type Label = u32;

/// The identity of a method: `(class_name, name, params)`.
///
/// Overloads differ in `params`, so the full triple is required to address a
/// method uniquely within a project.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct MethodKey {
    pub class_name: String,
    pub name: String,
    pub params: Vec<String>,
}

impl MethodKey {
    /// Create a new method key.
    #[must_use]
    pub fn new<S: AsRef<str>>(class_name: S, name: S, params: &[S]) -> Self {
        Self {
            class_name: class_name.as_ref().to_string(),
            name: name.as_ref().to_string(),
            params: params.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.class_name,
            self.name,
            self.params.join(", ")
        )
    }
}

/// A method body in statement/block form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub class_name: String,
    pub name: String,
    pub params: Vec<String>,
    pub access_flags: MethodAccessFlags,
    pub blocks: Vec<Block>,
    /// Label to block-index map; every branch/switch target label used inside
    /// the method must be present.
    pub block_labels: IndexMap<Label, usize>,
    /// Exceptional control flow: block index to the indices of its
    /// exceptional predecessors.
    pub exceptional_preds: IndexMap<usize, Vec<usize>>,
}

impl Method {
    /// The `(class, name, params)` identity of this method.
    #[must_use]
    pub fn key(&self) -> MethodKey {
        MethodKey {
            class_name: self.class_name.clone(),
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }

    /// Check if the method is abstract.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }

    /// Check if the method is native.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::NATIVE)
    }

    /// Check if the method is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    /// Resolve a branch target label to its block index.
    ///
    /// # Errors
    /// if the label is not mapped by this method.
    pub fn block_index_by_label(&self, label: Label) -> Result<usize> {
        self.block_labels
            .get(&label)
            .copied()
            .ok_or_else(|| Error::UnknownLabel {
                label,
                method: self.key().to_string(),
            })
    }

    /// Resolve a branch target label to its block.
    ///
    /// # Errors
    /// if the label is not mapped by this method.
    pub fn block_by_label(&self, label: Label) -> Result<&Block> {
        let index = self.block_index_by_label(label)?;
        self.blocks
            .get(index)
            .ok_or_else(|| Error::UnknownLabel {
                label,
                method: self.key().to_string(),
            })
    }

    /// The entry block of the method.
    ///
    /// # Errors
    /// if the method has no blocks (abstract or native bodies).
    pub fn entry_block(&self) -> Result<&Block> {
        self.blocks
            .first()
            .ok_or_else(|| Error::EmptyMethod(self.key().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Statement;

    fn method() -> Method {
        Method {
            class_name: "Example".to_string(),
            name: "run".to_string(),
            params: vec!["int".to_string()],
            access_flags: MethodAccessFlags::PUBLIC,
            blocks: vec![Block::new(0, vec![Statement::ReturnVoid])],
            block_labels: IndexMap::from([(0, 0)]),
            exceptional_preds: IndexMap::new(),
        }
    }

    #[test]
    fn test_key_display() {
        assert_eq!("Example.run(int)", method().key().to_string());
    }

    #[test]
    fn test_block_by_label() -> Result<()> {
        let method = method();
        let block = method.block_by_label(0)?;
        assert_eq!(1, block.statements.len());
        assert_eq!(
            Err(Error::UnknownLabel {
                label: 9,
                method: "Example.run(int)".to_string()
            }),
            method.block_by_label(9).map(|_| ())
        );
        Ok(())
    }

    #[test]
    fn test_entry_block() {
        assert!(method().entry_block().is_ok());
        let empty = Method {
            blocks: Vec::new(),
            ..method()
        };
        assert_eq!(
            Err(Error::EmptyMethod("Example.run(int)".to_string())),
            empty.entry_block().map(|_| ())
        );
    }
}
