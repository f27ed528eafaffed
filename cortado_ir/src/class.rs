use crate::class_access_flags::ClassAccessFlags;
use crate::method::Method;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// The class table a lifter produces: fully-qualified name to class, in
/// lifter order.
///
/// Insertion order is observable (derived indices, slices and
/// cross-references enumerate it), which is why this is an `IndexMap`.
pub type ClassTable = IndexMap<String, Class>;

/// A field declaration: its type and the class that declares it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub type_name: String,
    pub declaring_class: String,
}

impl Field {
    /// Create a new field declaration.
    #[must_use]
    pub fn new<S: AsRef<str>>(type_name: S, declaring_class: S) -> Self {
        Self {
            type_name: type_name.as_ref().to_string(),
            declaring_class: declaring_class.as_ref().to_string(),
        }
    }
}

/// A class of the lifted program.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Class {
    /// Fully-qualified name, e.g. `java.lang.String`.
    pub name: String,
    /// Fully-qualified super class name; empty for the root.
    pub super_class: String,
    /// Fully-qualified names of the directly implemented interfaces.
    pub interfaces: IndexSet<String>,
    /// Declared fields, keyed by field name.
    pub fields: IndexMap<String, Field>,
    pub methods: Vec<Method>,
    pub access_flags: ClassAccessFlags,
}

impl Class {
    /// Check if the class is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    /// Check if the class is abstract.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::ABSTRACT)
    }

    /// Find a declared method by name and parameter types.
    #[must_use]
    pub fn method(&self, name: &str, params: &[String]) -> Option<&Method> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.params == params)
    }
}
