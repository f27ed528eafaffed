//! # Cortado IR
//!
//! Typed three-address intermediate representation for an object-oriented
//! program lifted from Java-like bytecode into statement/block form.
//!
//! The IR is the contract between a bytecode lifter (external to this
//! workspace) and the analyses in `cortado_analysis`: classes own methods,
//! methods own basic blocks, and blocks own statements. Statements and
//! expressions are tagged sum types; the classification predicates the
//! analyses rely on (`is_invoke`, `is_assign`, ...) are tag tests exposed as
//! inherent methods.
//!
//! # Examples
//!
//! ```rust
//! use cortado_ir::{Statement, Value};
//!
//! let stmt = Statement::Assign {
//!     left: Value::local("r0", "java.lang.String"),
//!     right: Value::local("r1", "java.lang.String"),
//! };
//! assert!(stmt.is_assign());
//! assert!(!stmt.is_invoke());
//! ```
//!
//! ## Safety
//!
//! This crate uses `#![forbid(unsafe_code)]` to ensure everything is
//! implemented in 100% safe Rust.

#![forbid(unsafe_code)]
#![allow(dead_code)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::unwrap_used)]

mod block;
mod class;
mod class_access_flags;
mod error;
mod method;
mod method_access_flags;
mod statement;
mod value;

pub use block::Block;
pub use class::{Class, ClassTable, Field};
pub use class_access_flags::ClassAccessFlags;
pub use error::{Error, Result};
pub use method::{Label, Method, MethodKey};
pub use method_access_flags::MethodAccessFlags;
pub use statement::Statement;
pub use value::{FieldSignature, InvokeExpr, InvokeKind, Value};
