//! # Cortado Analysis
//!
//! Whole-program static analyses over the Cortado IR, for security and
//! reverse-engineering tooling that needs to answer questions such as "which
//! code influences this value?", "which methods may this call site reach?",
//! and "where is this entity referenced?".
//!
//! A [`Project`] wraps a lifted [`ClassTable`](cortado_ir::ClassTable) and
//! lazily materializes the derived structures:
//!
//! - [`Hierarchy`] — class-subclass index and virtual dispatch resolution;
//! - [`CfgMethod`] / [`CfgFull`] — intra-method and interprocedural
//!   control-flow graphs over basic blocks;
//! - [`CallGraph`] — method-level call graph with call-site indexing;
//! - [`BackwardSlicer`] / [`ForwardSlicer`] — taint-style transitive-closure
//!   walks over the interprocedural CFG;
//! - [`Heuristic`] — reflective dispatch target resolution built on the
//!   backward slicer;
//! - cross-references via [`Project::x_ref`].
//!
//! The analyses are deliberately heuristic and bounded: slicer results are
//! may-be-incomplete under-approximations of a fixed point, and external
//! references (call targets outside the class table) are skipped with a
//! warning rather than failing the analysis.
//!
//! # Examples
//!
//! ```rust
//! use cortado_analysis::{Project, SliceSeed};
//! use cortado_ir::ClassTable;
//!
//! let project = Project::from_classes(ClassTable::new());
//! let mut slicer = project.backwardslicer();
//! slicer.slice(&SliceSeed::MethodVar {
//!     class_name: "Example".to_string(),
//!     method_name: "main".to_string(),
//!     method_params: vec!["java.lang.String[]".to_string()],
//!     var_name: "r0".to_string(),
//! });
//! assert!(slicer.affected_blocks().is_empty());
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

mod callgraph;
mod cfg;
mod error;
mod heuristic;
mod hierarchy;
mod ids;
mod project;
mod slicer;
mod stub;
mod xref;

pub use callgraph::CallGraph;
pub use cfg::{BlockGraph, CfgFull, CfgMethod};
pub use error::{Error, Result};
pub use heuristic::{Heuristic, ReflectionTarget, Resolvent};
pub use hierarchy::Hierarchy;
pub use ids::{BlockId, ClassId, MethodId, StmtId};
pub use project::{Lifter, Project, ProjectOptions};
pub use slicer::{BackwardSlicer, ForwardSlicer, SliceSeed, Taint, TaintMap};
pub use stub::call_stub;
pub use xref::{Access, XRef, XRefQuery};
