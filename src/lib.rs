// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Backward-Graph Construction
//!
//! This crate synthesizes a backward (gradient) computation graph from a
//! forward computation graph built out of *operators* over named
//! *variables*. It is purely a graph-to-graph transformation: it never
//! executes an operator, allocates a tensor, or computes a numerical value.
//! It consumes a registry that knows, for each forward operator kind, how
//! to produce that operator's gradient descriptor(s), and it emits a
//! topologically valid sequence of gradient operators (possibly nested)
//! plus auxiliary bookkeeping operators for zero-filling missing upstream
//! gradients and for accumulating gradients with more than one writer.
//!
//! ## Design Principles
//!
//! * The transformation does not use interior mutability. The no-grad set
//!   and the unique-id counter are threaded explicitly by mutable
//!   reference down a single call stack, the way this crate's lineage
//!   threads its tape (`graph`/`g`) through every differentiable
//!   operation.
//! * The gradient registry is built once via [`GradientRegistryBuilder`]
//!   and then passed around by shared reference — write-once, read-only,
//!   no locking on the hot path.
//! * Fallible operations return [`Result`]; nothing panics on malformed
//!   input from a caller.
//!
//! ## Quick Start
//!
//! ```
//! use backward_graph::prelude::*;
//!
//! let registry = GradientRegistry::builder()
//!     .register("mul", |d: &OperatorDescriptor| {
//!         let a = d.input("X")?[0].clone();
//!         let b = d.input("Y")?[0].clone();
//!         let c = d.output("Out")?[0].clone();
//!         Ok(vec![OperatorDescriptor::new("mul_grad")
//!             .with_input("X", vec![a.clone()])
//!             .with_input("Y", vec![b.clone()])
//!             .with_input(grad_name("Out"), vec![grad_name(&c)])
//!             .with_output(grad_name("X"), vec![grad_name(&a)])
//!             .with_output(grad_name("Y"), vec![grad_name(&b)])])
//!     })
//!     .build();
//!
//! let forward = OpNode::leaf(
//!     OperatorDescriptor::new("mul")
//!         .with_input("X", vec!["a".into()])
//!         .with_input("Y", vec!["b".into()])
//!         .with_output("Out", vec!["c".into()]),
//! );
//!
//! let backward = BackwardBuilder::new(&registry).backward(&forward, &[])?;
//! # Ok::<(), backward_graph::Error>(())
//! ```

/// Error and result types.
#[macro_use]
pub mod error;

/// Pure naming rules: GradName, ZeroName, StripGrad, RenameAlias (§4.1).
pub mod naming;

/// The operator descriptor data model (§3).
pub mod descriptor;

/// Operator nodes: leaves and composites (§3).
pub mod node;

/// The Gradient Factory: a write-once registry of gradient recipes (§4.2).
pub mod registry;

/// The No-Grad Propagator (§4.3).
pub mod nograd;

/// Configuration for a Backward invocation.
pub mod config;

/// The Backward Builder: the orchestrator (§4.4).
pub mod backward;

/// Reserved kind for the leaf the No-Grad Propagator schedules ahead of a
/// gradient operator that needs an otherwise-missing upstream gradient.
pub const FILL_ZEROS_KIND: &str = "fill-zeros-like";
/// Reserved kind for the leaf the Builder inserts to resolve a
/// duplicate-writer collision.
pub const ACCUMULATE_KIND: &str = "accumulate";

pub use error::{Error, Result};

/// Everything a caller building a gradient registry and invoking
/// `Backward`/`AppendBackward` typically needs.
pub mod prelude {
    pub use crate::backward::BackwardBuilder;
    pub use crate::config::BackwardConfig;
    pub use crate::descriptor::{AttrValue, OperatorDescriptor, VarName};
    pub use crate::naming::{grad_name, rename_alias, strip_grad, zero_name};
    pub use crate::node::{Composite, LeafOp, OpNode};
    pub use crate::nograd::NoGradSet;
    pub use crate::registry::{GradientRecipe, GradientRegistry, GradientRegistryBuilder};
    pub use crate::{Error, Result};
}
