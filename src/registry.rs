// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Gradient Factory (§4.2): a kind-keyed lookup producing gradient
//! descriptor lists. Realized as a write-once, read-only-after-build
//! registry passed by reference, rather than a process-global singleton —
//! see SPEC_FULL.md §1a/§9 for the rationale.

use crate::descriptor::OperatorDescriptor;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A gradient recipe: given one forward leaf descriptor, produce its
/// gradient descriptor list (§4.2).
pub trait GradientRecipe: Send + Sync {
    fn make_gradient(&self, descriptor: &OperatorDescriptor) -> Result<Vec<OperatorDescriptor>>;
}

impl<F> GradientRecipe for F
where
    F: Fn(&OperatorDescriptor) -> Result<Vec<OperatorDescriptor>> + Send + Sync,
{
    fn make_gradient(&self, descriptor: &OperatorDescriptor) -> Result<Vec<OperatorDescriptor>> {
        self(descriptor)
    }
}

/// Accumulates recipes before the registry is frozen. There is no way back
/// from [`GradientRegistry`] to a builder: once built, the registry is
/// immutable for the rest of its lifetime.
#[derive(Default)]
pub struct GradientRegistryBuilder {
    recipes: HashMap<String, Arc<dyn GradientRecipe + Send + Sync>>,
}

impl GradientRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the gradient recipe for one operator kind. Registering the
    /// same kind twice replaces the earlier recipe; tests must not rely on
    /// registration order (§9).
    pub fn register(
        mut self,
        kind: impl Into<String>,
        recipe: impl GradientRecipe + 'static,
    ) -> Self {
        self.recipes.insert(kind.into(), Arc::new(recipe));
        self
    }

    pub fn build(self) -> GradientRegistry {
        GradientRegistry {
            recipes: self.recipes,
        }
    }
}

/// A write-once, read-only map from operator kind to gradient-construction
/// recipe (§4.2, §9's "Global registry" note). `Send + Sync` so one instance
/// may be shared across threads each running independent `Backward` calls.
pub struct GradientRegistry {
    recipes: HashMap<String, Arc<dyn GradientRecipe + Send + Sync>>,
}

impl GradientRegistry {
    pub fn builder() -> GradientRegistryBuilder {
        GradientRegistryBuilder::new()
    }

    /// MakeGradient(op_desc) -> list of op_desc (§4.2). Fails with
    /// `UnregisteredGradient` if no recipe is registered for the kind.
    pub fn make_gradient(&self, descriptor: &OperatorDescriptor) -> Result<Vec<OperatorDescriptor>> {
        match self.recipes.get(&descriptor.kind) {
            Some(recipe) => recipe.make_gradient(descriptor),
            None => Err(Error::unregistered_gradient(&descriptor.kind)),
        }
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.recipes.contains_key(kind)
    }
}
