// SPDX-License-Identifier: MIT OR Apache-2.0

//! The one knob the spec requires to be configurable: the recursion-depth
//! guard used to detect a cyclic step-net (§4.5, §9).

/// Configuration for a single `Backward`/`AppendBackward` invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackwardConfig {
    /// Recursion depth at which a Recurrent step-net chain is treated as
    /// cyclic rather than merely deep.
    pub max_recursion_depth: usize,
}

impl Default for BackwardConfig {
    fn default() -> Self {
        BackwardConfig {
            max_recursion_depth: 1024,
        }
    }
}

impl BackwardConfig {
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }
}
