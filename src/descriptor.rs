// SPDX-License-Identifier: MIT OR Apache-2.0

//! The atom the transformation manipulates: a kind string, ordered
//! input/output slot maps, and an opaque attribute bag.

use crate::error::{Error, Result};
use crate::naming::EMPTY_NAME;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An opaque non-empty string identifying a tensor slot.
pub type VarName = String;

/// Ordered mapping slot -> list of variable names.
///
/// `BTreeMap` gives deterministic iteration order, which the Builder relies
/// on when collecting output names for duplicate-writer detection.
pub type SlotMap = BTreeMap<String, Vec<VarName>>;

/// A single attribute value in an operator's opaque attribute bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Ints(Vec<i64>),
}

/// An opaque attribute bag, passed through unchanged by every component.
pub type AttrBag = BTreeMap<String, AttrValue>;

/// The record the whole transformation manipulates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperatorDescriptor {
    pub kind: String,
    pub inputs: SlotMap,
    pub outputs: SlotMap,
    pub attrs: AttrBag,
}

impl OperatorDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        OperatorDescriptor {
            kind: kind.into(),
            inputs: SlotMap::new(),
            outputs: SlotMap::new(),
            attrs: AttrBag::new(),
        }
    }

    pub fn with_input(mut self, slot: impl Into<String>, names: Vec<VarName>) -> Self {
        self.inputs.insert(slot.into(), names);
        self
    }

    pub fn with_output(mut self, slot: impl Into<String>, names: Vec<VarName>) -> Self {
        self.outputs.insert(slot.into(), names);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Names bound to an input slot, or `MalformedDescriptor` if the slot is absent.
    pub fn input(&self, slot: &str) -> Result<&[VarName]> {
        self.inputs
            .get(slot)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::malformed_descriptor(&self.kind, slot))
    }

    /// Names bound to an output slot, or `MalformedDescriptor` if the slot is absent.
    pub fn output(&self, slot: &str) -> Result<&[VarName]> {
        self.outputs
            .get(slot)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::malformed_descriptor(&self.kind, slot))
    }

    /// All variable names bound to every input slot, in slot order.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.values().flatten().map(String::as_str)
    }

    /// All variable names bound to every output slot, in slot order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.values().flatten().map(String::as_str)
    }

    /// Replace every occurrence of `old` with `new` across input and output
    /// slot maps, including when the same descriptor both reads and writes it.
    pub fn rename(&mut self, old: &str, new: &str) {
        for names in self.inputs.values_mut().chain(self.outputs.values_mut()) {
            for name in names.iter_mut() {
                if name == old {
                    *name = new.to_string();
                }
            }
        }
    }
}

/// Builds the `fill-zeros-like` leaf scheduled by the No-Grad Propagator
/// ahead of a gradient operator that needs an otherwise-missing upstream
/// gradient (§4.3).
pub fn fill_zeros_like(input_var: &str, output_var: &str) -> OperatorDescriptor {
    OperatorDescriptor::new(crate::FILL_ZEROS_KIND)
        .with_input("X", vec![input_var.to_string()])
        .with_output("Y", vec![output_var.to_string()])
}

/// Builds the `accumulate` leaf the Builder inserts to resolve a
/// duplicate-writer collision (§4.4 step 4).
pub fn make_accumulate(aliases: &[VarName], output_var: &str) -> OperatorDescriptor {
    OperatorDescriptor::new(crate::ACCUMULATE_KIND)
        .with_input("X", aliases.to_vec())
        .with_output("Out", vec![output_var.to_string()])
}

/// True for the sentinel "no variable here" name.
pub fn is_empty_name(name: &str) -> bool {
    name == EMPTY_NAME
}
