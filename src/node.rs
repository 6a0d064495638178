// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator nodes: the trees the Backward Builder walks and the trees it
//! returns. A node is either a single descriptor (leaf) or an ordered
//! sequence of nodes (composite).

use crate::descriptor::OperatorDescriptor;
use serde::{Deserialize, Serialize};

/// Reserved kind for an empty composite meaning "does nothing".
pub const NOP_KIND: &str = "@NOP@";
/// Reserved kind marking a composite synthesized by the Builder.
pub const GENERATED_BACKWARD_KIND: &str = "@generated-backward@";
/// The one leaf kind carrying an owned step-net.
pub const RECURRENT_KIND: &str = "recurrent";

/// A leaf operator: one descriptor, plus an optional owned step-net if its
/// kind is [`RECURRENT_KIND`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafOp {
    pub descriptor: OperatorDescriptor,
    pub step_net: Option<Box<OpNode>>,
}

impl LeafOp {
    pub fn new(descriptor: OperatorDescriptor) -> Self {
        LeafOp {
            descriptor,
            step_net: None,
        }
    }

    pub fn with_step_net(mut self, step_net: OpNode) -> Self {
        self.step_net = Some(Box::new(step_net));
        self
    }
}

/// An ordered sequence of operator nodes plus a reserved kind marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub kind: String,
    pub children: Vec<OpNode>,
}

/// An operator node: either a leaf or a composite ("net"). Composites may
/// nest arbitrarily.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OpNode {
    Leaf(LeafOp),
    Composite(Composite),
}

impl OpNode {
    /// The canonical empty composite signaling "no work" (§3, §6).
    pub fn nop() -> Self {
        OpNode::Composite(Composite {
            kind: NOP_KIND.to_string(),
            children: Vec::new(),
        })
    }

    /// A bare leaf with no step-net.
    pub fn leaf(descriptor: OperatorDescriptor) -> Self {
        OpNode::Leaf(LeafOp::new(descriptor))
    }

    pub fn composite(kind: impl Into<String>, children: Vec<OpNode>) -> Self {
        OpNode::Composite(Composite {
            kind: kind.into(),
            children,
        })
    }

    pub fn is_nop(&self) -> bool {
        matches!(self, OpNode::Composite(c) if c.kind == NOP_KIND && c.children.is_empty())
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, OpNode::Composite(_))
    }

    /// Every output variable name written anywhere in this node's subtree,
    /// flattened across all descendant leaves, in traversal order.
    pub fn collect_output_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_output_names_into(&mut names);
        names
    }

    fn collect_output_names_into(&self, out: &mut Vec<String>) {
        match self {
            OpNode::Leaf(leaf) => {
                out.extend(leaf.descriptor.output_names().map(str::to_string));
            }
            OpNode::Composite(comp) => {
                for child in &comp.children {
                    child.collect_output_names_into(out);
                }
            }
        }
    }

    /// Replace every occurrence of `old` with `new`, in every descriptor
    /// reachable from this node (including inside a Recurrent step-net).
    pub fn rename(&mut self, old: &str, new: &str) {
        match self {
            OpNode::Leaf(leaf) => {
                leaf.descriptor.rename(old, new);
                if let Some(step_net) = leaf.step_net.as_mut() {
                    step_net.rename(old, new);
                }
            }
            OpNode::Composite(comp) => {
                for child in comp.children.iter_mut() {
                    child.rename(old, new);
                }
            }
        }
    }
}
