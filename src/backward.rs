// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Backward Builder (§4.4): the orchestrator. Walks the forward graph
//! in reverse, invokes the Gradient Factory via the No-Grad Propagator,
//! renames duplicated gradient outputs, inserts accumulation operators,
//! and assembles the result.

use crate::config::BackwardConfig;
use crate::descriptor::{is_empty_name, make_accumulate, OperatorDescriptor, VarName};
use crate::error::{Error, Result};
use crate::naming::{grad_name, rename_alias, EMPTY_NAME};
use crate::node::{Composite, LeafOp, OpNode, GENERATED_BACKWARD_KIND, RECURRENT_KIND};
use crate::nograd::{apply_propagator_rewrites, decide, Decision, NoGradSet};
use crate::registry::GradientRegistry;
use std::collections::BTreeMap;

/// Monotonically increasing counter threaded through the recursion, used to
/// build rename aliases that are globally unique within one invocation (§3).
#[derive(Default)]
struct UidCounter(u64);

impl UidCounter {
    fn next(&mut self) -> u64 {
        let uid = self.0;
        self.0 += 1;
        uid
    }
}

/// Typed entry point wrapping a [`GradientRegistry`] and a [`BackwardConfig`]
/// (SPEC_FULL.md §1a): gives collaborators one place to call `backward`/
/// `append_backward` instead of free functions with implicit global state.
pub struct BackwardBuilder<'a> {
    registry: &'a GradientRegistry,
    config: BackwardConfig,
}

impl<'a> BackwardBuilder<'a> {
    pub fn new(registry: &'a GradientRegistry) -> Self {
        BackwardBuilder {
            registry,
            config: BackwardConfig::default(),
        }
    }

    pub fn with_config(registry: &'a GradientRegistry, config: BackwardConfig) -> Self {
        BackwardBuilder { registry, config }
    }

    /// Backward(root, user_no_grad_vars) -> op_node (§4.4).
    pub fn backward(&self, root: &OpNode, user_no_grad_vars: &[VarName]) -> Result<OpNode> {
        let mut no_grad = seed_no_grad_set(user_no_grad_vars);
        let mut uid = UidCounter::default();
        backward_recursive(self.registry, root, &mut no_grad, &mut uid, &self.config, 0)
    }

    /// Backward(root, user_no_grad_vars) -> (op_node, final no-grad set).
    /// Exposes the caller-observable post-state of S required by the
    /// universal invariant in §8 ("S after the call contains...").
    pub fn backward_with_no_grad_set(
        &self,
        root: &OpNode,
        user_no_grad_vars: &[VarName],
    ) -> Result<(OpNode, NoGradSet)> {
        let mut no_grad = seed_no_grad_set(user_no_grad_vars);
        let mut uid = UidCounter::default();
        let result = backward_recursive(self.registry, root, &mut no_grad, &mut uid, &self.config, 0)?;
        Ok((result, no_grad))
    }

    /// AppendBackward(block, user_no_grad_vars) (§4.4 flat variant).
    pub fn append_backward(
        &self,
        block: &mut Vec<OperatorDescriptor>,
        user_no_grad_vars: &[VarName],
    ) -> Result<()> {
        let mut no_grad = seed_no_grad_set(user_no_grad_vars);
        append_backward_flat(self.registry, block, &mut no_grad)
    }
}

fn seed_no_grad_set(user_no_grad_vars: &[VarName]) -> NoGradSet {
    let mut s = NoGradSet::new();
    s.insert(grad_name(EMPTY_NAME));
    for v in user_no_grad_vars {
        s.insert(grad_name(v));
    }
    s
}

fn backward_recursive(
    registry: &GradientRegistry,
    node: &OpNode,
    no_grad: &mut NoGradSet,
    uid: &mut UidCounter,
    config: &BackwardConfig,
    depth: usize,
) -> Result<OpNode> {
    log::trace!("{}: depth={depth}", crate::func_name!());
    match node {
        OpNode::Leaf(leaf) => backward_leaf(registry, leaf, no_grad, uid, config, depth),
        OpNode::Composite(comp) => backward_composite(registry, comp, no_grad, uid, config, depth),
    }
}

fn backward_leaf(
    registry: &GradientRegistry,
    leaf: &LeafOp,
    no_grad: &mut NoGradSet,
    uid: &mut UidCounter,
    config: &BackwardConfig,
    depth: usize,
) -> Result<OpNode> {
    if decide(&leaf.descriptor, no_grad) == Decision::Skip {
        return Ok(OpNode::nop());
    }

    let grads = registry.make_gradient(&leaf.descriptor)?;
    let grads = apply_propagator_rewrites(grads, no_grad)?;

    let mut grad_node = if grads.len() == 1 {
        OpNode::leaf(grads.into_iter().next().expect("len checked above"))
    } else {
        OpNode::composite(
            GENERATED_BACKWARD_KIND,
            grads.into_iter().map(OpNode::leaf).collect(),
        )
    };

    if leaf.descriptor.kind == RECURRENT_KIND {
        if depth + 1 > config.max_recursion_depth {
            return Err(Error::cyclic_step_net(
                &leaf.descriptor.kind,
                &format!("depth {depth} exceeds max_recursion_depth {}", config.max_recursion_depth),
            ));
        }
        let step_net = leaf
            .step_net
            .as_deref()
            .ok_or_else(|| Error::malformed_descriptor(&leaf.descriptor.kind, "step_net"))?;
        let grad_step_net =
            backward_recursive(registry, step_net, no_grad, uid, config, depth + 1)?;
        install_step_net(&mut grad_node, grad_step_net)?;
    }

    Ok(grad_node)
}

/// Find the "real" gradient leaf within a (possibly zero-fill-prefixed)
/// synthesized node and attach the differentiated step-net to it. The real
/// operator is always last (fill-zeros-like leaves are prepended, §4.3).
fn install_step_net(grad_node: &mut OpNode, step_net: OpNode) -> Result<()> {
    let target = match grad_node {
        OpNode::Leaf(leaf) => leaf,
        OpNode::Composite(comp) => match comp.children.last_mut() {
            Some(OpNode::Leaf(leaf)) => leaf,
            _ => {
                return Err(Error::malformed_descriptor(
                    RECURRENT_KIND,
                    "recurrent_grad step_net target",
                ))
            }
        },
    };
    target.step_net = Some(Box::new(step_net));
    Ok(())
}

fn backward_composite(
    registry: &GradientRegistry,
    comp: &Composite,
    no_grad: &mut NoGradSet,
    uid: &mut UidCounter,
    config: &BackwardConfig,
    depth: usize,
) -> Result<OpNode> {
    if comp.children.is_empty() {
        return Ok(OpNode::nop());
    }

    let uid0 = uid.next();
    let mut net: Vec<OpNode> = Vec::with_capacity(comp.children.len());
    let mut dup_output_ops: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for child in comp.children.iter().rev() {
        let backward_child = backward_recursive(registry, child, no_grad, uid, config, depth)?;
        push_tracked(&mut net, backward_child, &mut dup_output_ops);
    }

    resolve_duplicate_writers(&mut net, &dup_output_ops, uid0, |aliases, name| {
        OpNode::leaf(make_accumulate(aliases, name))
    });

    Ok(OpNode::composite(GENERATED_BACKWARD_KIND, net))
}

/// Anything the duplicate-writer resolution pass needs to rename in place
/// and enumerate the output names of, shared between the tree-shaped
/// [`OpNode`] net and the flat [`OperatorDescriptor`] block so the two
/// `Backward`/`AppendBackward` entry points cannot drift apart (§9).
trait GradientNode {
    fn written_names(&self) -> Vec<String>;
    fn rename_in_place(&mut self, old: &str, new: &str);
}

impl GradientNode for OpNode {
    fn written_names(&self) -> Vec<String> {
        self.collect_output_names()
    }

    fn rename_in_place(&mut self, old: &str, new: &str) {
        self.rename(old, new)
    }
}

impl GradientNode for OperatorDescriptor {
    fn written_names(&self) -> Vec<String> {
        self.output_names().map(str::to_string).collect()
    }

    fn rename_in_place(&mut self, old: &str, new: &str) {
        self.rename(old, new)
    }
}

/// Append `item` to `net`, recording every non-empty name it writes against
/// its position so duplicate writers can be found afterwards.
fn push_tracked<T: GradientNode>(
    net: &mut Vec<T>,
    item: T,
    dup_output_ops: &mut BTreeMap<String, Vec<usize>>,
) {
    let local_op_id = net.len();
    for name in item.written_names() {
        if !is_empty_name(&name) {
            dup_output_ops.entry(name).or_default().push(local_op_id);
        }
    }
    net.push(item);
}

/// §4.4 step 4-5: for every output written more than once, rename each
/// writer's occurrence to a unique alias and record an accumulate node to
/// insert right after the last writer; then apply insertions back-to-front
/// so earlier ones never perturb later indices. `uid0` is the composite's
/// own uid for the tree-shaped case, or fixed at `0` for the flat variant
/// (§9's resolved open question, only one scope ever exists there).
fn resolve_duplicate_writers<T, F>(
    net: &mut Vec<T>,
    dup_output_ops: &BTreeMap<String, Vec<usize>>,
    uid0: u64,
    make_accumulate_node: F,
) where
    T: GradientNode,
    F: Fn(&[VarName], &str) -> T,
{
    let mut insertions: Vec<(usize, T)> = Vec::new();

    for (name, positions) in dup_output_ops {
        if positions.len() < 2 {
            continue;
        }
        let aliases: Vec<VarName> = positions
            .iter()
            .enumerate()
            .map(|(p, &pos)| {
                let alias = rename_alias(name, uid0, p);
                net[pos].rename_in_place(name, &alias);
                alias
            })
            .collect();
        log::trace!(
            "accumulating {} duplicate writers of `{name}` via aliases {aliases:?}",
            positions.len()
        );
        let last_writer = *positions.last().expect("positions is non-empty");
        insertions.push((last_writer + 1, make_accumulate_node(&aliases, name)));
    }

    insertions.sort_by(|a, b| b.0.cmp(&a.0));
    for (pos, node) in insertions {
        net.insert(pos.min(net.len()), node);
    }
}

/// AppendBackward(block, user_no_grad_vars) (§4.4 flat variant, §9's
/// resolved open question): the same [`push_tracked`]/[`resolve_duplicate_writers`]
/// pass as the composite case, applied to a flat descriptor list, with
/// `RenameAlias`'s uid fixed at 0 since only one scope exists.
fn append_backward_flat(
    registry: &GradientRegistry,
    block: &mut Vec<OperatorDescriptor>,
    no_grad: &mut NoGradSet,
) -> Result<()> {
    let mut net: Vec<OperatorDescriptor> = Vec::new();
    let mut dup_output_ops: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for descriptor in block.iter().rev() {
        if decide(descriptor, no_grad) == Decision::Skip {
            continue;
        }
        let grads = registry.make_gradient(descriptor)?;
        let grads = apply_propagator_rewrites(grads, no_grad)?;
        for grad in grads {
            push_tracked(&mut net, grad, &mut dup_output_ops);
        }
    }

    resolve_duplicate_writers(&mut net, &dup_output_ops, 0, make_accumulate);

    block.extend(net);
    Ok(())
}
