// SPDX-License-Identifier: MIT OR Apache-2.0

//! The No-Grad Propagator (§4.3): decides, per forward leaf, whether
//! gradient synthesis is needed, and rewrites the synthesized descriptors
//! to zero-fill missing upstream gradients or discard suppressed ones.

use crate::descriptor::{fill_zeros_like, OperatorDescriptor};
use crate::naming::{grad_name, strip_grad, zero_name};
use std::collections::HashSet;

/// A set of gradient-variable names (already suffixed) declared not to be
/// computed. Threaded mutably through the recursion; grows monotonically
/// within one Backward invocation (§3, §9).
pub type NoGradSet = HashSet<String>;

/// The outcome of applying the Propagator to one forward leaf (§4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Skip,
    Synthesize,
}

/// Apply steps 1-3 of §4.3 to one forward leaf descriptor, mutating `no_grad`
/// in place when step 2 fires.
pub fn decide(descriptor: &OperatorDescriptor, no_grad: &mut NoGradSet) -> Decision {
    let all_inputs_suppressed = descriptor
        .input_names()
        .all(|x| no_grad.contains(&grad_name(x)));
    if all_inputs_suppressed {
        log::debug!(
            "no-grad propagator: skipping `{}`, every input gradient already suppressed",
            descriptor.kind
        );
        return Decision::Skip;
    }

    let all_outputs_suppressed = descriptor
        .output_names()
        .all(|y| no_grad.contains(&grad_name(y)));
    if all_outputs_suppressed {
        log::debug!(
            "no-grad propagator: skipping `{}`, every output gradient suppressed; suppressing its inputs too",
            descriptor.kind
        );
        for x in descriptor.input_names() {
            no_grad.insert(grad_name(x));
        }
        return Decision::Skip;
    }

    log::trace!("no-grad propagator: synthesizing gradient for `{}`", descriptor.kind);
    Decision::Synthesize
}

/// Apply the synthesize-time rewrites of §4.3: zero-fill any gradient-input
/// name already in `no_grad` (prepending a `fill-zeros-like` leaf for each),
/// and blank out any gradient-output name already in `no_grad`.
///
/// Returns the fill-zeros-like leaves (if any) followed by the rewritten
/// gradient descriptors, in the order they must appear in the output.
pub fn apply_propagator_rewrites(
    mut grads: Vec<OperatorDescriptor>,
    no_grad: &NoGradSet,
) -> crate::error::Result<Vec<OperatorDescriptor>> {
    let mut fills = Vec::new();
    for grad in grads.iter_mut() {
        for names in grad.inputs.values_mut() {
            for name in names.iter_mut() {
                if no_grad.contains(name.as_str()) {
                    let stripped = strip_grad(name)?.to_string();
                    let zeroed = zero_name(&stripped);
                    log::trace!("zero-filling suppressed input `{name}` as `{zeroed}`");
                    fills.push(fill_zeros_like(&stripped, &zeroed));
                    *name = zeroed;
                }
            }
        }
        for names in grad.outputs.values_mut() {
            for name in names.iter_mut() {
                if no_grad.contains(name.as_str()) {
                    log::trace!("discarding suppressed output `{name}`");
                    *name = crate::naming::EMPTY_NAME.to_string();
                }
            }
        }
    }
    fills.extend(grads);
    Ok(fills)
}
