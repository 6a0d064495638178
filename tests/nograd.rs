// SPDX-License-Identifier: MIT OR Apache-2.0

use backward_graph::nograd::{decide, Decision};
use backward_graph::prelude::*;

fn mul_leaf() -> OperatorDescriptor {
    OperatorDescriptor::new("mul")
        .with_input("X", vec!["a".into()])
        .with_input("Y", vec!["b".into()])
        .with_output("Out", vec!["c".into()])
}

#[test]
fn scenario_1_no_suppression_synthesizes() {
    let mut s = NoGradSet::new();
    assert_eq!(decide(&mul_leaf(), &mut s), Decision::Synthesize);
}

#[test]
fn scenario_2_all_inputs_suppressed_skips() {
    let mut s: NoGradSet = ["a@GRAD".into(), "b@GRAD".into()].into_iter().collect();
    assert_eq!(decide(&mul_leaf(), &mut s), Decision::Skip);
}

#[test]
fn scenario_3_all_outputs_suppressed_propagates_to_inputs() {
    let mut s: NoGradSet = ["c@GRAD".into()].into_iter().collect();
    assert_eq!(decide(&mul_leaf(), &mut s), Decision::Skip);
    assert!(s.contains("a@GRAD"));
    assert!(s.contains("b@GRAD"));
}
