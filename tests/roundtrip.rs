// SPDX-License-Identifier: MIT OR Apache-2.0

use backward_graph::prelude::*;

#[test]
fn operator_descriptor_survives_bincode_round_trip() -> anyhow::Result<()> {
    let original = OperatorDescriptor::new("mul")
        .with_input("X", vec!["a".into()])
        .with_input("Y", vec!["b".into()])
        .with_output("Out", vec!["c".into()])
        .with_attr("transpose_x", AttrValue::Bool(false));

    let bytes = bincode::serialize(&original)?;
    let restored: OperatorDescriptor = bincode::deserialize(&bytes)?;
    assert_eq!(original, restored);
    Ok(())
}

#[test]
fn op_node_with_step_net_survives_bincode_round_trip() -> anyhow::Result<()> {
    let step_net = OpNode::leaf(
        OperatorDescriptor::new("tanh")
            .with_input("X", vec!["h_in".into()])
            .with_output("Out", vec!["h_out".into()]),
    );
    let original =
        OpNode::Leaf(LeafOp::new(OperatorDescriptor::new("recurrent")).with_step_net(step_net));

    let bytes = bincode::serialize(&original)?;
    let restored: OpNode = bincode::deserialize(&bytes)?;
    assert_eq!(original, restored);
    Ok(())
}

#[test]
fn generated_backward_composite_survives_bincode_round_trip() -> anyhow::Result<()> {
    let registry = GradientRegistry::builder()
        .register("mul", |d: &OperatorDescriptor| {
            let a = d.input("X")?[0].clone();
            let b = d.input("Y")?[0].clone();
            let c = d.output("Out")?[0].clone();
            Ok(vec![OperatorDescriptor::new("mul_grad")
                .with_input("X", vec![a.clone()])
                .with_input("Y", vec![b.clone()])
                .with_input(grad_name("Out"), vec![grad_name(&c)])
                .with_output(grad_name("X"), vec![grad_name(&a)])
                .with_output(grad_name("Y"), vec![grad_name(&b)])])
        })
        .build();
    let forward = OpNode::leaf(
        OperatorDescriptor::new("mul")
            .with_input("X", vec!["a".into()])
            .with_input("Y", vec!["b".into()])
            .with_output("Out", vec!["c".into()]),
    );
    let backward = BackwardBuilder::new(&registry).backward(&forward, &[])?;

    let bytes = bincode::serialize(&backward)?;
    let restored: OpNode = bincode::deserialize(&bytes)?;
    assert_eq!(backward, restored);
    Ok(())
}
