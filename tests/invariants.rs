// SPDX-License-Identifier: MIT OR Apache-2.0

use backward_graph::prelude::*;
use std::collections::HashSet;

fn init() {
    let _ = env_logger::try_init();
}

fn add_registry() -> GradientRegistry {
    GradientRegistry::builder()
        .register("add", |d: &OperatorDescriptor| {
            let a = d.input("X")?[0].clone();
            let b = d.input("Y")?[0].clone();
            let c = d.output("Out")?[0].clone();
            Ok(vec![OperatorDescriptor::new("add_grad")
                .with_input(grad_name("Out"), vec![grad_name(&c)])
                .with_output(grad_name("X"), vec![grad_name(&a)])
                .with_output(grad_name("Y"), vec![grad_name(&b)])])
        })
        .build()
}

fn two_writer_forward() -> OpNode {
    OpNode::composite(
        "block",
        vec![
            OpNode::leaf(
                OperatorDescriptor::new("add")
                    .with_input("X", vec!["a".into()])
                    .with_input("Y", vec!["b".into()])
                    .with_output("Out", vec!["y".into()]),
            ),
            OpNode::leaf(
                OperatorDescriptor::new("add")
                    .with_input("X", vec!["a".into()])
                    .with_input("Y", vec!["c".into()])
                    .with_output("Out", vec!["y".into()]),
            ),
        ],
    )
}

#[test]
fn applying_backward_twice_is_deterministic() -> anyhow::Result<()> {
    init();
    let registry = add_registry();
    let builder = BackwardBuilder::new(&registry);
    let forward = two_writer_forward();
    let first = builder.backward(&forward, &[])?;
    let second = builder.backward(&forward, &[])?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn composite_never_shrinks_and_grows_when_accumulating() -> anyhow::Result<()> {
    init();
    let registry = add_registry();
    let builder = BackwardBuilder::new(&registry);
    let forward = two_writer_forward();
    let backward = builder.backward(&forward, &[])?;
    let children = match backward {
        OpNode::Composite(c) => c.children,
        other => anyhow::bail!("expected composite, got {other:?}"),
    };
    // two forward children, each produces one gradient leaf, plus one
    // accumulate leaf resolving the duplicate write to y@GRAD.
    assert!(children.len() > 2);
    Ok(())
}

#[test]
fn rename_aliases_are_unique_within_one_call() -> anyhow::Result<()> {
    init();
    let registry = add_registry();
    let builder = BackwardBuilder::new(&registry);
    let backward = builder.backward(&two_writer_forward(), &[])?;
    let mut seen = HashSet::new();
    for name in backward.collect_output_names() {
        if name.contains("@RENAME@") {
            assert!(seen.insert(name.clone()), "duplicate rename alias: {name}");
        }
    }
    assert!(!seen.is_empty(), "expected at least one rename alias to be produced");
    Ok(())
}

#[test]
fn fully_suppressed_root_input_yields_nop() -> anyhow::Result<()> {
    init();
    let registry = add_registry();
    let leaf = OpNode::leaf(
        OperatorDescriptor::new("add")
            .with_input("X", vec!["a".into()])
            .with_input("Y", vec!["b".into()])
            .with_output("Out", vec!["c".into()]),
    );
    let backward =
        BackwardBuilder::new(&registry).backward(&leaf, &["a".into(), "b".into()])?;
    assert!(backward.is_nop());
    Ok(())
}

#[test]
fn unregistered_kind_surfaces_as_fatal_error() {
    init();
    let registry = GradientRegistry::builder().build();
    let leaf = OpNode::leaf(OperatorDescriptor::new("mystery"));
    let err = BackwardBuilder::new(&registry)
        .backward(&leaf, &[])
        .expect_err("unregistered kind must fail");
    match err {
        Error::UnregisteredGradient { kind, .. } => assert_eq!(kind, "mystery"),
        other => panic!("expected UnregisteredGradient, got {other:?}"),
    }
}
