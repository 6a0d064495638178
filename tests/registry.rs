// SPDX-License-Identifier: MIT OR Apache-2.0

use backward_graph::prelude::*;

#[test]
fn unregistered_kind_fails() {
    let registry = GradientRegistry::builder().build();
    let desc = OperatorDescriptor::new("mystery");
    match registry.make_gradient(&desc) {
        Err(Error::UnregisteredGradient { kind, .. }) => assert_eq!(kind, "mystery"),
        other => panic!("expected UnregisteredGradient, got {other:?}"),
    }
}

#[test]
fn later_registration_replaces_earlier() {
    let registry = GradientRegistry::builder()
        .register("k", |_: &OperatorDescriptor| {
            Ok(vec![OperatorDescriptor::new("first")])
        })
        .register("k", |_: &OperatorDescriptor| {
            Ok(vec![OperatorDescriptor::new("second")])
        })
        .build();
    let out = registry.make_gradient(&OperatorDescriptor::new("k")).unwrap();
    assert_eq!(out[0].kind, "second");
}
