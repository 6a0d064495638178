// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use backtrace::Backtrace;
use thiserror::Error;

/// Default error type for the crate.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("no gradient recipe registered for operator kind `{kind}`\n{trace}")]
    UnregisteredGradient { kind: String, trace: String },
    #[error("malformed operator descriptor for kind `{kind}`: missing slot `{slot}`\n{trace}")]
    MalformedDescriptor {
        kind: String,
        slot: String,
        trace: String,
    },
    #[error("cyclic step-net suspected while differentiating `{kind}` (path: {path})\n{trace}")]
    CyclicStepNet {
        kind: String,
        path: String,
        trace: String,
    },
}

/// Default result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Computes the name of the current function.
// https://stackoverflow.com/questions/38088067/equivalent-of-func-or-function-in-rust
#[macro_export]
macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}

impl Error {
    fn backtrace() -> String {
        if std::env::var("RUST_BACKTRACE").is_ok() {
            format!("{:?}", Backtrace::new())
        } else {
            String::new()
        }
    }

    /// Report a gradient recipe lookup miss.
    pub fn unregistered_gradient(kind: &str) -> Self {
        Error::UnregisteredGradient {
            kind: kind.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report a descriptor missing a slot the caller expected.
    pub fn malformed_descriptor(kind: &str, slot: &str) -> Self {
        Error::MalformedDescriptor {
            kind: kind.to_string(),
            slot: slot.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report a step-net recursion that exceeded the configured depth guard.
    pub fn cyclic_step_net(kind: &str, path: &str) -> Self {
        Error::CyclicStepNet {
            kind: kind.to_string(),
            path: path.to_string(),
            trace: Self::backtrace(),
        }
    }
}
