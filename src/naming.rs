// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure string rules shared by every other component: a forward variable
//! name in, a gradient name / zero alias / rename alias out.

use crate::error::{Error, Result};

/// Appended to a forward name to form its gradient name.
pub const GRAD_SUFFIX: &str = "@GRAD";
/// Appended to a forward name to form its zero-filled-like alias.
pub const ZERO_SUFFIX: &str = "@ZERO";
/// Infix used when disambiguating multiple writers of the same gradient variable.
pub const RENAME_TAG: &str = "@RENAME@";
/// Sentinel denoting "no variable here".
pub const EMPTY_NAME: &str = "@EMPTY@";

/// GradName(v) = v ++ GradSuffix.
pub fn grad_name(v: &str) -> String {
    format!("{v}{GRAD_SUFFIX}")
}

/// ZeroName(v) = v ++ ZeroSuffix.
pub fn zero_name(v: &str) -> String {
    format!("{v}{ZERO_SUFFIX}")
}

/// StripGrad(g) removes GradSuffix; fails if g does not end with it.
pub fn strip_grad(g: &str) -> Result<&str> {
    g.strip_suffix(GRAD_SUFFIX)
        .ok_or_else(|| Error::malformed_descriptor(g, GRAD_SUFFIX))
}

/// RenameAlias(v, uid, i) = v ++ RenameTag ++ uid ++ "@" ++ i.
pub fn rename_alias(v: &str, uid: u64, i: usize) -> String {
    format!("{v}{RENAME_TAG}{uid}@{i}")
}
