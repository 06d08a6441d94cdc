// SPDX-License-Identifier: MPL-2.0 OR LGPL-3.0-or-later
/*
 * libexecgate: exec-call interception for sandboxed processes on Linux
 * Copyright (C) 2019-2025 Aleksa Sarai <cyphar@cyphar.com>
 * Copyright (C) 2019-2025 SUSE LLC
 *
 * == MPL-2.0 ==
 *
 *  This Source Code Form is subject to the terms of the Mozilla Public
 *  License, v. 2.0. If a copy of the MPL was not distributed with this
 *  file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * Alternatively, this Source Code Form may also (at your option) be used
 * under the terms of the GNU Lesser General Public License Version 3, as
 * described below:
 *
 * == LGPL-3.0-or-later ==
 *
 *  This program is free software: you can redistribute it and/or modify it
 *  under the terms of the GNU Lesser General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or (at
 *  your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful, but
 *  WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 *  Public License for more details.
 *
 *  You should have received a copy of the GNU Lesser General Public License
 *  along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

#![forbid(unsafe_code)]

//! The per-call decision engine.
//!
//! One intercepted exec is split into an *allowed* and a *forbidden* half.
//! The split is deliberately all-or-nothing: as soon as any part of the
//! call touches supervisor-managed state, the whole call is delegated so
//! the supervisor can mediate with the user, instead of silently dropping
//! the offending arguments and running the rest.

use crate::{
    canon,
    error::ErrorKind,
    flags::{CanonFlags, ExecClass},
    policy::Policy,
};

use std::{
    ffi::{OsStr, OsString},
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use memchr::memchr;

/// One half of a split exec call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub target: PathBuf,
    pub argv: Vec<OsString>,
}

/// The outcome of classifying one exec call.
///
/// `tags` is parallel to argv: index 0 describes the executable itself,
/// later indices the corresponding arguments. At most one of `allowed` and
/// `forbidden` is populated by [`decide`]; dispatch also accepts
/// hand-assembled mixed decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecDecision {
    pub tags: Vec<ExecClass>,
    pub allowed: Option<ExecCall>,
    pub forbidden: Option<ExecCall>,
}

impl ExecDecision {
    fn forbid(target: &Path, argv: &[OsString], tags: Vec<ExecClass>) -> Self {
        Self {
            tags,
            allowed: None,
            forbidden: Some(ExecCall {
                target: target.to_path_buf(),
                argv: argv.to_vec(),
            }),
        }
    }

    fn allow(target: &Path, argv: &[OsString], tags: Vec<ExecClass>) -> Self {
        Self {
            tags,
            allowed: Some(ExecCall {
                target: target.to_path_buf(),
                argv: argv.to_vec(),
            }),
            forbidden: None,
        }
    }
}

/// Classify the target binary of an exec call.
///
/// Helpers-list membership and association with the calling program are
/// equivalent: both mean "this binary belongs to the sandboxed
/// application".
fn classify_target(policy: &Policy, caller: Option<&Path>, target: &Path) -> ExecClass {
    if policy.helpers_match(target)
        || caller.is_some_and(|caller| policy.assoc().is_associated(caller, target))
    {
        ExecClass::HELPERS
    } else if policy.managed_bins_match(target) {
        ExecClass::SANDBOX_MANAGED
    } else {
        ExecClass::UNSPECIFIED
    }
}

/// Classify one argument string (argv index >= 1).
///
/// Only "file-like" arguments are compared against the managed-files list:
/// anything containing a separator, anything that canonicalizes as an
/// existing path, and anything whose stat failure still implies existence
/// (`EACCES`, `ELOOP`, `EOVERFLOW`). Canonicalization failures are
/// absorbed here rather than propagated -- a malformed argument must not
/// mask the policy decision for the rest of the call.
pub(crate) fn classify_argument(policy: &Policy, arg: &OsStr) -> ExecClass {
    let bytes = arg.as_bytes();
    if bytes.is_empty() {
        return ExecClass::UNSPECIFIED;
    }

    let file_like = memchr(b'/', bytes).is_some()
        || match canon::canonicalize(arg, CanonFlags::EXISTING) {
            Ok(_) => true,
            Err(err) => matches!(
                err.kind(),
                ErrorKind::OsError(Some(libc::EACCES | libc::ELOOP | libc::EOVERFLOW))
            ),
        };
    if !file_like {
        return ExecClass::UNSPECIFIED;
    }

    match canon::realpath(arg) {
        Ok(canonical) if policy.managed_files_match(&canonical) => ExecClass::SANDBOX_MANAGED,
        _ => ExecClass::UNSPECIFIED,
    }
}

/// Split one exec call into its allowed and forbidden halves.
///
/// `target` must already be a resolved path (the entry-point adapters take
/// care of search-path lookup and canonicalization); `caller` is the
/// resolved path of the program currently running in the sandbox, used for
/// the association lookup.
pub fn decide(
    policy: &Policy,
    caller: Option<&Path>,
    target: &Path,
    argv: &[OsString],
) -> ExecDecision {
    let mut tags = vec![ExecClass::NOTHING; argv.len().max(1)];

    tags[0] = classify_target(policy, caller, target);
    if !policy.target_policy().contains(tags[0]) {
        return ExecDecision::forbid(target, argv, tags);
    }

    for (idx, arg) in argv.iter().enumerate().skip(1) {
        tags[idx] = classify_argument(policy, arg);
    }
    if tags.iter().any(|tag| !tag.permits_direct_exec()) {
        // Conservative widening: one forbidden argument delegates the whole
        // call, never a partial argv.
        return ExecDecision::forbid(target, argv, tags);
    }

    ExecDecision::allow(target, argv, tags)
}
