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

//! Dispatch of a split exec call.
//!
//! The forbidden half of a call is never executed: it is *signaled* by
//! attempting to exec a sentinel path the supervisor watches for. The
//! sentinel does not exist, so the attempt fails by construction; the
//! side effect is the exec syscall itself, which the supervisor observes
//! from outside the process.

use crate::{
    decision::ExecDecision,
    error::{Error, ErrorImpl},
};

use std::{
    ffi::{OsStr, OsString},
    io::Error as IOError,
    os::unix::ffi::{OsStrExt, OsStringExt},
    path::{Path, PathBuf},
};

/// Prefix of every sentinel path. Exec attempts below this prefix are the
/// notification protocol between the interceptor and the supervisor.
pub const SENTINEL_PREFIX: &str = "/firejail/denied/";

/// The seam between the decision pipeline and the actual image
/// replacement. The real implementation calls the next `execve` in the
/// link map; tests substitute a recorder.
pub trait ExecBackend {
    /// Attempt to replace the process image, returning the errno on
    /// failure. A successful replacement never returns (test backends
    /// return 0 instead).
    fn execute(&self, path: &Path, argv: &[OsString]) -> i32;
}

/// Build the sentinel path for a forbidden target.
///
/// This is byte concatenation, not path joining: the target is absolute,
/// so the result contains a doubled separator
/// (`/firejail/denied//usr/bin/vlc`). Supervisors match on the prefix and
/// strip it to recover the original target.
pub fn sentinel_path(target: &Path) -> PathBuf {
    let mut bytes = SENTINEL_PREFIX.as_bytes().to_vec();
    bytes.extend_from_slice(target.as_os_str().as_bytes());
    PathBuf::from(OsString::from_vec(bytes))
}

/// Carry out a decision: notify the supervisor about the forbidden half,
/// then execute the allowed half.
///
/// The notification strictly precedes the allowed exec and its errno is
/// swallowed. An allowed half that fails propagates the backend errno
/// unchanged; an absent allowed half is a policy refusal (`EACCES`).
/// `Ok(())` can only be observed with a test backend -- a real successful
/// exec does not return.
pub fn dispatch(decision: &ExecDecision, backend: &dyn ExecBackend) -> Result<(), Error> {
    if let Some(forbidden) = &decision.forbidden {
        let _ = backend.execute(&sentinel_path(&forbidden.target), &forbidden.argv);
    }

    match &decision.allowed {
        Some(allowed) => {
            let errno = backend.execute(&allowed.target, &allowed.argv);
            if errno == 0 {
                Ok(())
            } else {
                Err(ErrorImpl::OsError {
                    operation: "execute allowed half of exec call".into(),
                    source: IOError::from_raw_os_error(errno),
                }
                .into())
            }
        }
        None => Err(ErrorImpl::PolicyRefused {
            description: "allowed half of exec call is empty".into(),
        }
        .into()),
    }
}

/// Convenience constructor for an argv vector from `&str` slices, mostly
/// for embedders' tests and tools.
pub fn argv_of<S: AsRef<OsStr>>(args: &[S]) -> Vec<OsString> {
    args.iter().map(|arg| arg.as_ref().to_os_string()).collect()
}
