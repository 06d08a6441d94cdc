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

//! `$PATH`-based executable lookup for the `execvp`-family entry points.

use crate::{
    canon,
    error::{Error, ErrorExt, ErrorImpl},
    syscalls,
};

use std::{
    env,
    ffi::OsStr,
    fs,
    io::Error as IOError,
    os::unix::{ffi::OsStrExt, io::RawFd},
    path::{Path, PathBuf},
};

use memchr::memchr;

/// Search path used when `PATH` is unset, mirroring the libc default.
const DEFAULT_PATH: &str = "/bin:/usr/bin";

/// Per-directory probe errors that merely mean "not here, keep looking".
/// Anything outside this set aborts the search.
fn search_continues(errno: i32) -> bool {
    matches!(
        errno,
        libc::EACCES
            | libc::ENOENT
            | libc::ENAMETOOLONG
            | libc::ENOTDIR
            | libc::ELOOP
            | libc::EROFS
            | libc::ETXTBSY
    )
}

/// Locate `name` the way `execvp(3)` would.
///
/// A name containing a separator is not searched for at all -- it is
/// canonicalized via [`canon::realpath`] and returned. Otherwise each
/// directory of `PATH` (empty fields meaning the current directory, the
/// libc default list if unset) is probed for an executable entry, in order.
///
/// A probe failing with `EACCES` is remembered: if nothing later on the
/// path matches, the search surfaces permission-denied rather than
/// not-found, so callers can tell "exists but not runnable" apart from
/// "no such program".
pub fn resolve_on_path<N: AsRef<OsStr>>(name: N) -> Result<PathBuf, Error> {
    let name = name.as_ref();
    if name.is_empty() {
        Err(ErrorImpl::OsError {
            operation: "resolve executable name".into(),
            source: IOError::from_raw_os_error(libc::ENOENT),
        })
        .wrap("empty executable name")?
    }
    if memchr(b'/', name.as_bytes()).is_some() {
        return canon::realpath(name)
            .with_wrap(|| format!("resolve non-searched executable path {name:?}"));
    }

    let search_path = env::var_os("PATH").unwrap_or_else(|| DEFAULT_PATH.into());
    let mut saw_eacces = false;

    for dir in search_path.as_bytes().split(|&b| b == b':') {
        // A leading, trailing or doubled ":" means the current directory.
        let dir = if dir.is_empty() {
            Path::new(".")
        } else {
            Path::new(OsStr::from_bytes(dir))
        };
        let candidate = dir.join(name);

        match syscalls::access_execute(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) => match err.raw_os_error() {
                Some(errno) if search_continues(errno) => {
                    saw_eacces |= errno == libc::EACCES;
                }
                // An unexpected probe error poisons the rest of the search.
                _ => break,
            },
        }
    }

    let errno = if saw_eacces {
        libc::EACCES
    } else {
        libc::ENOENT
    };
    Err(Error::from(ErrorImpl::OsError {
        operation: "locate executable on search path".into(),
        source: IOError::from_raw_os_error(errno),
    }))
    .with_wrap(|| format!("no usable {name:?} in {search_path:?}"))
}

/// Recover the path behind an already-open file descriptor, for the
/// `fexecve(3)` entry point.
///
/// The magic-link under `/proc/self/fd` gives the kernel's view of the
/// descriptor's path. A negative descriptor or an unreadable link is an
/// invalid argument, matching the fexecve contract.
pub fn resolve_fd_target(fd: RawFd) -> Result<PathBuf, Error> {
    if fd < 0 {
        Err(ErrorImpl::InvalidArgument {
            name: "fd".into(),
            description: "passed file descriptors must not be negative".into(),
        })?
    }
    fs::read_link(format!("/proc/self/fd/{fd}")).map_err(|err| {
        Error::from(ErrorImpl::InvalidArgument {
            name: "fd".into(),
            description: "file descriptor has no readable procfs link".into(),
        })
        .with_wrap(|| format!("readlink /proc/self/fd/{fd}: {err}"))
    })
}
