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

// We need to permit unsafe code because we are exposing C APIs over FFI and
// thus need to interact with C callers.
#![allow(unsafe_code)]

//! The interception entry points.
//!
//! These symbols shadow the exec family when the shared object is loaded
//! with `LD_PRELOAD`. Each one normalizes its target to a resolved path,
//! runs the decision pipeline and dispatches the result through the real
//! `execve` found with `dlsym(RTLD_NEXT)`. On failure the usual exec
//! contract is honored: `errno` is set and `-1` is returned.

mod utils;

use crate::{
    canon, decision,
    dispatch::{self, ExecBackend},
    error::Error,
    lookup,
    policy::GLOBAL_POLICY,
    syscalls,
};

use std::{
    ffi::{CString, OsString},
    fs,
    io::Error as IOError,
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
    ptr,
};

use libc::{c_char, c_int};
use once_cell::sync::Lazy;

extern "C" {
    // POSIX global environment, needed for the execvp adapter.
    static environ: *const *const c_char;
}

/// Resolved identity of the program running in this process, used for the
/// association lookup. Resolution failure (no procfs) just disables
/// association matching.
static SELF_EXE: Lazy<Option<PathBuf>> =
    Lazy::new(|| fs::read_link("/proc/self/exe").ok());

/// The real image replacement: the next `execve` in the link map, with the
/// caller's envp.
struct RealExec {
    envp: *const *const c_char,
}

impl ExecBackend for RealExec {
    fn execute(&self, path: &Path, argv: &[OsString]) -> i32 {
        let Some(real_execve) = syscalls::real_execve() else {
            return libc::ENOSYS;
        };
        let Ok(path) = CString::new(path.as_os_str().as_bytes()) else {
            return libc::EINVAL;
        };
        let argv: Vec<CString> = match argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect()
        {
            Ok(argv) => argv,
            Err(_) => return libc::EINVAL,
        };
        let mut argv_ptrs: Vec<*const c_char> =
            argv.iter().map(|arg| arg.as_ptr()).collect();
        argv_ptrs.push(ptr::null());

        // SAFETY: path and every argv pointer are valid NUL-terminated
        //         strings owned by this frame, the argv array is
        //         NULL-terminated, and envp came unmodified from our C
        //         caller.
        let ret = unsafe { real_execve(path.as_ptr(), argv_ptrs.as_ptr(), self.envp) };
        debug_assert_eq!(ret, -1, "execve must only return on failure");
        IOError::last_os_error().raw_os_error().unwrap_or(libc::EIO)
    }
}

/// Classify and dispatch one normalized exec call.
fn run_intercepted(
    target: Result<PathBuf, Error>,
    argv: Vec<OsString>,
    envp: *const *const c_char,
) -> c_int {
    let result = target.and_then(|target| {
        let decision = decision::decide(&GLOBAL_POLICY, SELF_EXE.as_deref(), &target, &argv);
        dispatch::dispatch(&decision, &RealExec { envp })
    });
    match result {
        // Only reachable if the real execve "succeeded and returned",
        // which it cannot.
        Ok(()) => 0,
        Err(err) => utils::fail_with(&err),
    }
}

/// The interposed `execve(2)`: exec by path.
#[no_mangle]
pub unsafe extern "C" fn execve(
    path: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int {
    // SAFETY: the C caller guarantees execve's pointer contract.
    let target = match unsafe { utils::parse_path(path) } {
        Ok(path) => canon::realpath(path),
        Err(err) => return utils::fail_with(&err),
    };
    // SAFETY: argv is a NULL-terminated array of C strings.
    let argv = unsafe { utils::parse_string_array(argv) };
    run_intercepted(target, argv, envp)
}

/// The interposed `execvpe(3)`: exec by file name, located on `$PATH`.
#[no_mangle]
pub unsafe extern "C" fn execvpe(
    file: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int {
    // SAFETY: the C caller guarantees execvpe's pointer contract.
    let target = match unsafe { utils::parse_path(file) } {
        Ok(file) => lookup::resolve_on_path(file).and_then(canon::realpath),
        Err(err) => return utils::fail_with(&err),
    };
    // SAFETY: argv is a NULL-terminated array of C strings.
    let argv = unsafe { utils::parse_string_array(argv) };
    run_intercepted(target, argv, envp)
}

/// The interposed `execvp(3)`: `execvpe` with the process environment.
#[no_mangle]
pub unsafe extern "C" fn execvp(file: *const c_char, argv: *const *const c_char) -> c_int {
    // SAFETY: execvp passes the global environment by contract; the rest is
    //         identical to execvpe.
    unsafe { execvpe(file, argv, environ) }
}

/// The interposed `fexecve(3)`: exec by open file descriptor.
#[no_mangle]
pub unsafe extern "C" fn fexecve(
    fd: c_int,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int {
    let target = lookup::resolve_fd_target(fd);
    // SAFETY: argv is a NULL-terminated array of C strings.
    let argv = unsafe { utils::parse_string_array(argv) };
    run_intercepted(target, argv, envp)
}
