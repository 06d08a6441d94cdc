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

//! Thin wrappers around the handful of system interfaces the interceptor
//! core needs. Everything returns [`std::io::Error`] so that callers can
//! attach an operation string when converting to the crate error type.

use std::{
    ffi::{CString, OsString},
    io::Error as IOError,
    os::unix::ffi::{OsStrExt, OsStringExt},
    path::{Path, PathBuf},
};

use rustix::fs::{self as rustix_fs, Access, AtFlags, Stat, CWD};

/// `stat(2)`, following symlinks.
pub(crate) fn stat<P: AsRef<Path>>(path: P) -> Result<Stat, IOError> {
    rustix_fs::statat(CWD, path.as_ref(), AtFlags::empty()).map_err(Into::into)
}

/// `lstat(2)`.
pub(crate) fn lstat<P: AsRef<Path>>(path: P) -> Result<Stat, IOError> {
    rustix_fs::statat(CWD, path.as_ref(), AtFlags::SYMLINK_NOFOLLOW).map_err(Into::into)
}

/// `faccessat(2)` with `X_OK`.
pub(crate) fn access_execute<P: AsRef<Path>>(path: P) -> Result<(), IOError> {
    rustix_fs::accessat(CWD, path.as_ref(), Access::EXEC_OK, AtFlags::empty())
        .map_err(Into::into)
}

/// `getcwd(2)`.
pub(crate) fn getcwd() -> Result<PathBuf, IOError> {
    let cwd = rustix::process::getcwd(Vec::new())?;
    Ok(PathBuf::from(OsString::from_vec(cwd.into_bytes())))
}

/// `readlink(2)` into a caller-sized buffer.
///
/// Returns the number of bytes written. A return value equal to `buf.len()`
/// means the link target may have been truncated and the caller needs a
/// bigger buffer.
pub(crate) fn readlink_into<P: AsRef<Path>>(path: P, buf: &mut [u8]) -> Result<usize, IOError> {
    let path = CString::new(path.as_ref().as_os_str().as_bytes())
        .map_err(|_| IOError::from_raw_os_error(libc::EINVAL))?;
    // SAFETY: path is a valid NUL-terminated string and buf is writable for
    //         buf.len() bytes.
    let len = unsafe { libc::readlink(path.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
    if len < 0 {
        return Err(IOError::last_os_error());
    }
    Ok(len as usize)
}

/// Signature of `execve(3)` as resolved from the next object in the link
/// map. This is the single primitive all interception entry points funnel
/// into.
#[cfg(feature = "capi")]
pub(crate) type ExecveFn = unsafe extern "C" fn(
    *const libc::c_char,
    *const *const libc::c_char,
    *const *const libc::c_char,
) -> libc::c_int;

/// Look up the real `execve` with `dlsym(RTLD_NEXT)`, once.
///
/// Returns `None` if there is no next `execve` symbol (a broken preload
/// setup); callers treat that as `ENOSYS`. The lookup is memoized so that
/// repeated exec attempts do not touch the dynamic linker again, and the
/// initialization is idempotent under concurrent first use.
#[cfg(feature = "capi")]
pub(crate) fn real_execve() -> Option<ExecveFn> {
    use once_cell::sync::OnceCell;

    static NEXT_EXECVE: OnceCell<Option<ExecveFn>> = OnceCell::new();
    *NEXT_EXECVE.get_or_init(|| {
        // SAFETY: dlsym with RTLD_NEXT is the documented way for a preloaded
        //         object to find the symbol it interposes. The symbol name is
        //         a valid NUL-terminated string.
        let sym = unsafe { libc::dlsym(libc::RTLD_NEXT, "execve\0".as_ptr().cast()) };
        if sym.is_null() {
            None
        } else {
            // SAFETY: a non-NULL "execve" symbol has the libc execve
            //         signature.
            Some(unsafe { std::mem::transmute::<*mut libc::c_void, ExecveFn>(sym) })
        }
    })
}
