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

use crate::error::{Error, ErrorImpl};

use std::{
    ffi::{CStr, OsStr, OsString},
    os::unix::ffi::OsStrExt,
    path::Path,
};

use libc::{c_char, c_int};

pub(super) unsafe fn parse_path<'a>(path: *const c_char) -> Result<&'a Path, Error> {
    if path.is_null() {
        Err(ErrorImpl::InvalidArgument {
            name: "path".into(),
            description: "cannot be NULL".into(),
        })?
    }
    // SAFETY: C caller guarantees that the path is a valid C-style string.
    let bytes = unsafe { CStr::from_ptr(path) }.to_bytes();
    Ok(OsStr::from_bytes(bytes).as_ref())
}

/// Collect a NULL-terminated array of C strings. A NULL array is treated as
/// empty (some callers really do pass one for argv).
pub(super) unsafe fn parse_string_array(array: *const *const c_char) -> Vec<OsString> {
    let mut strings = Vec::new();
    if array.is_null() {
        return strings;
    }
    let mut cursor = array;
    // SAFETY: the C caller guarantees the array is NULL-terminated and each
    //         non-NULL element is a valid C-style string.
    unsafe {
        while !(*cursor).is_null() {
            strings.push(OsStr::from_bytes(CStr::from_ptr(*cursor).to_bytes()).to_os_string());
            cursor = cursor.add(1);
        }
    }
    strings
}

/// Store the error's errno for the C caller and return the exec-family
/// failure value.
pub(super) fn fail_with(err: &Error) -> c_int {
    let errno = err.kind().errno();
    // SAFETY: __errno_location is the C library's own thread-local errno
    //         slot and is always valid to write.
    unsafe {
        *libc::__errno_location() = errno;
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{ffi::CString, io::Error as IOError, ptr};

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_path_rejects_null() {
        assert_eq!(
            unsafe { parse_path(ptr::null()) }
                .err()
                .map(|err| err.kind()),
            Some(crate::error::ErrorKind::InvalidArgument),
            "NULL path is an invalid argument"
        );
    }

    #[test]
    fn parse_string_array_roundtrips() {
        let strings = [
            CString::new("vlc").unwrap(),
            CString::new("/secret/song.mp3").unwrap(),
        ];
        let array = [
            strings[0].as_ptr(),
            strings[1].as_ptr(),
            ptr::null::<c_char>(),
        ];
        assert_eq!(
            unsafe { parse_string_array(array.as_ptr()) },
            vec![OsString::from("vlc"), OsString::from("/secret/song.mp3")],
        );
        assert_eq!(
            unsafe { parse_string_array(ptr::null()) },
            Vec::<OsString>::new(),
            "a NULL argv parses as empty"
        );
    }

    #[test]
    fn fail_with_sets_errno() {
        let err = Error::from(ErrorImpl::PolicyRefused {
            description: "test refusal".into(),
        });
        // Read errno back before any other call can clobber it.
        let ret = fail_with(&err);
        let raw = IOError::last_os_error().raw_os_error();
        let via_crate = errno::errno().0;

        assert_eq!(ret, -1);
        assert_eq!(
            raw,
            Some(libc::EACCES),
            "the caller-visible errno matches the error kind"
        );
        assert_eq!(
            via_crate, libc::EACCES,
            "the errno crate agrees with the raw location"
        );
    }
}
