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

//! Userspace path canonicalization.
//!
//! The interceptor cannot rely on `realpath(3)` because it needs to resolve
//! *hypothetical* paths -- an argument a sandboxed program wants to hand to
//! another binary may name a file that does not exist yet, but its canonical
//! form still has to be compared against the policy lists. The walk here is
//! the classic component-by-component resolution (splice symlink targets
//! back into the unprocessed input, reset to `/` on absolute link targets)
//! with an explicit mode deciding how much of the path must exist.

use crate::{
    error::{Error, ErrorExt, ErrorImpl},
    flags::CanonFlags,
    syscalls,
};

use std::{
    collections::{HashSet, VecDeque},
    env,
    ffi::{OsStr, OsString},
    io::Error as IOError,
    os::unix::ffi::{OsStrExt, OsStringExt},
    path::{Path, PathBuf},
};

use rustix::fs::FileType;

/// Initial `readlink(2)` buffer size. Most link targets are short, so start
/// small and grow on truncation.
const READLINK_START_SIZE: usize = 128;
/// Ceiling for the `readlink(2)` buffer. A link target longer than this
/// cannot be a usable path component chain anyway (PATH_MAX).
const READLINK_MAX_SIZE: usize = 4096;

/// Split a byte path into its components, in order.
fn components_of(bytes: &[u8]) -> impl DoubleEndedIterator<Item = OsString> + '_ {
    bytes
        .split(|&b| b == b'/')
        .map(|comp| OsStr::from_bytes(comp).to_os_string())
}

/// Read a symlink target, growing the buffer geometrically on truncation.
fn read_link_target(link: &Path) -> Result<Vec<u8>, Error> {
    let mut size = READLINK_START_SIZE;
    loop {
        let mut buf = vec![0u8; size];
        let len = syscalls::readlink_into(link, &mut buf).map_err(|err| ErrorImpl::OsError {
            operation: "readlink symlink component".into(),
            source: err,
        })?;
        // A full buffer means the target may have been truncated.
        if len < buf.len() {
            buf.truncate(len);
            return Ok(buf);
        }
        if size >= READLINK_MAX_SIZE {
            Err(ErrorImpl::OsError {
                operation: "readlink symlink component".into(),
                source: IOError::from_raw_os_error(libc::ENOMEM),
            })
            .with_wrap(|| format!("symlink target longer than {READLINK_MAX_SIZE} bytes"))?
        }
        size = std::cmp::min(size * 2, READLINK_MAX_SIZE);
    }
}

/// Expand a leading `~/` using `$HOME` and anchor relative paths to the
/// current working directory. Returns the starting output buffer and the
/// component queue.
fn start_walk(path: &OsStr) -> Result<(PathBuf, VecDeque<OsString>), Error> {
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        Err(ErrorImpl::OsError {
            operation: "canonicalize path".into(),
            source: IOError::from_raw_os_error(libc::ENOENT),
        })
        .wrap("empty path")?
    }

    let expanded: Vec<u8> = if bytes.starts_with(b"~/") {
        let home = env::var_os("HOME").ok_or_else(|| {
            Error::from(ErrorImpl::OsError {
                operation: "expand ~ prefix".into(),
                source: IOError::from_raw_os_error(libc::ENOENT),
            })
            .wrap("HOME is not set")
        })?;
        let mut joined = home.into_vec();
        joined.extend_from_slice(&bytes[1..]);
        joined
    } else {
        bytes.to_vec()
    };

    let start = if expanded.starts_with(b"/") {
        PathBuf::from("/")
    } else {
        syscalls::getcwd().map_err(|err| ErrorImpl::OsError {
            operation: "get working directory for relative path".into(),
            source: err,
        })?
    };

    Ok((start, components_of(&expanded).collect()))
}

/// Resolve `path` to an absolute form with no `.`, `..` or repeated
/// separators, under the existence and symlink rules selected by `flags`.
///
/// See [`CanonFlags`] for the mode contract. With
/// [`CanonFlags::NOLINKS`] symlinks are left in place as ordinary
/// components; otherwise their targets are spliced into the remaining input
/// and resolution continues, with a `(link, device, inode)` set bounding
/// traversal so that cycles fail with `ELOOP` (or, in
/// [`CanonFlags::MISSING`] mode, leave the offending link unresolved).
pub fn canonicalize<P: AsRef<Path>>(path: P, flags: CanonFlags) -> Result<PathBuf, Error> {
    flags.check_one_mode()?;
    let nolinks = flags.contains(CanonFlags::NOLINKS);
    let missing_ok = flags.contains(CanonFlags::MISSING);

    let (mut result, mut remaining) = start_walk(path.as_ref().as_os_str())?;

    // Symlinks followed so far, keyed by (link path, device, inode). Seeing
    // the same triple twice in one walk means the links form a cycle.
    let mut followed: HashSet<(PathBuf, u64, u64)> = HashSet::new();

    while let Some(part) = remaining.pop_front() {
        match part.as_bytes() {
            // Runs of "/" and "." components don't change the result.
            b"" | b"." => continue,
            b".." => {
                // All of result is already symlink-free, so ".." is lexical.
                // pop() returning false means we are at the root, where ".."
                // is a no-op.
                result.pop();
                continue;
            }
            _ => result.push(&part),
        }

        // MISSING without link-chasing has nothing to learn from the
        // filesystem, which also makes it usable on wholly absent trees.
        if nolinks && missing_ok {
            continue;
        }

        let st = match syscalls::lstat(&result) {
            Ok(st) => st,
            Err(err) => {
                if missing_ok {
                    continue;
                }
                let is_last = remaining.is_empty();
                if flags.contains(CanonFlags::ALL_BUT_LAST)
                    && is_last
                    && err.raw_os_error() == Some(libc::ENOENT)
                {
                    continue;
                }
                return Err(Error::from(ErrorImpl::OsError {
                    operation: "stat path component".into(),
                    source: err,
                }))
                .with_wrap(|| format!("walk {}", result.display()));
            }
        };

        let ftype = FileType::from_raw_mode(st.st_mode as rustix::fs::RawMode);
        if ftype == FileType::Symlink && !nolinks {
            let key = (result.clone(), st.st_dev as u64, st.st_ino as u64);
            if !followed.insert(key) {
                if missing_ok {
                    // Leave the looping link in place as an ordinary
                    // component.
                    continue;
                }
                return Err(Error::from(ErrorImpl::OsError {
                    operation: "resolve symlink component".into(),
                    source: IOError::from_raw_os_error(libc::ELOOP),
                }))
                .with_wrap(|| format!("symlink loop through {}", result.display()));
            }

            let target = read_link_target(&result)?;

            // Splice the link target in front of the unprocessed input. The
            // link name itself is dropped from the output; an absolute
            // target restarts the output at the root.
            result.pop();
            if target.starts_with(b"/") {
                result = PathBuf::from("/");
            }
            for comp in components_of(&target).rev() {
                remaining.push_front(comp);
            }
            continue;
        }

        if !remaining.is_empty() && ftype != FileType::Directory && !missing_ok {
            return Err(Error::from(ErrorImpl::OsError {
                operation: "walk path component".into(),
                source: IOError::from_raw_os_error(libc::ENOTDIR),
            }))
            .with_wrap(|| format!("{} is not a directory", result.display()));
        }
    }

    Ok(result)
}

/// Resolve `path` to its canonical absolute form, tolerating components
/// that do not exist yet.
///
/// This is a two-pass operation: the first pass normalizes the path
/// lexically without touching symlinks, the second resolves every symlink
/// that actually exists. Callers get a stable canonical form for
/// hypothetical paths whose tails have not been created, while symlinks in
/// the existing portion still collapse.
pub fn realpath<P: AsRef<Path>>(path: P) -> Result<PathBuf, Error> {
    let lexical = canonicalize(path, CanonFlags::MISSING | CanonFlags::NOLINKS)?;
    canonicalize(lexical, CanonFlags::MISSING)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorKind;
    use crate::tests::common::env_lock;

    use std::{fs, os::unix::fs as unixfs};

    use anyhow::Error as TestError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn canon_err<P: AsRef<Path>>(path: P, flags: CanonFlags) -> Option<ErrorKind> {
        canonicalize(path, flags).err().map(|err| err.kind())
    }

    #[test]
    fn mode_flags_validated() {
        assert_eq!(
            canon_err("/etc", CanonFlags::EXISTING | CanonFlags::MISSING),
            Some(ErrorKind::InvalidArgument),
            "two mode bits"
        );
        assert_eq!(
            canon_err("/etc", CanonFlags::NOLINKS),
            Some(ErrorKind::InvalidArgument),
            "no mode bit"
        );
    }

    #[test]
    fn empty_path_is_enoent() {
        assert_eq!(
            canon_err("", CanonFlags::MISSING),
            Some(ErrorKind::OsError(Some(libc::ENOENT))),
            "empty path must fail not-found"
        );
    }

    #[test]
    fn lexical_normalization() -> Result<(), TestError> {
        // MISSING|NOLINKS never touches the filesystem, so entirely
        // imaginary trees normalize fine.
        let flags = CanonFlags::MISSING | CanonFlags::NOLINKS;
        assert_eq!(
            canonicalize("/a//b/./c/../d", flags)?,
            PathBuf::from("/a/b/d"),
            "dot, dot-dot and duplicate separators collapse"
        );
        assert_eq!(
            canonicalize("/../../x", flags)?,
            PathBuf::from("/x"),
            "dot-dot at the root is a no-op"
        );
        assert_eq!(canonicalize("/", flags)?, PathBuf::from("/"));
        Ok(())
    }

    #[test]
    fn relative_paths_anchor_to_cwd() -> Result<(), TestError> {
        let _env = env_lock();
        let cwd = syscalls::getcwd()?;
        assert_eq!(
            canonicalize("some/rel/path", CanonFlags::MISSING | CanonFlags::NOLINKS)?,
            cwd.join("some/rel/path"),
            "relative inputs resolve against the working directory"
        );
        Ok(())
    }

    #[test]
    fn tilde_expansion() -> Result<(), TestError> {
        let _env = env_lock();
        let old_home = env::var_os("HOME");
        env::set_var("HOME", "/home/u");
        let res = canonicalize("~/docs/./../docs", CanonFlags::MISSING | CanonFlags::NOLINKS);
        env::remove_var("HOME");
        let res_unset = canonicalize("~/docs", CanonFlags::MISSING | CanonFlags::NOLINKS);
        match old_home {
            Some(home) => env::set_var("HOME", home),
            None => env::remove_var("HOME"),
        }

        assert_eq!(res?, PathBuf::from("/home/u/docs"), "~/ expands from HOME");
        assert_eq!(
            res_unset.err().map(|err| err.kind()),
            Some(ErrorKind::OsError(Some(libc::ENOENT))),
            "~/ with unset HOME fails not-found"
        );
        Ok(())
    }

    #[test]
    fn symlinks_resolve() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        fs::create_dir_all(root.join("a/b"))?;
        fs::write(root.join("a/b/file"), b"x")?;
        unixfs::symlink("a/b", root.join("rel-link"))?;
        unixfs::symlink(root.join("a"), root.join("abs-link"))?;

        assert_eq!(
            canonicalize(root.join("rel-link/file"), CanonFlags::EXISTING)?,
            root.join("a/b/file"),
            "relative symlink splices into its parent"
        );
        assert_eq!(
            canonicalize(root.join("abs-link/b/file"), CanonFlags::EXISTING)?,
            root.join("a/b/file"),
            "absolute symlink restarts resolution"
        );
        Ok(())
    }

    #[test]
    fn canonicalization_is_idempotent() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        fs::create_dir_all(root.join("x/y"))?;
        unixfs::symlink("x/y", root.join("link"))?;

        let once = realpath(root.join("link/../y/./sub/file"))?;
        let twice = realpath(&once)?;
        assert_eq!(twice, once, "canon(canon(p)) == canon(p)");

        let s = once.as_os_str().as_bytes();
        assert!(s.starts_with(b"/"), "canonical path is absolute");
        for bad in [&b"//"[..], b"/./", b"/../"] {
            assert!(
                !s.windows(bad.len()).any(|w| w == bad),
                "canonical path contains {:?}",
                OsStr::from_bytes(bad)
            );
        }
        Ok(())
    }

    #[test]
    fn existing_mode_requires_presence() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        fs::create_dir(root.join("present"))?;

        assert_eq!(
            canon_err(root.join("present/absent"), CanonFlags::EXISTING),
            Some(ErrorKind::OsError(Some(libc::ENOENT))),
            "EXISTING fails on a missing final component"
        );
        assert!(
            canonicalize(root.join("present/absent"), CanonFlags::ALL_BUT_LAST).is_ok(),
            "ALL_BUT_LAST tolerates a missing final component"
        );
        assert_eq!(
            canon_err(root.join("absent/also-absent"), CanonFlags::ALL_BUT_LAST),
            Some(ErrorKind::OsError(Some(libc::ENOENT))),
            "ALL_BUT_LAST still requires the parent chain"
        );
        Ok(())
    }

    #[test]
    fn mid_path_file_is_enotdir() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        fs::write(root.join("file"), b"x")?;

        assert_eq!(
            canon_err(root.join("file/tail"), CanonFlags::EXISTING),
            Some(ErrorKind::OsError(Some(libc::ENOTDIR))),
            "walking through a regular file fails ENOTDIR"
        );
        assert!(
            canonicalize(root.join("file/tail"), CanonFlags::MISSING).is_ok(),
            "MISSING mode does not care"
        );
        Ok(())
    }

    #[test]
    fn self_symlink_loops() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        unixfs::symlink("self", root.join("self"))?;

        assert_eq!(
            canon_err(root.join("self"), CanonFlags::EXISTING),
            Some(ErrorKind::OsError(Some(libc::ELOOP))),
            "a -> a fails ELOOP under EXISTING"
        );
        assert_eq!(
            canonicalize(root.join("self"), CanonFlags::MISSING)?,
            root.join("self"),
            "a -> a is skipped under MISSING"
        );
        Ok(())
    }

    #[test]
    fn mutual_symlink_loops() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        unixfs::symlink("pong", root.join("ping"))?;
        unixfs::symlink("ping", root.join("pong"))?;

        assert_eq!(
            canon_err(root.join("ping/tail"), CanonFlags::EXISTING),
            Some(ErrorKind::OsError(Some(libc::ELOOP))),
            "mutually recursive links fail ELOOP"
        );
        Ok(())
    }

    #[test]
    fn long_link_targets_grow_the_buffer() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        // Longer than READLINK_START_SIZE but a perfectly legal target
        // (one component, so comfortably below NAME_MAX).
        let long = format!("{}/{}", root.display(), "x".repeat(200));
        fs::create_dir(root.join("x".repeat(200)))?;
        unixfs::symlink(&long, root.join("long"))?;

        assert_eq!(
            canonicalize(root.join("long"), CanonFlags::EXISTING)?,
            PathBuf::from(&long),
            "link targets longer than the initial buffer resolve"
        );
        Ok(())
    }

    #[test]
    fn two_pass_realpath_resolves_existing_prefix() -> Result<(), TestError> {
        let dir = TempDir::new()?;
        let root = dir.path();
        fs::create_dir(root.join("real"))?;
        unixfs::symlink("real", root.join("link"))?;

        // The tail does not exist, but the symlinked prefix still collapses.
        assert_eq!(
            realpath(root.join("link/not/yet/created"))?,
            root.join("real/not/yet/created"),
            "hypothetical tails keep the resolved prefix"
        );
        Ok(())
    }
}
