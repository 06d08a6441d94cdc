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

//! The three policy lists and their membership semantics.
//!
//! Each list is a newline-separated file of absolute paths, written by the
//! sandbox provisioning tool and re-read (through the mtime cache) on every
//! exec attempt. A list entry matches a candidate path if the candidate
//! equals the entry or extends it across a `/`, so entries double as
//! directory-subtree prefixes.

use crate::{assoc::Associations, cache::FileCache, flags::ExecClass};

use std::{
    iter,
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use memchr::memchr;
#[cfg(feature = "capi")]
use once_cell::sync::Lazy;

/// Binaries an associated application may exec directly.
pub const HELPER_BINS_LIST: &str = "/etc/firejail/self/helper-bins.list";
/// Binaries that must be delegated to the sandbox supervisor.
pub const MANAGED_BINS_LIST: &str = "/etc/firejail/self/managed-bins.list";
/// Files that must not be handed to any binary run in-sandbox.
pub const MANAGED_FILES_LIST: &str = "/etc/firejail/self/managed-files.list";

// Reserved for handing the policy over to the supervisor. Declared for
// provisioning-tool compatibility; nothing in the interceptor reads them.
pub const ENV_ASSOCIATIONS: &str = "FIREJAIL_ASSOCIATIONS";
pub const ENV_SANDBOX_MANAGED: &str = "FIREJAIL_SANDBOX_MANAGED";
pub const ENV_SANDBOX_FILES: &str = "FIREJAIL_SANDBOX_FILES";

/// Locations of the three policy lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyPaths {
    pub helper_bins: PathBuf,
    pub managed_bins: PathBuf,
    pub managed_files: PathBuf,
}

impl Default for PolicyPaths {
    fn default() -> Self {
        Self {
            helper_bins: HELPER_BINS_LIST.into(),
            managed_bins: MANAGED_BINS_LIST.into(),
            managed_files: MANAGED_FILES_LIST.into(),
        }
    }
}

/// Split list contents into entries. Empty lines would act as a
/// match-everything prefix under the membership rules, so they are dropped
/// here; trailing `\r` is not stripped (the lists are written by our own
/// provisioning tool, not by hand).
fn entries(contents: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    let mut rest = contents;
    iter::from_fn(move || loop {
        if rest.is_empty() {
            return None;
        }
        let line = match memchr(b'\n', rest) {
            Some(at) => {
                let (line, tail) = rest.split_at(at);
                rest = &tail[1..];
                line
            }
            None => std::mem::take(&mut rest),
        };
        if !line.is_empty() {
            return Some(line);
        }
    })
}

/// Prefix-on-separator membership: `entry` matches `candidate` iff the
/// candidate equals the entry or extends it with a `/`. A trailing `/` on
/// the entry itself is ignored so that `/a/` behaves like `/a`.
fn entry_matches(entry: &[u8], candidate: &[u8]) -> bool {
    let mut entry = entry;
    while entry.len() > 1 && entry.ends_with(b"/") {
        entry = &entry[..entry.len() - 1];
    }
    if entry == b"/" {
        // The root is the subtree prefix of every absolute path.
        return candidate.starts_with(b"/");
    }
    if entry.is_empty() || !candidate.starts_with(entry) {
        return false;
    }
    candidate.len() == entry.len() || candidate[entry.len()] == b'/'
}

/// Whether any entry of `contents` matches `candidate`.
pub(crate) fn list_matches(contents: &[u8], candidate: &Path) -> bool {
    let candidate = candidate.as_os_str().as_bytes();
    entries(contents).any(|entry| entry_matches(entry, candidate))
}

/// Everything the decision engine consults for one process: the list
/// locations, the contents cache behind them, the association registry and
/// the class mask applied to exec targets.
#[derive(Debug)]
pub struct Policy {
    paths: PolicyPaths,
    cache: FileCache,
    assoc: Associations,
    target_policy: ExecClass,
}

impl Policy {
    pub fn new(paths: PolicyPaths, assoc: Associations) -> Self {
        Self {
            paths,
            cache: FileCache::new(),
            assoc,
            target_policy: ExecClass::DEFAULT_POLICY,
        }
    }

    pub fn assoc(&self) -> &Associations {
        &self.assoc
    }

    pub(crate) fn target_policy(&self) -> ExecClass {
        self.target_policy
    }

    fn file_matches(&self, list: &Path, candidate: &Path) -> bool {
        // A list that was never readable is simply empty.
        self.cache
            .get(list)
            .map(|contents| list_matches(&contents, candidate))
            .unwrap_or(false)
    }

    pub(crate) fn helpers_match(&self, candidate: &Path) -> bool {
        self.file_matches(&self.paths.helper_bins, candidate)
    }

    pub(crate) fn managed_bins_match(&self, candidate: &Path) -> bool {
        self.file_matches(&self.paths.managed_bins, candidate)
    }

    pub(crate) fn managed_files_match(&self, candidate: &Path) -> bool {
        self.file_matches(&self.paths.managed_files, candidate)
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(PolicyPaths::default(), Associations::builtin())
    }
}

/// The per-process policy singleton used by the interception entry points.
/// Lazily initialized on the first intercepted exec.
#[cfg(feature = "capi")]
pub(crate) static GLOBAL_POLICY: Lazy<Policy> = Lazy::new(Policy::default);

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn matches(entry: &str, candidate: &str) -> bool {
        entry_matches(entry.as_bytes(), candidate.as_bytes())
    }

    #[test]
    fn prefix_on_separator() {
        assert!(matches("/a/b", "/a/b"), "exact match");
        assert!(matches("/a", "/a/b"), "subtree prefix match");
        assert!(!matches("/a/bc", "/a/b"), "longer entry does not match");
        assert!(!matches("/a/b", "/a/bc"), "no match without a separator");
        assert!(!matches("/ab", "/a"), "prefix of the entry is not enough");
        assert!(!matches("/a", "/ab"), "/a does not match /ab");
    }

    #[test]
    fn trailing_separator_on_entry_is_ignored() {
        assert!(matches("/a/", "/a/b"), "/a/ behaves like /a");
        assert!(matches("/a/", "/a"), "/a/ still matches /a exactly");
        assert!(matches("/", "/anything"), "the root entry matches everything");
    }

    #[test]
    fn empty_lines_are_skipped() {
        let contents = b"\n/tmp/a\n\n/tmp/b\n\n";
        assert_eq!(
            entries(&contents[..]).collect::<Vec<_>>(),
            vec![&b"/tmp/a"[..], &b"/tmp/b"[..]],
            "blank lines must not become match-everything entries"
        );
        assert!(
            !list_matches(b"\n\n", Path::new("/etc/passwd")),
            "a list of blank lines matches nothing"
        );
    }

    #[test]
    fn list_membership() {
        let contents = b"/tmp/a\n/tmp/b\n";
        assert!(list_matches(contents, Path::new("/tmp/b/sub/file")));
        assert!(list_matches(contents, Path::new("/tmp/a")));
        assert!(!list_matches(contents, Path::new("/tmp/c")));
        assert!(!list_matches(contents, Path::new("/tmp/bb")));
    }

    #[test]
    fn missing_list_is_empty() {
        let policy = Policy::new(
            PolicyPaths {
                helper_bins: "/nonexistent/helpers.list".into(),
                managed_bins: "/nonexistent/managed.list".into(),
                managed_files: "/nonexistent/files.list".into(),
            },
            Associations::builtin(),
        );
        assert!(!policy.helpers_match(Path::new("/usr/bin/firefox")));
        assert!(!policy.managed_files_match(Path::new("/secret")));
    }
}
