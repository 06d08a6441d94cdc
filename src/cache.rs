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

//! mtime-aware file contents cache for the policy lists.
//!
//! Policy files are re-read on every exec attempt only if their mtime moved
//! forward since the last load. A file that becomes unreadable (or whose
//! stat fails) keeps serving its previously cached contents, so a policy
//! update racing against the interceptor degrades to stale-but-consistent
//! behavior rather than an open sandbox.

use crate::syscalls;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

#[derive(Debug)]
struct CacheEntry {
    // (seconds, nanoseconds) of the file's last-modified timestamp at load.
    mtime: (i64, i64),
    contents: Arc<[u8]>,
}

/// A byte-preserving cache of whole-file contents keyed by path.
#[derive(Debug, Default)]
pub(crate) struct FileCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl FileCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fetch the contents of `path`, reloading if the file changed since the
    /// last call. Returns `None` only if the file has never been readable.
    pub(crate) fn get(&self, path: &Path) -> Option<Arc<[u8]>> {
        let observed = syscalls::stat(path)
            .ok()
            .map(|st| (st.st_mtime as i64, st.st_mtime_nsec as i64));

        let mut entries = self.entries.lock().expect("file cache lock poisoned");
        if let Some(mtime) = observed {
            let stale = match entries.get(path) {
                Some(entry) => entry.mtime < mtime,
                None => true,
            };
            if stale {
                // A failed read leaves any previous contents in place.
                if let Ok(bytes) = fs::read(path) {
                    entries.insert(
                        path.to_path_buf(),
                        CacheEntry {
                            mtime,
                            contents: bytes.into(),
                        },
                    );
                }
            }
        }
        entries.get(path).map(|entry| Arc::clone(&entry.contents))
    }
}
