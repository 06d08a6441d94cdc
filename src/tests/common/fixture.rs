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

//! Shared fixtures: a temporary policy-file tree and a recording exec
//! backend.

use crate::{
    assoc::Associations,
    dispatch::ExecBackend,
    policy::{Policy, PolicyPaths},
};

use std::{
    cell::{Cell, RefCell},
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use anyhow::Error as TestError;
use tempfile::TempDir;

/// Serializes tests that mutate process-wide state (environment variables
/// and the working directory). Cargo runs tests on multiple threads, and
/// `setenv`/`chdir` have no thread-local variant.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    // A test that panicked while holding the lock doesn't invalidate the
    // environment for the rest of the suite.
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A [`Policy`] whose lists live in a private temporary directory. Lists
/// start out absent (= empty).
pub(crate) struct PolicyFixture {
    pub(crate) dir: TempDir,
    pub(crate) policy: Policy,
}

impl PolicyFixture {
    pub(crate) fn new() -> Result<Self, TestError> {
        let dir = TempDir::new()?;
        let policy = Policy::new(
            PolicyPaths {
                helper_bins: dir.path().join("helper-bins.list"),
                managed_bins: dir.path().join("managed-bins.list"),
                managed_files: dir.path().join("managed-files.list"),
            },
            Associations::builtin(),
        );
        Ok(Self { dir, policy })
    }

    pub(crate) fn write_helpers(&self, contents: &str) -> Result<(), TestError> {
        fs::write(self.dir.path().join("helper-bins.list"), contents)?;
        Ok(())
    }

    pub(crate) fn write_managed_bins(&self, contents: &str) -> Result<(), TestError> {
        fs::write(self.dir.path().join("managed-bins.list"), contents)?;
        Ok(())
    }

    pub(crate) fn write_managed_files(&self, contents: &str) -> Result<(), TestError> {
        fs::write(self.dir.path().join("managed-files.list"), contents)?;
        Ok(())
    }
}

/// An [`ExecBackend`] that records image-replacement attempts instead of
/// performing them.
#[derive(Default)]
pub(crate) struct RecordingExec {
    calls: RefCell<Vec<(PathBuf, Vec<OsString>)>>,
    errno: Cell<i32>,
}

impl RecordingExec {
    /// A backend whose every exec attempt "returns" with `errno`, like the
    /// real one does when the target cannot be executed.
    pub(crate) fn failing_with(errno: i32) -> Self {
        let backend = Self::default();
        backend.errno.set(errno);
        backend
    }

    pub(crate) fn calls(&self) -> Vec<(PathBuf, Vec<OsString>)> {
        self.calls.borrow().clone()
    }
}

impl ExecBackend for RecordingExec {
    fn execute(&self, path: &Path, argv: &[OsString]) -> i32 {
        self.calls
            .borrow_mut()
            .push((path.to_path_buf(), argv.to_vec()));
        self.errno.get()
    }
}
