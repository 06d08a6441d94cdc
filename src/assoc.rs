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

//! The binary-association registry.
//!
//! Desktop applications are rarely a single binary: a browser spawns its
//! crash reporter, an office suite spawns its splash helper. Binaries that
//! cooperate like this are grouped under a single "main" identity so the
//! decision engine can let a sandboxed application exec its own helpers
//! without supervisor mediation.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use itertools::Itertools;

/// Built-in association table. Each group is an ordered member list whose
/// *last* element is the group's main key. The table is configuration, not
/// behavior: embedders construct [`Associations`] from their own tables.
pub const DEFAULT_ASSOCIATIONS: &[&[&str]] = &[
    &[
        "/usr/lib/firefox/firefox",
        "/usr/lib/firefox/plugin-container",
        "/usr/lib/firefox/crashreporter",
        "/usr/bin/firefox",
    ],
    &[
        "/usr/lib/libreoffice/program/soffice.bin",
        "/usr/lib/libreoffice/program/oosplash",
        "/usr/bin/libreoffice",
    ],
    &[
        "/usr/lib/thunderbird/thunderbird",
        "/usr/lib/thunderbird/thunderbird-bin",
        "/usr/bin/thunderbird",
    ],
];

/// Groups of cooperating binaries, indexed by every member.
///
/// Invariant: every index value points at the group whose last member is
/// the main key, and every member of a group appears in the index.
#[derive(Debug)]
pub struct Associations {
    groups: Vec<Vec<PathBuf>>,
    index: HashMap<PathBuf, usize>,
}

impl Associations {
    /// Build a registry from an association table. Empty groups are
    /// ignored. A binary listed in two groups belongs to the first.
    pub fn new(table: &[&[&str]]) -> Self {
        let mut groups = Vec::with_capacity(table.len());
        let mut index = HashMap::new();
        for members in table {
            if members.is_empty() {
                continue;
            }
            let group: Vec<PathBuf> = members.iter().map(PathBuf::from).collect();
            for member in &group {
                index.entry(member.clone()).or_insert(groups.len());
            }
            groups.push(group);
        }
        Self { groups, index }
    }

    /// The registry for the built-in [`DEFAULT_ASSOCIATIONS`] table.
    pub fn builtin() -> Self {
        Self::new(DEFAULT_ASSOCIATIONS)
    }

    fn group_of(&self, binary: &Path) -> Option<&[PathBuf]> {
        self.index
            .get(binary)
            .map(|&idx| self.groups[idx].as_slice())
    }

    /// Whether `callee` belongs to the same association group as `caller`.
    ///
    /// An unknown caller yields `false`.
    // TODO: Fall back to asking the packaging system which package owns the
    //       two binaries when the caller is not in the table.
    pub fn is_associated(&self, caller: &Path, callee: &Path) -> bool {
        self.group_of(caller)
            .map(|members| members.iter().any(|member| member == callee))
            .unwrap_or(false)
    }

    /// The ordered member list of the group whose main key is `main_key`.
    pub fn members_of(&self, main_key: &Path) -> Option<&[PathBuf]> {
        self.group_of(main_key)
            .filter(|members| members.last().map(PathBuf::as_path) == Some(main_key))
    }

    /// The main key of the group `binary` belongs to, if any.
    pub fn main_key_of(&self, binary: &Path) -> Option<&Path> {
        self.group_of(binary)
            .and_then(|members| members.last())
            .map(PathBuf::as_path)
    }

    /// A colon-separated rendering of `binary`'s group, or the empty string
    /// for an unknown binary. This is the format the supervisor hand-off
    /// environment expects.
    pub fn describe_for(&self, binary: &Path) -> String {
        self.group_of(binary)
            .map(|members| members.iter().map(|member| member.display()).join(":"))
            .unwrap_or_default()
    }
}
