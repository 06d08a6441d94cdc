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

//! Flag types used by libexecgate.

use crate::error::{Error, ErrorImpl};

use bitflags::bitflags;

bitflags! {
    /// Mode flags for [`canonicalize`].
    ///
    /// Exactly one of [`EXISTING`], [`ALL_BUT_LAST`] and [`MISSING`] must be
    /// set; [`NOLINKS`] may be combined with any of them.
    ///
    /// [`canonicalize`]: crate::canon::canonicalize
    /// [`EXISTING`]: CanonFlags::EXISTING
    /// [`ALL_BUT_LAST`]: CanonFlags::ALL_BUT_LAST
    /// [`MISSING`]: CanonFlags::MISSING
    /// [`NOLINKS`]: CanonFlags::NOLINKS
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CanonFlags: u32 {
        /// Every path component must exist.
        const EXISTING = 0x01;
        /// Every path component except the last must exist.
        const ALL_BUT_LAST = 0x02;
        /// No existence requirement on any component.
        const MISSING = 0x04;
        /// Do not follow symbolic links.
        const NOLINKS = 0x10;
    }
}

impl CanonFlags {
    const MODE_MASK: Self = Self::EXISTING
        .union(Self::ALL_BUT_LAST)
        .union(Self::MISSING);

    /// Verify that exactly one mode bit is set.
    pub(crate) fn check_one_mode(self) -> Result<(), Error> {
        if self.intersection(Self::MODE_MASK).bits().count_ones() != 1 {
            Err(ErrorImpl::InvalidArgument {
                name: "flags".into(),
                description: "exactly one canonicalization mode must be set".into(),
            })?
        }
        Ok(())
    }
}

bitflags! {
    /// Classification tags assigned to each entry of an intercepted exec
    /// call. Index 0 of the decision array is the executable itself, later
    /// indices are its arguments.
    ///
    /// As a *mask* (rather than a tag), the same type describes which classes
    /// of binary a sandboxed process may exec directly -- see
    /// [`ExecClass::DEFAULT_POLICY`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExecClass: u32 {
        /// No classification was possible.
        const NOTHING = 0;
        /// The binary is a helper of the sandboxed application (helpers list
        /// hit or association-group member).
        const HELPERS = 0x01;
        /// No policy list matched.
        const UNSPECIFIED = 0x02;
        /// The path is managed by the sandbox supervisor (managed-bins or
        /// managed-files list hit).
        const SANDBOX_MANAGED = 0x04;
        /// The path is the sandbox supervisor itself.
        const SANDBOX_ITSELF = 0x08;
    }
}

impl ExecClass {
    /// Default policy applied to the target binary of an exec call: helpers
    /// and unclassified binaries run directly, everything else is delegated.
    pub const DEFAULT_POLICY: Self = Self::HELPERS.union(Self::UNSPECIFIED);

    /// Whether this tag lets the tagged entry take part in an in-sandbox
    /// exec. Any other tag makes the whole call forbidden-bearing.
    pub(crate) fn permits_direct_exec(self) -> bool {
        self.intersects(Self::DEFAULT_POLICY)
    }
}
