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

//! libexecgate makes a sandboxed process self-censor its exec calls.
//!
//! The library is loaded into sandboxed processes with `LD_PRELOAD` and
//! shadows the exec family. Every intercepted call is split into an
//! *allowed* and a *forbidden* half against three provisioner-written
//! policy lists: the allowed half is executed unchanged, the forbidden
//! half is redirected onto a non-existent sentinel path below
//! [`dispatch::SENTINEL_PREFIX`] so an out-of-process supervisor observes
//! the attempt and can mediate with the user.
//!
//! This is advisory containment, not enforcement: a process that bypasses
//! libc or scrubs its own environment can exec whatever the kernel lets
//! it. Catching that is the supervisor's job; the interceptor's job is to
//! make cooperative programs work unmodified inside the sandbox while
//! every policy-relevant exec becomes visible outside it.
//!
//! # Example
//!
//! The Rust core is usable directly, e.g. by supervisor-side tooling that
//! wants to predict what the interceptor will do with a given command
//! line:
//!
//! ```
//! # use execgate::{decision, dispatch, policy::Policy};
//! # use std::path::Path;
//! let policy = Policy::default();
//! let argv = dispatch::argv_of(&["vlc", "/secret/song.mp3"]);
//! let decision = decision::decide(&policy, None, Path::new("/usr/bin/vlc"), &argv);
//! if let Some(forbidden) = &decision.forbidden {
//!     println!("supervisor would see {}", dispatch::sentinel_path(&forbidden.target).display());
//! }
//! ```
//!
//! # Preload usage
//!
//! The interception symbols (`execve`, `execvp`, `execvpe`, `fexecve`)
//! are only compiled with the `capi` feature, and the preload object is
//! built by adding `--crate-type=cdylib`:
//!
//! ```text
//! cargo rustc --release --features capi --crate-type cdylib
//! LD_PRELOAD=libexecgate.so firejail-wrapped-program ...
//! ```

// libexecgate only supports Linux at the moment.
#![cfg(target_os = "linux")]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]

pub mod assoc;
pub mod canon;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod lookup;
pub mod policy;

// C API.
#[cfg(feature = "capi")]
mod capi;

// Internally used helpers.
mod cache;
mod syscalls;
