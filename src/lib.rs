// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! Convergent resource controller for filesystem mounts.
//!
//! Given a declared desired state (device, mount point, filesystem type,
//! options, mounted vs. unmounted, enabled vs. disabled at boot), the
//! controller probes the live mount table and the persistent mount registry
//! and applies the minimal set of backend operations needed to converge,
//! reporting whether anything actually changed.
//!
//! The OS mechanics live behind the [`backend::MountBackend`] trait;
//! [`backend::LinuxBackend`] drives mount(2) and an fstab-format registry,
//! [`backend::MemoryBackend`] keeps everything in process for tests and
//! dry runs.

pub mod backend;
pub mod core;
pub mod defs;
pub mod error;
pub mod options;
pub mod resource;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use crate::backend::LinuxBackend;
pub use crate::backend::{MemoryBackend, MountBackend, Outcome, RegistryEntry};
pub use crate::core::{Action, ActionPlan, CurrentState, Decision, MountController};
pub use crate::error::{BackendOp, MountError};
pub use crate::options::MountOptions;
pub use crate::resource::MountResource;
