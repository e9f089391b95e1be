// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod linux;
pub mod memory;

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::options::MountOptions;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use linux::LinuxBackend;
pub use memory::MemoryBackend;

/// What a mutating backend call actually did.
///
/// `Unchanged` means the system was already in the target state when the
/// backend got there; the executor uses it to downgrade the planned
/// updated flag, never to upgrade it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Changed,
    Unchanged,
}

/// One entry of the persistent mount registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub device: String,
    pub fstype: String,
    pub options: MountOptions,
}

/// The OS-facing collaborator: the live mount table plus the persistent
/// boot-time registry. The core never touches the OS except through this
/// trait, and never branches on platform.
///
/// Errors are plain `anyhow` diagnostics; the core wraps them with the
/// failing operation and resource identity.
pub trait MountBackend {
    /// Whether `mount_point` currently appears in the live mount table.
    fn is_mounted(&self, mount_point: &Path) -> Result<bool>;

    fn mount(
        &mut self,
        device: &str,
        mount_point: &Path,
        fstype: &str,
        options: &MountOptions,
    ) -> Result<Outcome>;

    fn unmount(&mut self, mount_point: &Path) -> Result<Outcome>;

    /// Re-applies options to a live mount. Only called for mounted points.
    fn remount(&mut self, mount_point: &Path, options: &MountOptions) -> Result<Outcome>;

    fn read_registry_entry(&self, mount_point: &Path) -> Result<Option<RegistryEntry>>;

    /// Inserts or replaces the registry entry for `mount_point`. Must be
    /// atomic from the caller's view: no half-written entry is ever
    /// observable.
    fn write_registry_entry(&mut self, mount_point: &Path, entry: &RegistryEntry)
    -> Result<Outcome>;

    fn remove_registry_entry(&mut self, mount_point: &Path) -> Result<Outcome>;
}
