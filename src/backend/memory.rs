// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Result, bail};

use crate::options::MountOptions;

use super::{MountBackend, Outcome, RegistryEntry};

/// What the in-memory mount table records for a mounted point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMount {
    pub device: String,
    pub fstype: String,
    pub options: MountOptions,
}

/// Per-operation call counters, for asserting that converged actions stay
/// off the backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallCounts {
    pub mount: usize,
    pub unmount: usize,
    pub remount: usize,
    pub registry_write: usize,
    pub registry_remove: usize,
}

/// An in-process mount backend: the mount table and registry are maps.
///
/// Used by the test suite and usable by embedders as a dry-run target.
/// `fail_next` makes the next mutating call fail with the given
/// diagnostic; `fail_queries` makes every state query fail until
/// cleared, for exercising error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    mounts: BTreeMap<PathBuf, LiveMount>,
    registry: BTreeMap<PathBuf, RegistryEntry>,
    pub calls: CallCounts,
    fail_next: Option<String>,
    fail_queries: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure for the next mutating operation.
    pub fn fail_next(&mut self, diagnostic: impl Into<String>) {
        self.fail_next = Some(diagnostic.into());
    }

    /// Makes every state query (mount table, registry read) fail with the
    /// given diagnostic until cleared, like an unreadable mount table.
    pub fn fail_queries(&mut self, diagnostic: impl Into<String>) {
        self.fail_queries = Some(diagnostic.into());
    }

    pub fn clear_query_failure(&mut self) {
        self.fail_queries = None;
    }

    pub fn reset_calls(&mut self) {
        self.calls = CallCounts::default();
    }

    /// The live mount record for `mount_point`, if mounted.
    pub fn live(&self, mount_point: &Path) -> Option<&LiveMount> {
        self.mounts.get(mount_point)
    }

    fn take_failure(&mut self) -> Result<()> {
        if let Some(diag) = self.fail_next.take() {
            bail!("{}", diag);
        }
        Ok(())
    }

    fn query_failure(&self) -> Result<()> {
        if let Some(diag) = &self.fail_queries {
            bail!("{}", diag);
        }
        Ok(())
    }
}

impl MountBackend for MemoryBackend {
    fn is_mounted(&self, mount_point: &Path) -> Result<bool> {
        self.query_failure()?;
        Ok(self.mounts.contains_key(mount_point))
    }

    fn mount(
        &mut self,
        device: &str,
        mount_point: &Path,
        fstype: &str,
        options: &MountOptions,
    ) -> Result<Outcome> {
        self.calls.mount += 1;
        self.take_failure()?;

        if self.mounts.contains_key(mount_point) {
            return Ok(Outcome::Unchanged);
        }

        self.mounts.insert(
            mount_point.to_path_buf(),
            LiveMount {
                device: device.to_string(),
                fstype: fstype.to_string(),
                options: options.clone(),
            },
        );

        Ok(Outcome::Changed)
    }

    fn unmount(&mut self, mount_point: &Path) -> Result<Outcome> {
        self.calls.unmount += 1;
        self.take_failure()?;

        match self.mounts.remove(mount_point) {
            Some(_) => Ok(Outcome::Changed),
            None => Ok(Outcome::Unchanged),
        }
    }

    fn remount(&mut self, mount_point: &Path, options: &MountOptions) -> Result<Outcome> {
        self.calls.remount += 1;
        self.take_failure()?;

        match self.mounts.get_mut(mount_point) {
            Some(live) => {
                live.options = options.clone();
                Ok(Outcome::Changed)
            }
            None => bail!("{}: not mounted", mount_point.display()),
        }
    }

    fn read_registry_entry(&self, mount_point: &Path) -> Result<Option<RegistryEntry>> {
        self.query_failure()?;
        Ok(self.registry.get(mount_point).cloned())
    }

    fn write_registry_entry(
        &mut self,
        mount_point: &Path,
        entry: &RegistryEntry,
    ) -> Result<Outcome> {
        self.calls.registry_write += 1;
        self.take_failure()?;

        if self.registry.get(mount_point) == Some(entry) {
            return Ok(Outcome::Unchanged);
        }

        self.registry
            .insert(mount_point.to_path_buf(), entry.clone());

        Ok(Outcome::Changed)
    }

    fn remove_registry_entry(&mut self, mount_point: &Path) -> Result<Outcome> {
        self.calls.registry_remove += 1;
        self.take_failure()?;

        match self.registry.remove(mount_point) {
            Some(_) => Ok(Outcome::Changed),
            None => Ok(Outcome::Unchanged),
        }
    }
}
