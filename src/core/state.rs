// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeSet;

use crate::{backend::MountBackend, error::MountError, resource::MountResource};

/// Snapshot of what the host actually looks like for one mount point.
///
/// Mounted and enabled are two independent axes: the live mount table
/// knows nothing of the boot registry and vice versa. The snapshot is
/// taken fresh before every decision and never cached across actions.
#[derive(Debug, Clone, Default)]
pub struct CurrentState {
    pub mounted: bool,
    pub enabled: bool,
    pub registered_options: BTreeSet<String>,
}

/// Queries the backend for the current state of `resource`'s mount point.
///
/// Read-only. A registry entry whose device or fstype differ from the
/// desired state is still "enabled"; judging drift is the decider's job.
/// Fails only when the backend itself cannot answer.
pub fn probe<B: MountBackend>(
    backend: &B,
    resource: &MountResource,
) -> Result<CurrentState, MountError> {
    let wrap = |source: anyhow::Error| MountError::Probe {
        mount_point: resource.mount_point.clone(),
        source,
    };

    let mounted = backend.is_mounted(&resource.mount_point).map_err(wrap)?;

    let entry = backend
        .read_registry_entry(&resource.mount_point)
        .map_err(wrap)?;

    let (enabled, registered_options) = match entry {
        Some(entry) => (true, entry.options.normalized()),
        None => (false, BTreeSet::new()),
    };

    log::debug!(
        "probe {}: mounted={} enabled={}",
        resource.mount_point.display(),
        mounted,
        enabled
    );

    Ok(CurrentState {
        mounted,
        enabled,
        registered_options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::{MemoryBackend, RegistryEntry},
        options::MountOptions,
    };

    fn resource() -> MountResource {
        MountResource::new("/mnt/t", "/dev/ram1", "tmpfs").unwrap()
    }

    #[test]
    fn fresh_host_probes_as_neither_mounted_nor_enabled() {
        let backend = MemoryBackend::new();
        let state = probe(&backend, &resource()).unwrap();

        assert!(!state.mounted);
        assert!(!state.enabled);
        assert!(state.registered_options.is_empty());
    }

    #[test]
    fn registry_entry_with_drifted_device_still_reads_as_enabled() {
        let mut backend = MemoryBackend::new();
        backend
            .write_registry_entry(
                std::path::Path::new("/mnt/t"),
                &RegistryEntry {
                    device: "/dev/other".to_string(),
                    fstype: "ext4".to_string(),
                    options: MountOptions::parse("nodev"),
                },
            )
            .unwrap();

        let state = probe(&backend, &resource()).unwrap();

        assert!(state.enabled);
        assert!(state.registered_options.contains("nodev"));
        assert!(!state.mounted);
    }
}
