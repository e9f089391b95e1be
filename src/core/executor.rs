// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

use crate::{
    backend::{MountBackend, Outcome},
    core::planner::{ActionPlan, Decision},
    error::{BackendOp, MountError},
};

/// Applies a decision through the backend and reconciles the updated flag
/// with what the backend actually did.
///
/// The decider already computed `updated` from a fresh probe; the backend
/// outcome can only downgrade it (`Outcome::Unchanged` means the system
/// was already in the target state), never upgrade it. Backend failures
/// are surfaced with the failing operation and the backend's own
/// diagnostic.
pub fn execute<B: MountBackend>(backend: &mut B, decision: Decision) -> Result<bool, MountError> {
    let planned = decision.updated;

    let (op, device, mount_point, outcome) = match decision.plan {
        ActionPlan::NoOp => return Ok(planned),

        ActionPlan::Mount {
            device,
            mount_point,
            fstype,
            options,
        } => {
            let outcome = backend.mount(&device, &mount_point, &fstype, &options);
            (BackendOp::Mount, device, mount_point, outcome)
        }

        ActionPlan::Unmount {
            device,
            mount_point,
        } => {
            let outcome = backend.unmount(&mount_point);
            (BackendOp::Unmount, device, mount_point, outcome)
        }

        ActionPlan::Remount {
            device,
            mount_point,
            options,
        } => {
            let outcome = backend.remount(&mount_point, &options);
            (BackendOp::Remount, device, mount_point, outcome)
        }

        ActionPlan::WriteRegistry { mount_point, entry } => {
            let device = entry.device.clone();
            let outcome = backend.write_registry_entry(&mount_point, &entry);
            (BackendOp::WriteRegistry, device, mount_point, outcome)
        }

        ActionPlan::RemoveRegistry {
            device,
            mount_point,
        } => {
            let outcome = backend.remove_registry_entry(&mount_point);
            (BackendOp::RemoveRegistry, device, mount_point, outcome)
        }
    };

    let outcome = outcome.map_err(|source| MountError::Backend {
        op,
        device,
        mount_point: mount_point.clone(),
        source,
    })?;

    let updated = planned && outcome == Outcome::Changed;

    if updated {
        log_applied(op, &mount_point);
    } else if planned {
        log::debug!(
            "{} on {} found the target state already in place",
            op,
            mount_point.display()
        );
    }

    Ok(updated)
}

fn log_applied(op: BackendOp, mount_point: &Path) {
    log::info!("{} applied to {}", op, mount_point.display());
}
