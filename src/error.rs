// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// The backend operation that failed, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOp {
    Mount,
    Unmount,
    Remount,
    WriteRegistry,
    RemoveRegistry,
}

impl fmt::Display for BackendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendOp::Mount => "mount",
            BackendOp::Unmount => "unmount",
            BackendOp::Remount => "remount",
            BackendOp::WriteRegistry => "registry write",
            BackendOp::RemoveRegistry => "registry remove",
        };
        f.write_str(name)
    }
}

/// Everything a controller action can fail with.
///
/// Any of these aborts the current action before or at the failing backend
/// call; `was_updated()` keeps its pre-call value and must not be trusted
/// after an error return.
#[derive(Debug, Error)]
pub enum MountError {
    /// The current-state query itself failed (mount table or registry
    /// unreadable). Nothing was mutated.
    #[error("failed to probe state of {}: {source:#}", mount_point.display())]
    Probe {
        mount_point: PathBuf,
        source: anyhow::Error,
    },

    /// Remount was requested but the resource was not declared remountable.
    /// This is a configuration error, never downgraded to a no-op.
    #[error("remount requested for {} but the resource does not support remount", mount_point.display())]
    UnsupportedRemount { mount_point: PathBuf },

    /// A mutating backend operation failed at the OS level. The backend
    /// diagnostic is preserved verbatim; the core does not retry.
    #[error("{op} failed for '{device}' on {}: {source:#}", mount_point.display())]
    Backend {
        op: BackendOp,
        device: String,
        mount_point: PathBuf,
        source: anyhow::Error,
    },

    /// The desired state violates a structural invariant, e.g. an empty
    /// device for a mount action.
    #[error("invalid mount resource {}: {reason}", mount_point.display())]
    InvalidResource {
        mount_point: PathBuf,
        reason: String,
    },
}
