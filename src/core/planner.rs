// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use crate::{
    backend::RegistryEntry,
    core::state::CurrentState,
    error::MountError,
    options::MountOptions,
    resource::MountResource,
};

/// The five convergence actions a controller exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Mount,
    Umount,
    Remount,
    Enable,
    Disable,
}

/// The single backend mutation an action resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPlan {
    NoOp,
    Mount {
        device: String,
        mount_point: PathBuf,
        fstype: String,
        options: MountOptions,
    },
    Unmount {
        device: String,
        mount_point: PathBuf,
    },
    Remount {
        device: String,
        mount_point: PathBuf,
        options: MountOptions,
    },
    WriteRegistry {
        mount_point: PathBuf,
        entry: RegistryEntry,
    },
    RemoveRegistry {
        device: String,
        mount_point: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub plan: ActionPlan,
    pub updated: bool,
}

impl Decision {
    fn noop() -> Self {
        Self {
            plan: ActionPlan::NoOp,
            updated: false,
        }
    }

    fn change(plan: ActionPlan) -> Self {
        Self {
            plan,
            updated: true,
        }
    }
}

/// Maps (desired, current, action) to the minimal backend mutation.
///
/// Pure: no backend access, no side effects. Mount/umount act on the live
/// mount table only, enable/disable on the registry only; no action
/// touches both axes.
pub fn decide(
    action: Action,
    desired: &MountResource,
    current: &CurrentState,
) -> Result<Decision, MountError> {
    match action {
        Action::Mount => {
            require_device(desired)?;

            if current.mounted {
                return Ok(Decision::noop());
            }

            Ok(Decision::change(ActionPlan::Mount {
                device: desired.device.clone(),
                mount_point: desired.mount_point.clone(),
                fstype: desired.fstype.clone(),
                options: desired.options.clone(),
            }))
        }

        Action::Umount => {
            if !current.mounted {
                return Ok(Decision::noop());
            }

            Ok(Decision::change(ActionPlan::Unmount {
                device: desired.device.clone(),
                mount_point: desired.mount_point.clone(),
            }))
        }

        Action::Remount => {
            // A resource that never declared remount support gets a hard
            // error, not a quiet no-op.
            if !desired.supports_remount {
                return Err(MountError::UnsupportedRemount {
                    mount_point: desired.mount_point.clone(),
                });
            }

            require_device(desired)?;

            if !current.mounted {
                return Ok(Decision::noop());
            }

            // Remount is explicitly requested to re-apply options live, so
            // it counts as a change even when the options already match.
            Ok(Decision::change(ActionPlan::Remount {
                device: desired.device.clone(),
                mount_point: desired.mount_point.clone(),
                options: desired.options.clone(),
            }))
        }

        Action::Enable => {
            if current.enabled && desired.options.matches(&current.registered_options) {
                return Ok(Decision::noop());
            }

            Ok(Decision::change(ActionPlan::WriteRegistry {
                mount_point: desired.mount_point.clone(),
                entry: RegistryEntry {
                    device: desired.device.clone(),
                    fstype: desired.fstype.clone(),
                    options: desired.options.clone(),
                },
            }))
        }

        Action::Disable => {
            if !current.enabled {
                return Ok(Decision::noop());
            }

            Ok(Decision::change(ActionPlan::RemoveRegistry {
                device: desired.device.clone(),
                mount_point: desired.mount_point.clone(),
            }))
        }
    }
}

fn require_device(desired: &MountResource) -> Result<(), MountError> {
    if desired.device.is_empty() {
        return Err(MountError::InvalidResource {
            mount_point: desired.mount_point.clone(),
            reason: "device must not be empty for mount/remount".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> MountResource {
        MountResource::new("/mnt/t", "/dev/ram1", "tmpfs")
            .unwrap()
            .with_options("log=NULL")
    }

    fn state(mounted: bool, enabled: bool, options: &str) -> CurrentState {
        CurrentState {
            mounted,
            enabled,
            registered_options: MountOptions::parse(options).normalized(),
        }
    }

    #[test]
    fn mount_is_a_noop_when_already_mounted() {
        let decision = decide(Action::Mount, &desired(), &state(true, false, "")).unwrap();
        assert_eq!(decision, Decision::noop());
    }

    #[test]
    fn mount_plans_a_mount_when_not_mounted() {
        let decision = decide(Action::Mount, &desired(), &state(false, false, "")).unwrap();

        assert!(decision.updated);
        match decision.plan {
            ActionPlan::Mount {
                device,
                fstype,
                options,
                ..
            } => {
                assert_eq!(device, "/dev/ram1");
                assert_eq!(fstype, "tmpfs");
                assert_eq!(options.to_string(), "log=NULL");
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn umount_is_a_noop_when_not_mounted() {
        let decision = decide(Action::Umount, &desired(), &state(false, false, "")).unwrap();
        assert_eq!(decision, Decision::noop());
    }

    #[test]
    fn umount_plans_an_unmount_when_mounted() {
        let decision = decide(Action::Umount, &desired(), &state(true, true, "nodev")).unwrap();

        assert!(decision.updated);
        match decision.plan {
            ActionPlan::Unmount { device, .. } => assert_eq!(device, "/dev/ram1"),
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn remount_without_support_fails_regardless_of_mount_state() {
        for mounted in [false, true] {
            let err = decide(Action::Remount, &desired(), &state(mounted, false, ""))
                .unwrap_err();
            assert!(matches!(err, MountError::UnsupportedRemount { .. }));
        }
    }

    #[test]
    fn remount_of_an_unmounted_point_is_a_noop() {
        let supported = desired().with_remount_support(true);
        let decision = decide(Action::Remount, &supported, &state(false, false, "")).unwrap();
        assert_eq!(decision, Decision::noop());
    }

    #[test]
    fn remount_of_a_mounted_point_always_updates() {
        let supported = desired().with_remount_support(true);

        // Even when the registered options already match the desired ones.
        let current = state(true, true, "log=NULL");
        let decision = decide(Action::Remount, &supported, &current).unwrap();

        assert!(decision.updated);
        assert!(matches!(decision.plan, ActionPlan::Remount { .. }));
    }

    #[test]
    fn enable_writes_the_registry_when_disabled() {
        let decision = decide(Action::Enable, &desired(), &state(false, false, "")).unwrap();

        assert!(decision.updated);
        match decision.plan {
            ActionPlan::WriteRegistry { entry, .. } => {
                assert_eq!(entry.device, "/dev/ram1");
                assert_eq!(entry.options.to_string(), "log=NULL");
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn enable_rewrites_on_option_drift() {
        let wanted = desired().with_options("nodev,rw");
        let decision = decide(Action::Enable, &wanted, &state(false, true, "nodev")).unwrap();

        assert!(decision.updated);
        assert!(matches!(decision.plan, ActionPlan::WriteRegistry { .. }));
    }

    #[test]
    fn enable_is_a_noop_when_options_match_in_any_order() {
        let wanted = desired().with_options("rw,nodev");
        let decision = decide(Action::Enable, &wanted, &state(false, true, "nodev,rw")).unwrap();
        assert_eq!(decision, Decision::noop());
    }

    #[test]
    fn disable_is_a_noop_when_not_enabled() {
        let decision = decide(Action::Disable, &desired(), &state(true, false, "")).unwrap();
        assert_eq!(decision, Decision::noop());
    }

    #[test]
    fn disable_removes_the_registry_entry_when_enabled() {
        let decision = decide(Action::Disable, &desired(), &state(false, true, "nodev")).unwrap();

        assert!(decision.updated);
        assert!(matches!(decision.plan, ActionPlan::RemoveRegistry { .. }));
    }

    #[test]
    fn mount_with_empty_device_is_rejected() {
        let mut bad = desired();
        bad.device.clear();

        let err = decide(Action::Mount, &bad, &state(false, false, "")).unwrap_err();
        assert!(matches!(err, MountError::InvalidResource { .. }));

        // Umount and disable never need a device.
        assert!(decide(Action::Umount, &bad, &state(true, false, "")).is_ok());
        assert!(decide(Action::Disable, &bad, &state(false, true, "x")).is_ok());
    }
}
