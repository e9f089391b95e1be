// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::{
    backend::MountBackend,
    core::{
        executor,
        planner::{self, Action},
        state,
    },
    error::MountError,
    options::MountOptions,
    resource::MountResource,
};

/// Orchestrates probe, decide, execute for one mount resource.
///
/// Each `run_action` call probes the live system fresh, resolves the
/// minimal backend mutation, applies it and records whether anything
/// changed. One controller acts on one mount point, one action at a time;
/// serializing multiple controllers over the same point is the caller's
/// responsibility.
pub struct MountController<B> {
    resource: MountResource,
    backend: B,
    updated: bool,
}

impl<B: MountBackend> MountController<B> {
    pub fn new(resource: MountResource, backend: B) -> Result<Self, MountError> {
        resource.validate()?;

        Ok(Self {
            resource,
            backend,
            updated: false,
        })
    }

    pub fn run_action(&mut self, action: Action) -> Result<(), MountError> {
        log::debug!(
            "run {:?} for {}",
            action,
            self.resource.mount_point.display()
        );

        let current = state::probe(&self.backend, &self.resource)?;
        let decision = planner::decide(action, &self.resource, &current)?;

        // The flag is only committed once the backend call has succeeded;
        // on error it keeps its pre-call value, which the caller must
        // treat as unknown.
        self.updated = executor::execute(&mut self.backend, decision)?;

        Ok(())
    }

    /// Whether the most recent successful action changed the system.
    /// Not cumulative across calls.
    pub fn was_updated(&self) -> bool {
        self.updated
    }

    /// Reconfigures the desired options before the next action.
    pub fn set_options(&mut self, options: impl Into<MountOptions>) {
        self.resource.options = options.into();
    }

    /// Declares whether the filesystem supports live remounting.
    pub fn set_supports_remount(&mut self, supported: bool) {
        self.resource.supports_remount = supported;
    }

    pub fn resource(&self) -> &MountResource {
        &self.resource
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn controller() -> MountController<MemoryBackend> {
        let resource = MountResource::new("/mnt/t", "/dev/ram1", "tmpfs")
            .unwrap()
            .with_options("log=NULL");

        MountController::new(resource, MemoryBackend::new()).unwrap()
    }

    #[test]
    fn updated_is_false_before_any_action() {
        assert!(!controller().was_updated());
    }

    #[test]
    fn updated_reflects_only_the_most_recent_action() {
        let mut ctl = controller();

        ctl.run_action(Action::Mount).unwrap();
        assert!(ctl.was_updated());

        ctl.run_action(Action::Mount).unwrap();
        assert!(!ctl.was_updated());
    }

    #[test]
    fn failed_action_leaves_the_flag_at_its_pre_call_value() {
        let mut ctl = controller();

        ctl.run_action(Action::Mount).unwrap();
        assert!(ctl.was_updated());

        ctl.backend_mut().fail_next("device is busy");
        assert!(ctl.run_action(Action::Umount).is_err());

        // Stale by contract; the caller must not trust it after an error.
        assert!(ctl.was_updated());
    }

    #[test]
    fn option_reconfiguration_applies_to_the_next_action() {
        let mut ctl = controller();

        ctl.run_action(Action::Enable).unwrap();
        assert!(ctl.was_updated());

        ctl.set_options("rw,log=NULL");
        ctl.run_action(Action::Enable).unwrap();
        assert!(ctl.was_updated());

        ctl.run_action(Action::Enable).unwrap();
        assert!(!ctl.was_updated());
    }
}
