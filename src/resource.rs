// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::MountError,
    options::MountOptions,
};

/// The declared desired state of one mount point.
///
/// Constructed once per controller; the only mutation allowed afterwards
/// is through the explicit option/capability setters, invoked between
/// actions, never mid-decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountResource {
    pub mount_point: PathBuf,
    pub device: String,
    #[serde(default = "default_fstype")]
    pub fstype: String,
    #[serde(default)]
    pub options: MountOptions,
    #[serde(default)]
    pub supports_remount: bool,
}

fn default_fstype() -> String {
    "auto".to_string()
}

impl MountResource {
    pub fn new(
        mount_point: impl Into<PathBuf>,
        device: impl Into<String>,
        fstype: impl Into<String>,
    ) -> Result<Self, MountError> {
        let resource = Self {
            mount_point: mount_point.into(),
            device: device.into(),
            fstype: fstype.into(),
            options: MountOptions::default(),
            supports_remount: false,
        };

        resource.validate()?;

        Ok(resource)
    }

    pub fn with_options(mut self, options: impl Into<MountOptions>) -> Self {
        self.options = options.into();
        self
    }

    pub fn with_remount_support(mut self, supported: bool) -> Self {
        self.supports_remount = supported;
        self
    }

    /// Loads a resource declaration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).context("failed to read resource file")?;

        let resource: MountResource =
            toml::from_str(&content).context("failed to parse resource file")?;

        resource
            .validate()
            .context("resource file declares an invalid resource")?;

        Ok(resource)
    }

    pub fn validate(&self) -> Result<(), MountError> {
        if self.mount_point.as_os_str().is_empty() {
            return Err(MountError::InvalidResource {
                mount_point: self.mount_point.clone(),
                reason: "mount point must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_mount_point() {
        assert!(MountResource::new("", "/dev/ram1", "tmpfs").is_err());
    }

    #[test]
    fn loads_from_toml_with_string_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mnt-data.toml");

        fs::write(
            &path,
            r#"
mount_point = "/mnt/data"
device = "/dev/sdb1"
fstype = "ext4"
options = "noatime,nodev"
supports_remount = true
"#,
        )
        .unwrap();

        let resource = MountResource::from_file(&path).unwrap();
        assert_eq!(resource.mount_point, PathBuf::from("/mnt/data"));
        assert_eq!(resource.options.to_string(), "noatime,nodev");
        assert!(resource.supports_remount);
    }

    #[test]
    fn fstype_defaults_to_auto() {
        let resource: MountResource = toml::from_str(
            r#"
mount_point = "/mnt/data"
device = "/dev/sdb1"
"#,
        )
        .unwrap();

        assert_eq!(resource.fstype, "auto");
        assert!(resource.options.is_empty());
        assert!(!resource.supports_remount);
    }
}
