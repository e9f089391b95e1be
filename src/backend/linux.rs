// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    ffi::CString,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use procfs::process::Process;
use rustix::mount::{MountFlags, UnmountFlags, mount, mount_remount, unmount};

use crate::{defs, options::MountOptions};

use super::{MountBackend, Outcome, RegistryEntry};

/// The real collaborator: mount(2)/umount(2) via rustix, the live mount
/// table via procfs, and an fstab(5)-format registry file.
#[derive(Debug)]
pub struct LinuxBackend {
    registry_path: PathBuf,
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(defs::REGISTRY_FILE),
        }
    }
}

impl LinuxBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an alternate registry file instead of /etc/fstab.
    pub fn with_registry<P: Into<PathBuf>>(registry_path: P) -> Self {
        Self {
            registry_path: registry_path.into(),
        }
    }

    fn read_registry_lines(&self) -> Result<Vec<String>> {
        let content = match fs::read_to_string(&self.registry_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read registry {}", self.registry_path.display())
                });
            }
        };

        Ok(content.lines().map(str::to_string).collect())
    }

    fn write_registry_lines(&self, lines: &[String]) -> Result<()> {
        let mut content = lines.join("\n");

        if !content.is_empty() {
            content.push('\n');
        }

        atomic_write(&self.registry_path, content).with_context(|| {
            format!("failed to write registry {}", self.registry_path.display())
        })
    }
}

impl MountBackend for LinuxBackend {
    fn is_mounted(&self, mount_point: &Path) -> Result<bool> {
        let search = normalize_point(mount_point);

        if let Ok(process) = Process::myself()
            && let Ok(mountinfo) = process.mountinfo()
        {
            return Ok(mountinfo
                .into_iter()
                .any(|m| normalize_point(&m.mount_point) == search));
        }

        let content = fs::read_to_string(defs::PROC_MOUNTS)
            .with_context(|| format!("failed to read {}", defs::PROC_MOUNTS))?;

        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() > 1 && decode_field(parts[1]) == search {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn mount(
        &mut self,
        device: &str,
        mount_point: &Path,
        fstype: &str,
        options: &MountOptions,
    ) -> Result<Outcome> {
        if self.is_mounted(mount_point)? {
            return Ok(Outcome::Unchanged);
        }

        let (flags, data) = split_option_flags(options);

        log::debug!(
            "mount {} -> {} type={} flags={:?}",
            device,
            mount_point.display(),
            fstype,
            flags
        );

        let data_c = CString::new(data).context("mount options contain a NUL byte")?;
        let data_opt = if data_c.is_empty() {
            None
        } else {
            Some(data_c.as_c_str())
        };

        mount(device, mount_point, fstype, flags, data_opt).with_context(|| {
            format!("mount(2) failed for {} on {}", device, mount_point.display())
        })?;

        Ok(Outcome::Changed)
    }

    fn unmount(&mut self, mount_point: &Path) -> Result<Outcome> {
        if !self.is_mounted(mount_point)? {
            return Ok(Outcome::Unchanged);
        }

        log::debug!("umount {}", mount_point.display());

        unmount(mount_point, UnmountFlags::empty())
            .with_context(|| format!("umount(2) failed for {}", mount_point.display()))?;

        Ok(Outcome::Changed)
    }

    fn remount(&mut self, mount_point: &Path, options: &MountOptions) -> Result<Outcome> {
        let (flags, data) = split_option_flags(options);

        log::debug!("remount {} flags={:?}", mount_point.display(), flags);

        mount_remount(mount_point, flags, data.as_str())
            .with_context(|| format!("remount failed for {}", mount_point.display()))?;

        Ok(Outcome::Changed)
    }

    fn read_registry_entry(&self, mount_point: &Path) -> Result<Option<RegistryEntry>> {
        let search = normalize_point(mount_point);

        for line in self.read_registry_lines()? {
            if let Some(parsed) = FstabLine::parse(&line)
                && normalize_point(&parsed.mount_point) == search
            {
                return Ok(Some(RegistryEntry {
                    device: parsed.device,
                    fstype: parsed.fstype,
                    options: parsed.options,
                }));
            }
        }

        Ok(None)
    }

    fn write_registry_entry(
        &mut self,
        mount_point: &Path,
        entry: &RegistryEntry,
    ) -> Result<Outcome> {
        let search = normalize_point(mount_point);
        let mut lines = self.read_registry_lines()?;
        let mut replaced = false;
        let mut changed = false;

        for line in lines.iter_mut() {
            let Some(parsed) = FstabLine::parse(line) else {
                continue;
            };

            if normalize_point(&parsed.mount_point) != search {
                continue;
            }

            // Dump/pass of an existing entry are preserved across rewrites.
            let rendered = FstabLine {
                device: entry.device.clone(),
                mount_point: mount_point.to_path_buf(),
                fstype: entry.fstype.clone(),
                options: entry.options.clone(),
                dump: parsed.dump,
                pass: parsed.pass,
            }
            .render();

            if *line != rendered {
                *line = rendered;
                changed = true;
            }

            replaced = true;
            break;
        }

        if !replaced {
            lines.push(
                FstabLine {
                    device: entry.device.clone(),
                    mount_point: mount_point.to_path_buf(),
                    fstype: entry.fstype.clone(),
                    options: entry.options.clone(),
                    dump: 0,
                    pass: 0,
                }
                .render(),
            );
            changed = true;
        }

        if !changed {
            return Ok(Outcome::Unchanged);
        }

        self.write_registry_lines(&lines)?;

        Ok(Outcome::Changed)
    }

    fn remove_registry_entry(&mut self, mount_point: &Path) -> Result<Outcome> {
        let search = normalize_point(mount_point);
        let lines = self.read_registry_lines()?;

        let kept: Vec<String> = lines
            .iter()
            .filter(|line| match FstabLine::parse(line) {
                Some(parsed) => normalize_point(&parsed.mount_point) != search,
                None => true,
            })
            .cloned()
            .collect();

        if kept.len() == lines.len() {
            return Ok(Outcome::Unchanged);
        }

        self.write_registry_lines(&kept)?;

        Ok(Outcome::Changed)
    }
}

fn normalize_point(point: &Path) -> String {
    let raw = point.to_string_lossy();
    let trimmed = raw.trim_end_matches('/');

    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Splits option tokens into mount(2) flags and the residual data string
/// handed to the filesystem driver.
fn split_option_flags(options: &MountOptions) -> (MountFlags, String) {
    let mut flags = MountFlags::empty();
    let mut data: Vec<&str> = Vec::new();

    for opt in options.iter() {
        match opt {
            "ro" => flags |= MountFlags::RDONLY,
            "nosuid" => flags |= MountFlags::NOSUID,
            "nodev" => flags |= MountFlags::NODEV,
            "noexec" => flags |= MountFlags::NOEXEC,
            "sync" => flags |= MountFlags::SYNCHRONOUS,
            "dirsync" => flags |= MountFlags::DIRSYNC,
            "noatime" => flags |= MountFlags::NOATIME,
            "nodiratime" => flags |= MountFlags::NODIRATIME,
            "relatime" => flags |= MountFlags::RELATIME,
            "strictatime" => flags |= MountFlags::STRICTATIME,
            // Kernel defaults, nothing to set.
            "rw" | "defaults" | "auto" => {}
            other => data.push(other),
        }
    }

    (flags, data.join(","))
}

#[derive(Debug)]
struct FstabLine {
    device: String,
    mount_point: PathBuf,
    fstype: String,
    options: MountOptions,
    dump: u32,
    pass: u32,
}

impl FstabLine {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() < 3 {
            return None;
        }

        let options = match fields.get(3) {
            None => MountOptions::default(),
            Some(raw) if *raw == defs::FSTAB_DEFAULTS => MountOptions::default(),
            Some(raw) => MountOptions::parse(&decode_field(raw)),
        };

        Some(Self {
            device: decode_field(fields[0]),
            mount_point: PathBuf::from(decode_field(fields[1])),
            fstype: fields[2].to_string(),
            options,
            dump: fields.get(4).and_then(|f| f.parse().ok()).unwrap_or(0),
            pass: fields.get(5).and_then(|f| f.parse().ok()).unwrap_or(0),
        })
    }

    fn render(&self) -> String {
        let options = if self.options.is_empty() {
            defs::FSTAB_DEFAULTS.to_string()
        } else {
            self.options.to_string()
        };

        format!(
            "{} {} {} {} {} {}",
            encode_field(&self.device),
            encode_field(&self.mount_point.to_string_lossy()),
            self.fstype,
            options,
            self.dump,
            self.pass
        )
    }
}

// fstab(5) octal escapes for characters that would break the
// whitespace-separated format.
fn encode_field(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for ch in raw.chars() {
        match ch {
            ' ' => out.push_str("\\040"),
            '\t' => out.push_str("\\011"),
            '\n' => out.push_str("\\012"),
            '\\' => out.push_str("\\134"),
            _ => out.push(ch),
        }
    }

    out
}

fn decode_field(raw: &str) -> String {
    // Escapes encode raw bytes, so a multi-byte UTF-8 character arrives as
    // one escape per byte; decode to bytes first, convert once.
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let mut bytes = raw.bytes().peekable();

    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }

        let mut digits = String::new();

        for _ in 0..3 {
            match bytes.peek() {
                Some(d) if (b'0'..=b'7').contains(d) => {
                    digits.push(*d as char);
                    bytes.next();
                }
                _ => break,
            }
        }

        if digits.len() == 3
            && let Ok(code) = u8::from_str_radix(&digits, 8)
        {
            out.push(code);
        } else {
            out.push(b'\\');
            out.extend_from_slice(digits.as_bytes());
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let pid = std::process::id();
    let temp_file = dir.join(format!(".{}_{}.tmp", pid, now));

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_file)?;
        file.write_all(content.as_ref())?;
    }

    if let Err(e) = fs::rename(&temp_file, path) {
        let _ = fs::remove_file(&temp_file);
        return Err(e).context("atomic_write rename failed");
    }

    Ok(())
}
