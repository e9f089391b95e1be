// Mount Converge constants

// Default persistent mount registry, fstab(5) format
pub const REGISTRY_FILE: &str = "/etc/fstab";

// Fallback mount table when procfs mountinfo is unavailable
pub const PROC_MOUNTS: &str = "/proc/mounts";

// Options field written for an entry with no options
pub const FSTAB_DEFAULTS: &str = "defaults";
