//! Owned views of LocalDB instance and version information.

use chrono::{DateTime, Utc};

use crate::ffi::{from_wide, ApiVersion, LocalDbInstanceInfo, LocalDbVersionInfo};

/// Information about a LocalDB instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub name: String,
    /// Whether the instance files exist on disk
    pub exists: bool,
    /// Whether the registry configuration is corrupt
    pub configuration_corrupt: bool,
    pub is_running: bool,
    pub version: ApiVersion,
    /// `None` if the instance has never been started
    pub last_start_utc: Option<DateTime<Utc>>,
    /// Named pipe for connecting to a running instance
    pub named_pipe: String,
    pub is_shared: bool,
    pub shared_name: String,
    /// SID of the owner when shared
    pub owner_sid: String,
    /// Whether this is a version's automatic (default) instance
    pub is_automatic: bool,
}

impl From<&LocalDbInstanceInfo> for InstanceInfo {
    fn from(raw: &LocalDbInstanceInfo) -> Self {
        Self {
            name: from_wide(&raw.instance_name),
            exists: raw.exists != 0,
            configuration_corrupt: raw.configuration_corrupted != 0,
            is_running: raw.is_running != 0,
            version: ApiVersion::full(raw.major, raw.minor, raw.build, raw.revision),
            last_start_utc: raw.last_start_utc.to_utc(),
            named_pipe: from_wide(&raw.connection),
            is_shared: raw.is_shared != 0,
            shared_name: from_wide(&raw.shared_instance_name),
            owner_sid: from_wide(&raw.owner_sid),
            is_automatic: raw.is_automatic != 0,
        }
    }
}

/// Information about an installed LocalDB version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: String,
    pub exists: bool,
    pub version: ApiVersion,
}

impl From<&LocalDbVersionInfo> for VersionInfo {
    fn from(raw: &LocalDbVersionInfo) -> Self {
        Self {
            name: from_wide(&raw.version),
            exists: raw.exists != 0,
            version: ApiVersion::full(raw.major, raw.minor, raw.build, raw.revision),
        }
    }
}
