//! FFI Type System
//!
//! Win32 aliases, constants and `#[repr(C)]` structures mirroring
//! `sqluserinstance.h`, plus the function pointer type of every LocalDB
//! instance API entry point.

use std::ffi::c_void;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 32-bit Windows result code. Zero is success, negative values are failures.
pub type HRESULT = i32;
/// Unsigned 32-bit integer.
pub type DWORD = u32;
/// Unsigned 32-bit integer (`ULONG` in the native headers).
pub type ULONG = u32;
/// Win32 boolean (any non-zero value is true).
pub type BOOL = i32;
/// Pointer to a constant null-terminated UTF-16 string.
pub type PCWSTR = *const u16;
/// Pointer to a writable UTF-16 buffer.
pub type PWSTR = *mut u16;
/// Pointer to a binary security identifier.
pub type PSID = *mut c_void;

/// Maximum length of an instance name, excluding the terminator.
pub const MAX_LOCALDB_INSTANCE_NAME_LENGTH: usize = 128;
/// Maximum length of a version string, excluding the terminator.
pub const MAX_LOCALDB_VERSION_LENGTH: usize = 43;
/// Maximum length of a string SID, excluding the terminator.
pub const MAX_STRING_SID_LENGTH: usize = 186;
/// Size in characters of the connection (named pipe) buffer.
pub const LOCALDB_MAX_SQLCONNECTION_BUFFER_SIZE: usize = 260;

/// `LocalDBFormatMessage` flag: truncate messages that do not fit the buffer.
pub const LOCALDB_TRUNCATE_ERR_MESSAGE: DWORD = 0x0001;
/// `LocalDBStopInstance` flag: kill the process instead of `SHUTDOWN`.
pub const LOCALDB_SHUTDOWN_KILL_PROCESS: DWORD = 0x0001;
/// `LocalDBStopInstance` flag: `SHUTDOWN WITH NOWAIT`.
pub const LOCALDB_SHUTDOWN_WITH_NOWAIT: DWORD = 0x0002;

/// One element of the array filled by `LocalDBGetInstances`.
pub type LocalDbInstanceName = [u16; MAX_LOCALDB_INSTANCE_NAME_LENGTH + 1];
/// One element of the array filled by `LocalDBGetVersions`.
pub type LocalDbVersionName = [u16; MAX_LOCALDB_VERSION_LENGTH + 1];

/// Win32 `FILETIME`: 100-nanosecond intervals since 1601-01-01 UTC.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTime {
    pub low_date_time: DWORD,
    pub high_date_time: DWORD,
}

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_EPOCH_SECS: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SEC: u64 = 10_000_000;

impl FileTime {
    /// Convert to UTC. The all-zero value means "never" and maps to `None`.
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        let ticks = (u64::from(self.high_date_time) << 32) | u64::from(self.low_date_time);
        if ticks == 0 {
            return None;
        }
        let secs = (ticks / FILETIME_TICKS_PER_SEC) as i64 - FILETIME_UNIX_EPOCH_SECS;
        let nanos = ((ticks % FILETIME_TICKS_PER_SEC) * 100) as u32;
        DateTime::from_timestamp(secs, nanos)
    }

    /// Build a `FileTime` from a UTC timestamp. Times before 1601 clamp to
    /// zero and times past the 64-bit tick range clamp to the maximum.
    pub fn from_utc(time: DateTime<Utc>) -> Self {
        let secs = (time.timestamp() + FILETIME_UNIX_EPOCH_SECS).max(0) as u64;
        let ticks = secs
            .saturating_mul(FILETIME_TICKS_PER_SEC)
            .saturating_add(u64::from(time.timestamp_subsec_nanos()) / 100);
        Self {
            low_date_time: ticks as DWORD,
            high_date_time: (ticks >> 32) as DWORD,
        }
    }
}

/// Native `LocalDBInstanceInfo`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct LocalDbInstanceInfo {
    /// `cbLocalDBInstanceInfoSize`
    pub size: DWORD,
    /// `wszInstanceName`
    pub instance_name: LocalDbInstanceName,
    /// `bExists`
    pub exists: BOOL,
    /// `bConfigurationCorrupted`
    pub configuration_corrupted: BOOL,
    /// `bIsRunning`
    pub is_running: BOOL,
    /// `dwMajor`
    pub major: DWORD,
    /// `dwMinor`
    pub minor: DWORD,
    /// `dwBuild`
    pub build: DWORD,
    /// `dwRevision`
    pub revision: DWORD,
    /// `ftLastStartUTC`
    pub last_start_utc: FileTime,
    /// `wszConnection`
    pub connection: [u16; LOCALDB_MAX_SQLCONNECTION_BUFFER_SIZE],
    /// `bIsShared`
    pub is_shared: BOOL,
    /// `wszSharedInstanceName`
    pub shared_instance_name: LocalDbInstanceName,
    /// `wszOwnerSID`
    pub owner_sid: [u16; MAX_STRING_SID_LENGTH + 1],
    /// `bIsAutomatic`
    pub is_automatic: BOOL,
}

impl LocalDbInstanceInfo {
    /// Size of the structure as passed in `dwInstanceInfoSize`.
    pub const SIZE: DWORD = std::mem::size_of::<Self>() as DWORD;

    /// A zeroed structure with its size field set, ready to be filled.
    pub fn empty() -> Self {
        Self {
            size: Self::SIZE,
            instance_name: [0; MAX_LOCALDB_INSTANCE_NAME_LENGTH + 1],
            exists: 0,
            configuration_corrupted: 0,
            is_running: 0,
            major: 0,
            minor: 0,
            build: 0,
            revision: 0,
            last_start_utc: FileTime::default(),
            connection: [0; LOCALDB_MAX_SQLCONNECTION_BUFFER_SIZE],
            is_shared: 0,
            shared_instance_name: [0; MAX_LOCALDB_INSTANCE_NAME_LENGTH + 1],
            owner_sid: [0; MAX_STRING_SID_LENGTH + 1],
            is_automatic: 0,
        }
    }
}

/// Native `LocalDBVersionInfo`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct LocalDbVersionInfo {
    /// `cbLocalDBVersionInfoSize`
    pub size: DWORD,
    /// `wszVersion`
    pub version: LocalDbVersionName,
    /// `bExists`
    pub exists: BOOL,
    /// `dwMajor`
    pub major: DWORD,
    /// `dwMinor`
    pub minor: DWORD,
    /// `dwBuild`
    pub build: DWORD,
    /// `dwRevision`
    pub revision: DWORD,
}

impl LocalDbVersionInfo {
    /// Size of the structure as passed in `dwVersionInfoSize`.
    pub const SIZE: DWORD = std::mem::size_of::<Self>() as DWORD;

    /// A zeroed structure with its size field set, ready to be filled.
    pub fn empty() -> Self {
        Self {
            size: Self::SIZE,
            version: [0; MAX_LOCALDB_VERSION_LENGTH + 1],
            exists: 0,
            major: 0,
            minor: 0,
            build: 0,
            revision: 0,
        }
    }
}

/// Options controlling how `LocalDBStopInstance` shuts an instance down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOptions {
    /// Kill the process rather than issuing `SHUTDOWN`
    #[serde(default)]
    pub kill_process: bool,

    /// Issue `SHUTDOWN WITH NOWAIT`
    #[serde(default)]
    pub no_wait: bool,
}

impl StopOptions {
    /// The native `dwFlags` value.
    pub fn bits(&self) -> DWORD {
        let mut flags = 0;
        if self.kill_process {
            flags |= LOCALDB_SHUTDOWN_KILL_PROCESS;
        }
        if self.no_wait {
            flags |= LOCALDB_SHUTDOWN_WITH_NOWAIT;
        }
        flags
    }
}

// Native entry point signatures, parameter order as in sqluserinstance.h.

pub type LocalDbCreateInstanceFn =
    unsafe extern "system" fn(version: PCWSTR, instance_name: PCWSTR, flags: DWORD) -> HRESULT;
pub type LocalDbDeleteInstanceFn =
    unsafe extern "system" fn(instance_name: PCWSTR, flags: DWORD) -> HRESULT;
pub type LocalDbFormatMessageFn = unsafe extern "system" fn(
    hr_localdb: HRESULT,
    flags: DWORD,
    language_id: DWORD,
    message: PWSTR,
    message_len: *mut DWORD,
) -> HRESULT;
pub type LocalDbGetInstanceInfoFn = unsafe extern "system" fn(
    instance_name: PCWSTR,
    info: *mut LocalDbInstanceInfo,
    info_size: DWORD,
) -> HRESULT;
pub type LocalDbGetInstancesFn =
    unsafe extern "system" fn(names: *mut LocalDbInstanceName, count: *mut DWORD) -> HRESULT;
pub type LocalDbGetVersionInfoFn = unsafe extern "system" fn(
    version_name: PCWSTR,
    info: *mut LocalDbVersionInfo,
    info_size: DWORD,
) -> HRESULT;
pub type LocalDbGetVersionsFn =
    unsafe extern "system" fn(versions: *mut LocalDbVersionName, count: *mut DWORD) -> HRESULT;
pub type LocalDbShareInstanceFn = unsafe extern "system" fn(
    owner_sid: PSID,
    private_name: PCWSTR,
    shared_name: PCWSTR,
    flags: DWORD,
) -> HRESULT;
pub type LocalDbStartInstanceFn = unsafe extern "system" fn(
    instance_name: PCWSTR,
    flags: DWORD,
    connection: PWSTR,
    connection_len: *mut DWORD,
) -> HRESULT;
pub type LocalDbStartTracingFn = unsafe extern "system" fn() -> HRESULT;
pub type LocalDbStopInstanceFn =
    unsafe extern "system" fn(instance_name: PCWSTR, flags: DWORD, timeout: ULONG) -> HRESULT;
pub type LocalDbStopTracingFn = unsafe extern "system" fn() -> HRESULT;
pub type LocalDbUnshareInstanceFn =
    unsafe extern "system" fn(instance_name: PCWSTR, flags: DWORD) -> HRESULT;

/// Encode a string as null-terminated UTF-16.
///
/// Returns `None` if the string contains an interior NUL, which the native
/// API would silently truncate at.
pub fn to_wide(s: &str) -> Option<Vec<u16>> {
    if s.contains('\0') {
        return None;
    }
    Some(s.encode_utf16().chain(std::iter::once(0)).collect())
}

/// Decode a UTF-16 buffer up to its first NUL (or its end).
pub fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Copy `s` into a fixed-size UTF-16 buffer, truncating to leave room for
/// the terminator.
pub fn write_wide(buf: &mut [u16], s: &str) {
    if buf.is_empty() {
        return;
    }
    let max = buf.len() - 1;
    let mut written = 0;
    for (slot, unit) in buf.iter_mut().zip(s.encode_utf16().take(max)) {
        *slot = unit;
        written += 1;
    }
    buf[written] = 0;
}
