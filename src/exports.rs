//! Flat exported entry points
//!
//! One `extern "system"` function per LocalDB instance API call, for callers
//! that bind this library by name (P/Invoke and similar). Each export passes
//! its arguments to the native function unchanged, fills reserved flags with
//! zero and returns the native `HRESULT` as is.
//!
//! The native API is bound on first use through [`native_api`]. When it
//! cannot be bound every export returns `LOCALDB_ERROR_NOT_INSTALLED`.

#![allow(non_snake_case)]

use std::ffi::c_void;

use once_cell::sync::OnceCell;

use crate::config::LocalDbConfig;
use crate::error::codes;
use crate::ffi::{
    InteropError, InteropResult, LocalDbInstanceInfo, LocalDbInstanceName, LocalDbVersionInfo,
    LocalDbVersionName, NativeApi, SystemRegistry, DWORD, HRESULT, LOCALDB_TRUNCATE_ERR_MESSAGE,
    PCWSTR, PSID, PWSTR, ULONG,
};

static NATIVE: OnceCell<InteropResult<NativeApi>> = OnceCell::new();

/// Use `api` for every export in this process.
///
/// Fails with [`InteropError::AlreadyInitialized`] once a table has been
/// installed or an export has triggered loading.
pub fn install(api: NativeApi) -> InteropResult<()> {
    NATIVE
        .set(Ok(api))
        .map_err(|_| InteropError::AlreadyInitialized)
}

/// The process-wide native API, loading it on first call.
pub fn native_api() -> Option<&'static NativeApi> {
    NATIVE.get_or_init(load_default).as_ref().ok()
}

/// Why the process-wide native API is unavailable, if it is.
pub fn load_error() -> Option<&'static InteropError> {
    NATIVE.get_or_init(load_default).as_ref().err()
}

fn load_default() -> InteropResult<NativeApi> {
    let config = LocalDbConfig::load_from_cwd().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable LocalDB configuration");
        LocalDbConfig::default()
    });

    let result = config
        .resolver(SystemRegistry)
        .resolve()
        .and_then(NativeApi::load_resolved);

    match &result {
        Ok(api) => tracing::debug!(
            path = ?api.path(),
            version = ?api.version().map(|v| v.to_string()),
            "Bound LocalDB instance API"
        ),
        Err(e) => tracing::warn!(error = %e, "LocalDB instance API unavailable"),
    }
    result
}

#[inline]
fn forward(call: impl FnOnce(&NativeApi) -> HRESULT) -> HRESULT {
    match native_api() {
        Some(api) => call(api),
        None => codes::NOT_INSTALLED,
    }
}

/// `LocalDBCreateInstance(wszVersion, pInstanceName, 0)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn CreateInstance(wszVersion: PCWSTR, pInstanceName: PCWSTR) -> HRESULT {
    forward(|api| api.create_instance(wszVersion, pInstanceName, 0))
}

/// `LocalDBDeleteInstance(pInstanceName, 0)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn DeleteInstance(pInstanceName: PCWSTR) -> HRESULT {
    forward(|api| api.delete_instance(pInstanceName, 0))
}

/// `LocalDBGetInstanceInfo(wszInstanceName, pInstanceInfo, dwInstanceInfoSize)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn GetInstanceInfo(
    wszInstanceName: PCWSTR,
    pInstanceInfo: *mut c_void,
    dwInstanceInfoSize: DWORD,
) -> HRESULT {
    forward(|api| {
        api.get_instance_info(
            wszInstanceName,
            pInstanceInfo as *mut LocalDbInstanceInfo,
            dwInstanceInfoSize,
        )
    })
}

/// `LocalDBGetInstances(pInstanceNames, lpdwNumberOfInstances)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn GetInstanceNames(
    pInstanceNames: *mut c_void,
    lpdwNumberOfInstances: *mut DWORD,
) -> HRESULT {
    forward(|api| {
        api.get_instances(
            pInstanceNames as *mut LocalDbInstanceName,
            lpdwNumberOfInstances,
        )
    })
}

/// `LocalDBFormatMessage(hrLocalDB, LOCALDB_TRUNCATE_ERR_MESSAGE, dwLanguageId, wszMessage, lpcchMessage)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn GetLocalDbError(
    hrLocalDB: HRESULT,
    dwLanguageId: DWORD,
    wszMessage: PWSTR,
    lpcchMessage: *mut DWORD,
) -> HRESULT {
    forward(|api| {
        api.format_message(
            hrLocalDB,
            LOCALDB_TRUNCATE_ERR_MESSAGE,
            dwLanguageId,
            wszMessage,
            lpcchMessage,
        )
    })
}

/// `LocalDBGetVersionInfo(wszVersionName, pVersionInfo, dwVersionInfoSize)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn GetVersionInfo(
    wszVersionName: PCWSTR,
    pVersionInfo: *mut c_void,
    dwVersionInfoSize: DWORD,
) -> HRESULT {
    forward(|api| {
        api.get_version_info(
            wszVersionName,
            pVersionInfo as *mut LocalDbVersionInfo,
            dwVersionInfoSize,
        )
    })
}

/// `LocalDBGetVersions(pVersion, lpdwNumberOfVersions)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn GetVersions(
    pVersion: *mut c_void,
    lpdwNumberOfVersions: *mut DWORD,
) -> HRESULT {
    forward(|api| api.get_versions(pVersion as *mut LocalDbVersionName, lpdwNumberOfVersions))
}

/// `LocalDBShareInstance(pOwnerSID, pInstancePrivateName, pInstanceSharedName, 0)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn ShareInstance(
    pOwnerSID: PSID,
    pInstancePrivateName: PCWSTR,
    pInstanceSharedName: PCWSTR,
) -> HRESULT {
    forward(|api| api.share_instance(pOwnerSID, pInstancePrivateName, pInstanceSharedName, 0))
}

/// `LocalDBStartInstance(pInstanceName, 0, wszSqlConnection, lpcchSqlConnection)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn StartInstance(
    pInstanceName: PCWSTR,
    wszSqlConnection: PWSTR,
    lpcchSqlConnection: *mut DWORD,
) -> HRESULT {
    forward(|api| api.start_instance(pInstanceName, 0, wszSqlConnection, lpcchSqlConnection))
}

/// `LocalDBStartTracing()`
///
/// # Safety
/// Calls into the native API.
#[no_mangle]
pub unsafe extern "system" fn StartTracing() -> HRESULT {
    forward(|api| api.start_tracing())
}

/// `LocalDBStopInstance(pInstanceName, 0, ulTimeout)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn StopInstance(pInstanceName: PCWSTR, ulTimeout: ULONG) -> HRESULT {
    forward(|api| api.stop_instance(pInstanceName, 0, ulTimeout))
}

/// `LocalDBStopTracing()`
///
/// # Safety
/// Calls into the native API.
#[no_mangle]
pub unsafe extern "system" fn StopTracing() -> HRESULT {
    forward(|api| api.stop_tracing())
}

/// `LocalDBUnshareInstance(pInstanceName, 0)`
///
/// # Safety
/// Arguments must satisfy the native function's contract.
#[no_mangle]
pub unsafe extern "system" fn UnshareInstance(pInstanceName: PCWSTR) -> HRESULT {
    forward(|api| api.unshare_instance(pInstanceName, 0))
}
