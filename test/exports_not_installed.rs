//! Integration Tests for the Exports Without LocalDB
//!
//! No table is installed in this binary, so the first export binds through
//! the machine registry. Off Windows (and on machines without LocalDB) that
//! fails, and every export must report LocalDB as not installed.

use std::ffi::c_void;
use std::ptr;

use sqllocaldb::exports::{self, *};
use sqllocaldb::ffi::{to_wide, DWORD, PSID};
use sqllocaldb::{codes, InteropError};

fn localdb_present() -> bool {
    cfg!(windows) && exports::native_api().is_some()
}

#[test]
fn test_every_export_reports_not_installed() {
    if localdb_present() {
        return;
    }

    let name = to_wide("Alpha").unwrap();
    let version = to_wide("13.0").unwrap();
    let mut buf = vec![0u16; 261];
    let mut len: DWORD = 261;
    let mut count: DWORD = 0;
    let mut info = [0u8; 2048];
    let mut sid = [1u8, 1, 0, 0, 0, 0, 0, 5, 18, 0, 0, 0];
    let info_ptr = info.as_mut_ptr() as *mut c_void;

    let results = unsafe {
        [
            CreateInstance(version.as_ptr(), name.as_ptr()),
            DeleteInstance(name.as_ptr()),
            GetInstanceInfo(name.as_ptr(), info_ptr, 1460),
            GetInstanceNames(ptr::null_mut(), &mut count),
            GetLocalDbError(codes::UNKNOWN_INSTANCE, 0, buf.as_mut_ptr(), &mut len),
            GetVersionInfo(version.as_ptr(), info_ptr, 112),
            GetVersions(ptr::null_mut(), &mut count),
            ShareInstance(sid.as_mut_ptr() as PSID, name.as_ptr(), name.as_ptr()),
            StartInstance(name.as_ptr(), buf.as_mut_ptr(), &mut len),
            StartTracing(),
            StopInstance(name.as_ptr(), 5),
            StopTracing(),
            UnshareInstance(name.as_ptr()),
        ]
    };

    for (i, hr) in results.iter().enumerate() {
        assert_eq!(*hr as u32, 0x89C5_0116, "export #{} returned {:#010X}", i, *hr as u32);
    }

    // Output buffers are left alone
    assert_eq!(count, 0);
    assert_eq!(len, 261);
    assert!(buf.iter().all(|&c| c == 0));
}

#[cfg(not(windows))]
#[test]
fn test_load_error_names_missing_registry_key() {
    assert!(exports::native_api().is_none());
    match exports::load_error() {
        Some(InteropError::RegistryKeyNotFound(key)) => {
            assert!(key.ends_with("Microsoft SQL Server Local DB\\Installed Versions"));
        }
        other => panic!("unexpected load error: {:?}", other),
    }
}

#[test]
fn test_install_after_failed_load_is_rejected() {
    if localdb_present() {
        return;
    }
    let _ = exports::native_api();
    let table = sqllocaldb::NativeApi::from_functions(noop_functions());
    assert!(matches!(
        exports::install(table),
        Err(InteropError::AlreadyInitialized)
    ));
}

fn noop_functions() -> sqllocaldb::ffi::LocalDbFunctions {
    use sqllocaldb::ffi::*;

    unsafe extern "system" fn two(_: PCWSTR, _: DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn create(_: PCWSTR, _: PCWSTR, _: DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn format(_: HRESULT, _: DWORD, _: DWORD, _: PWSTR, _: *mut DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn instance_info(_: PCWSTR, _: *mut LocalDbInstanceInfo, _: DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn instances(_: *mut LocalDbInstanceName, _: *mut DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn version_info(_: PCWSTR, _: *mut LocalDbVersionInfo, _: DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn versions(_: *mut LocalDbVersionName, _: *mut DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn share(_: PSID, _: PCWSTR, _: PCWSTR, _: DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn start(_: PCWSTR, _: DWORD, _: PWSTR, _: *mut DWORD) -> HRESULT {
        0
    }
    unsafe extern "system" fn tracing() -> HRESULT {
        0
    }
    unsafe extern "system" fn stop(_: PCWSTR, _: DWORD, _: ULONG) -> HRESULT {
        0
    }

    LocalDbFunctions {
        create_instance: create,
        delete_instance: two,
        format_message: format,
        get_instance_info: instance_info,
        get_instances: instances,
        get_version_info: version_info,
        get_versions: versions,
        share_instance: share,
        start_instance: start,
        start_tracing: tracing,
        stop_instance: stop,
        stop_tracing: tracing,
        unshare_instance: two,
    }
}
