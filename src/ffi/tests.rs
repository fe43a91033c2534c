//! FFI Module Tests

use std::collections::HashMap;
use std::mem::{offset_of, size_of};
use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use super::*;

#[test]
fn test_struct_layout_matches_native_headers() {
    assert_eq!(size_of::<LocalDbInstanceInfo>(), 1460);
    assert_eq!(LocalDbInstanceInfo::SIZE, 1460);
    assert_eq!(offset_of!(LocalDbInstanceInfo, exists), 264);
    assert_eq!(offset_of!(LocalDbInstanceInfo, last_start_utc), 292);
    assert_eq!(offset_of!(LocalDbInstanceInfo, connection), 300);
    assert_eq!(offset_of!(LocalDbInstanceInfo, is_shared), 820);
    assert_eq!(offset_of!(LocalDbInstanceInfo, owner_sid), 1082);
    assert_eq!(offset_of!(LocalDbInstanceInfo, is_automatic), 1456);

    assert_eq!(size_of::<LocalDbVersionInfo>(), 112);
    assert_eq!(offset_of!(LocalDbVersionInfo, exists), 92);

    assert_eq!(size_of::<LocalDbInstanceName>(), 258);
    assert_eq!(size_of::<LocalDbVersionName>(), 88);
}

#[test]
fn test_empty_structs_carry_their_size() {
    assert_eq!(LocalDbInstanceInfo::empty().size, LocalDbInstanceInfo::SIZE);
    assert_eq!(LocalDbVersionInfo::empty().size, LocalDbVersionInfo::SIZE);
}

#[test]
fn test_wide_strings() {
    assert_eq!(to_wide("v11.0").unwrap(), vec![118, 49, 49, 46, 48, 0]);
    assert_eq!(to_wide("").unwrap(), vec![0]);
    assert!(to_wide("bad\0name").is_none());

    let mut buf = [0u16; 8];
    write_wide(&mut buf, "MSSQLLocalDB");
    assert_eq!(from_wide(&buf), "MSSQLLo");

    write_wide(&mut buf, "abc");
    assert_eq!(from_wide(&buf), "abc");

    // No terminator: decode the whole slice
    let unterminated: Vec<u16> = "xyz".encode_utf16().collect();
    assert_eq!(from_wide(&unterminated), "xyz");
}

#[test]
fn test_filetime_conversion() {
    assert_eq!(FileTime::default().to_utc(), None);

    let time = Utc.with_ymd_and_hms(2014, 3, 1, 12, 30, 15).unwrap();
    let ft = FileTime::from_utc(time);
    assert_eq!(ft.to_utc(), Some(time));

    // 1970-01-01 is 116444736000000000 ticks after 1601-01-01
    let epoch = FileTime {
        low_date_time: 116_444_736_000_000_000u64 as u32,
        high_date_time: (116_444_736_000_000_000u64 >> 32) as u32,
    };
    assert_eq!(epoch.to_utc(), Some(Utc.timestamp_opt(0, 0).unwrap()));
}

#[test]
fn test_filetime_clamps_out_of_range_times() {
    let far_future = Utc.with_ymd_and_hms(100_000, 1, 1, 0, 0, 0).unwrap();
    let ft = FileTime::from_utc(far_future);
    assert_eq!(ft.low_date_time, u32::MAX);
    assert_eq!(ft.high_date_time, u32::MAX);

    let before_1601 = Utc.with_ymd_and_hms(1500, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(FileTime::from_utc(before_1601).to_utc(), None);
}

#[test]
fn test_stop_option_bits() {
    assert_eq!(StopOptions::default().bits(), 0);
    let kill = StopOptions {
        kill_process: true,
        no_wait: false,
    };
    assert_eq!(kill.bits(), LOCALDB_SHUTDOWN_KILL_PROCESS);
    let both = StopOptions {
        kill_process: true,
        no_wait: true,
    };
    assert_eq!(both.bits(), 0x3);
}

#[test]
fn test_version_parsing() {
    let v: ApiVersion = "11.0".parse().unwrap();
    assert_eq!(v, ApiVersion::new(11, 0));
    assert_eq!(v.to_string(), "11.0");

    let v: ApiVersion = "11.0.1094.2".parse().unwrap();
    assert_eq!(v, ApiVersion::full(11, 0, 1094, 2));
    assert_eq!(v.to_string(), "11.0.1094.2");

    assert_eq!("15.0.4153".parse::<ApiVersion>().unwrap().to_string(), "15.0.4153");

    assert!("11".parse::<ApiVersion>().is_err());
    assert!("v11.0".parse::<ApiVersion>().is_err());
    assert!("11.0.".parse::<ApiVersion>().is_err());
    assert!("+11.0".parse::<ApiVersion>().is_err());
    assert!("1.2.3.4.5".parse::<ApiVersion>().is_err());
}

#[test]
fn test_version_ordering() {
    let v11: ApiVersion = "11.0".parse().unwrap();
    let v12: ApiVersion = "12.0".parse().unwrap();
    let v13: ApiVersion = "13.0".parse().unwrap();
    let v13_full: ApiVersion = "13.0.0.0".parse().unwrap();
    let v2: ApiVersion = "2.10".parse().unwrap();

    assert!(v11 < v12);
    assert!(v12 < v13);
    assert!(v13 < v13_full);
    assert!(v2 < v11);
}

#[test]
fn test_sid_parsing() {
    let sid: Sid = "S-1-5-21-1004336348-1177238915-682003330-512".parse().unwrap();
    assert_eq!(sid.revision(), 1);
    assert_eq!(sid.identifier_authority(), 5);
    assert_eq!(
        sid.sub_authorities().collect::<Vec<_>>(),
        vec![21, 1004336348, 1177238915, 682003330, 512]
    );
    assert_eq!(sid.as_bytes().len(), 8 + 4 * 5);
    assert_eq!(&sid.as_bytes()[..8], &[1, 5, 0, 0, 0, 0, 0, 5]);
    assert_eq!(&sid.as_bytes()[8..12], &21u32.to_le_bytes());
    assert_eq!(
        sid.to_string(),
        "S-1-5-21-1004336348-1177238915-682003330-512"
    );

    let everyone: Sid = "S-1-1-0".parse().unwrap();
    assert_eq!(everyone.as_bytes(), &[1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]);

    let wide: Sid = "S-1-0x123456789ABC-7".parse().unwrap();
    assert_eq!(wide.identifier_authority(), 0x1234_5678_9ABC);
    assert_eq!(wide.to_string(), "S-1-0x123456789ABC-7");
}

#[test]
fn test_sid_rejects_malformed_strings() {
    assert!("".parse::<Sid>().is_err());
    assert!("X-1-5-18".parse::<Sid>().is_err());
    assert!("S-2-5-18".parse::<Sid>().is_err());
    assert!("S-1".parse::<Sid>().is_err());
    assert!("S-1-5-abc".parse::<Sid>().is_err());
    assert!("S-1-0x1000000000000-1".parse::<Sid>().is_err());

    let too_many = format!("S-1-5{}", "-1".repeat(SID_MAX_SUB_AUTHORITIES + 1));
    assert!(too_many.parse::<Sid>().is_err());
    let most = format!("S-1-5{}", "-1".repeat(SID_MAX_SUB_AUTHORITIES));
    assert_eq!(most.parse::<Sid>().unwrap().as_bytes().len(), SECURITY_MAX_SID_SIZE);
}

#[test]
fn test_registry_key_name() {
    assert_eq!(
        registry_key_name(false),
        "SOFTWARE\\Microsoft\\Microsoft SQL Server Local DB\\Installed Versions"
    );
    assert_eq!(
        registry_key_name(true),
        "SOFTWARE\\Wow6432Node\\Microsoft\\Microsoft SQL Server Local DB\\Installed Versions"
    );
}

/// In-memory stand-in for HKLM.
#[derive(Default)]
struct MemoryRegistry {
    keys: HashMap<String, Vec<String>>,
    values: HashMap<(String, String), String>,
}

impl MemoryRegistry {
    fn with_versions(versions: &[(&str, Option<&str>)]) -> Self {
        let root = registry_key_name(is_wow64_process());
        let mut registry = Self::default();
        registry.keys.insert(
            root.clone(),
            versions.iter().map(|(v, _)| v.to_string()).collect(),
        );
        for (version, path) in versions {
            if let Some(path) = path {
                registry.values.insert(
                    (
                        format!("{}\\{}", root, version),
                        INSTANCE_API_PATH_VALUE.to_string(),
                    ),
                    path.to_string(),
                );
            }
        }
        registry
    }
}

impl Registry for MemoryRegistry {
    fn sub_key_names(&self, key: &str) -> InteropResult<Option<Vec<String>>> {
        Ok(self.keys.get(key).cloned())
    }

    fn string_value(&self, key: &str, name: &str) -> InteropResult<Option<String>> {
        Ok(self
            .values
            .get(&(key.to_string(), name.to_string()))
            .cloned())
    }
}

fn touch(dir: &tempfile::TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, b"").unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_resolver_picks_latest_version() {
    let dir = tempfile::tempdir().unwrap();
    let v11 = touch(&dir, "v11.dll");
    let v13 = touch(&dir, "v13.dll");
    let registry = MemoryRegistry::with_versions(&[
        ("11.0", Some(v11.as_str())),
        ("13.0", Some(v13.as_str())),
        ("12.0", None),
    ]);

    let resolved = ApiPathResolver::new(registry).resolve().unwrap();
    assert_eq!(resolved.path, PathBuf::from(&v13));
    assert_eq!(resolved.version, Some(ApiVersion::new(13, 0)));
}

#[test]
fn test_resolver_honors_override_version() {
    let dir = tempfile::tempdir().unwrap();
    let v11 = touch(&dir, "v11.dll");
    let v13 = touch(&dir, "v13.dll");
    let registry = MemoryRegistry::with_versions(&[("11.0", Some(v11.as_str())), ("13.0", Some(v13.as_str()))]);

    let resolved = ApiPathResolver::new(registry)
        .with_override_version(Some("11.0".to_string()))
        .resolve()
        .unwrap();
    assert_eq!(resolved.path, PathBuf::from(&v11));
    assert_eq!(resolved.version, Some(ApiVersion::new(11, 0)));
}

#[test]
fn test_resolver_falls_back_when_override_missing() {
    let dir = tempfile::tempdir().unwrap();
    let v13 = touch(&dir, "v13.dll");
    let registry = MemoryRegistry::with_versions(&[("13.0", Some(v13.as_str()))]);

    let resolved = ApiPathResolver::new(registry)
        .with_override_version(Some("99.0".to_string()))
        .resolve()
        .unwrap();
    assert_eq!(resolved.version, Some(ApiVersion::new(13, 0)));
}

#[test]
fn test_resolver_skips_invalid_sub_keys() {
    let dir = tempfile::tempdir().unwrap();
    let v12 = touch(&dir, "v12.dll");
    let registry =
        MemoryRegistry::with_versions(&[("junk", Some("ignored")), ("12.0", Some(v12.as_str()))]);

    let resolved = ApiPathResolver::new(registry).resolve().unwrap();
    assert_eq!(resolved.version, Some(ApiVersion::new(12, 0)));
}

#[test]
fn test_resolver_errors() {
    let missing_key = ApiPathResolver::new(MemoryRegistry::default()).resolve();
    assert!(matches!(missing_key, Err(InteropError::RegistryKeyNotFound(_))));

    let no_versions = ApiPathResolver::new(MemoryRegistry::with_versions(&[])).resolve();
    assert!(matches!(no_versions, Err(InteropError::NativeApiNotFound)));

    let no_path =
        ApiPathResolver::new(MemoryRegistry::with_versions(&[("13.0", None)])).resolve();
    assert!(matches!(no_path, Err(InteropError::NativeApiNotFound)));

    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("gone.dll").to_string_lossy().into_owned();
    let not_on_disk =
        ApiPathResolver::new(MemoryRegistry::with_versions(&[("13.0", Some(gone.as_str()))])).resolve();
    assert!(matches!(not_on_disk, Err(InteropError::LibraryNotFound(_))));
}

#[test]
fn test_resolver_explicit_library_path() {
    let dir = tempfile::tempdir().unwrap();
    let custom = touch(&dir, "custom.dll");

    // Registry is never consulted
    let resolved = ApiPathResolver::new(MemoryRegistry::default())
        .with_library_path(Some(PathBuf::from(&custom)))
        .resolve()
        .unwrap();
    assert_eq!(resolved.path, PathBuf::from(&custom));
    assert_eq!(resolved.version, None);

    let missing = ApiPathResolver::new(MemoryRegistry::default())
        .with_library_path(Some(dir.path().join("missing.dll")))
        .resolve();
    assert!(matches!(missing, Err(InteropError::LibraryNotFound(_))));
}

#[test]
fn test_load_rejects_non_library() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = touch(&dir, "bogus.dll");
    let err = NativeApi::load(&bogus, None).unwrap_err();
    assert!(matches!(err, InteropError::Load { .. }));
    assert!(err.to_string().contains("bogus.dll"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_load_reports_missing_symbol() {
    // libc loads fine but has no LocalDB entry points
    match NativeApi::load("libc.so.6", None) {
        Err(InteropError::SymbolNotFound { name, .. }) => {
            assert_eq!(name, "LocalDBCreateInstance")
        }
        other => panic!("expected SymbolNotFound, got {:?}", other),
    }
}

#[test]
fn test_interop_error_display() {
    let err = InteropError::RegistryKeyNotFound("SOFTWARE\\X".to_string());
    assert!(err.to_string().contains("HKLM\\SOFTWARE\\X"));

    let err = InteropError::LibraryNotFound(PathBuf::from("C:\\missing.dll"));
    assert!(err.to_string().contains("missing.dll"));
}
