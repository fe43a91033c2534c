//! Instance API Path Resolution
//!
//! Finds `SqlUserInstance.dll` for the installed LocalDB versions. Each
//! version registers itself under
//! `HKLM\SOFTWARE\Microsoft\Microsoft SQL Server Local DB\Installed Versions\<version>`
//! with an `InstanceAPIPath` value.

use std::path::PathBuf;

use super::version::ApiVersion;
use super::{InteropError, InteropResult};

/// Name of the value holding the instance API path.
pub const INSTANCE_API_PATH_VALUE: &str = "InstanceAPIPath";

/// `HKLM` relative key listing installed LocalDB versions.
///
/// 32-bit processes on 64-bit Windows read the `Wow6432Node` view.
pub fn registry_key_name(wow64: bool) -> String {
    format!(
        "SOFTWARE\\{}Microsoft\\Microsoft SQL Server Local DB\\Installed Versions",
        if wow64 { "Wow6432Node\\" } else { "" }
    )
}

/// Whether this is a 32-bit process running on 64-bit Windows.
pub fn is_wow64_process() -> bool {
    cfg!(all(windows, target_pointer_width = "32"))
        && std::env::var_os("PROCESSOR_ARCHITEW6432").is_some()
}

/// Read-only view of `HKEY_LOCAL_MACHINE`.
pub trait Registry {
    /// Sub-key names of `key`, or `None` if `key` does not exist.
    fn sub_key_names(&self, key: &str) -> InteropResult<Option<Vec<String>>>;

    /// String value `name` of `key`, or `None` if either is absent.
    fn string_value(&self, key: &str, name: &str) -> InteropResult<Option<String>>;
}

/// The machine registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRegistry;

#[cfg(windows)]
impl Registry for SystemRegistry {
    fn sub_key_names(&self, key: &str) -> InteropResult<Option<Vec<String>>> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        match hklm.open_subkey(key) {
            Ok(subkey) => Ok(Some(subkey.enum_keys().collect::<Result<Vec<_>, _>>()?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn string_value(&self, key: &str, name: &str) -> InteropResult<Option<String>> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let subkey = match hklm.open_subkey(key) {
            Ok(subkey) => subkey,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match subkey.get_value::<String, _>(name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// LocalDB only exists on Windows; elsewhere it is never installed.
#[cfg(not(windows))]
impl Registry for SystemRegistry {
    fn sub_key_names(&self, _key: &str) -> InteropResult<Option<Vec<String>>> {
        Ok(None)
    }

    fn string_value(&self, _key: &str, _name: &str) -> InteropResult<Option<String>> {
        Ok(None)
    }
}

/// Where the instance API was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedApi {
    pub path: PathBuf,
    /// Installed version the path was registered under, `None` for an
    /// explicitly configured path.
    pub version: Option<ApiVersion>,
}

/// Locates the instance API library.
pub struct ApiPathResolver<R: Registry> {
    registry: R,
    key_name: String,
    override_version: Option<String>,
    library_path: Option<PathBuf>,
}

impl ApiPathResolver<SystemRegistry> {
    /// Resolver over the machine registry.
    pub fn system() -> Self {
        Self::new(SystemRegistry)
    }
}

impl<R: Registry> ApiPathResolver<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            key_name: registry_key_name(is_wow64_process()),
            override_version: None,
            library_path: None,
        }
    }

    /// Prefer this installed version over the latest one.
    pub fn with_override_version(mut self, version: Option<String>) -> Self {
        self.override_version = version.filter(|v| !v.is_empty());
        self
    }

    /// Skip the registry and use this library.
    pub fn with_library_path(mut self, path: Option<PathBuf>) -> Self {
        self.library_path = path;
        self
    }

    /// Locate the library.
    pub fn resolve(&self) -> InteropResult<ResolvedApi> {
        if let Some(path) = &self.library_path {
            if !path.exists() {
                tracing::error!(path = %path.display(), "Configured LocalDB instance API library does not exist");
                return Err(InteropError::LibraryNotFound(path.clone()));
            }
            return Ok(ResolvedApi {
                path: path.clone(),
                version: None,
            });
        }

        let Some(names) = self.registry.sub_key_names(&self.key_name)? else {
            tracing::warn!(key = %self.key_name, "LocalDB registry key not found");
            return Err(InteropError::RegistryKeyNotFound(self.key_name.clone()));
        };

        let mut latest: Option<(ApiVersion, &str)> = None;
        let mut overridden: Option<(ApiVersion, &str)> = None;

        for name in &names {
            let Ok(version) = name.parse::<ApiVersion>() else {
                tracing::warn!(sub_key = %name, "Ignoring invalid LocalDB installed version registry key");
                continue;
            };

            if let Some(wanted) = &self.override_version {
                if overridden.is_none() && name.eq_ignore_ascii_case(wanted) {
                    tracing::debug!(%version, "LocalDB instance API version overridden by configuration");
                    overridden = Some((version, name.as_str()));
                }
            }

            if latest.map_or(true, |(v, _)| v < version) {
                latest = Some((version, name.as_str()));
            }
        }

        if let (Some(wanted), None) = (&self.override_version, overridden) {
            tracing::warn!(version = %wanted, "Configured LocalDB instance API version is not installed, using the latest");
        }

        let Some((version, sub_key)) = overridden.or(latest) else {
            tracing::warn!("No LocalDB installed versions are registered");
            return Err(InteropError::NativeApiNotFound);
        };

        let key = format!("{}\\{}", self.key_name, sub_key);
        let path = self
            .registry
            .string_value(&key, INSTANCE_API_PATH_VALUE)?
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                tracing::warn!(%version, "LocalDB version has no instance API path");
                InteropError::NativeApiNotFound
            })?;

        let path = PathBuf::from(path);
        if !path.exists() {
            tracing::warn!(path = %path.display(), "LocalDB instance API library does not exist");
            return Err(InteropError::LibraryNotFound(path));
        }

        Ok(ResolvedApi {
            path,
            version: Some(version),
        })
    }
}
