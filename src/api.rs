//! Typed LocalDB API
//!
//! Safe wrappers over [`NativeApi`]: UTF-16 conversion, buffer sizing and
//! `HRESULT` checking. Behavior, including every error message, comes from
//! the native API.

use std::path::Path;
use std::ptr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{InstanceConfig, LocalDbConfig};
use crate::error::{codes, Result, SqlLocalDbError};
use crate::ffi::{
    from_wide, to_wide, ApiVersion, LocalDbInstanceInfo, LocalDbVersionInfo, NativeApi, Sid,
    StopOptions, SystemRegistry, DWORD, HRESULT, LOCALDB_MAX_SQLCONNECTION_BUFFER_SIZE,
    LOCALDB_TRUNCATE_ERR_MESSAGE, MAX_LOCALDB_INSTANCE_NAME_LENGTH, MAX_LOCALDB_VERSION_LENGTH,
    PSID,
};
use crate::model::{InstanceInfo, VersionInfo};

/// Typed access to the LocalDB instance API.
#[derive(Debug, Clone)]
pub struct SqlLocalDbApi {
    native: Arc<NativeApi>,
    config: InstanceConfig,
}

impl SqlLocalDbApi {
    /// Locate and load the native API as configured.
    pub fn new(config: &LocalDbConfig) -> Result<Self> {
        let resolved = config.resolver(SystemRegistry).resolve()?;
        let native = NativeApi::load_resolved(resolved)?;
        Ok(Self::with_native(Arc::new(native), config))
    }

    /// Wrap an already bound native API.
    pub fn with_native(native: Arc<NativeApi>, config: &LocalDbConfig) -> Self {
        Self {
            native,
            config: config.instances.clone(),
        }
    }

    pub fn native(&self) -> &Arc<NativeApi> {
        &self.native
    }

    /// Installed version whose instance API is in use, if known.
    pub fn native_api_version(&self) -> Option<ApiVersion> {
        self.native.version()
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.native.path()
    }

    /// Names of the installed LocalDB versions.
    pub fn versions(&self) -> Result<Vec<String>> {
        tracing::debug!("Getting installed LocalDB versions");
        let names = self.enumerate([0u16; MAX_LOCALDB_VERSION_LENGTH + 1], |buf, count| unsafe {
            self.native.get_versions(buf, count)
        })?;
        let versions: Vec<String> = names.iter().map(|n| from_wide(n)).collect();
        tracing::debug!(count = versions.len(), "Got installed LocalDB versions");
        Ok(versions)
    }

    /// The highest installed version.
    pub fn latest_version(&self) -> Result<String> {
        self.versions()?
            .into_iter()
            .filter_map(|name| name.parse::<ApiVersion>().ok().map(|v| (v, name)))
            .max_by_key(|(version, _)| *version)
            .map(|(_, name)| name)
            .ok_or(SqlLocalDbError::NoVersionsInstalled)
    }

    /// Whether any version of LocalDB is installed on this machine.
    pub fn is_installed(&self) -> bool {
        let mut count: DWORD = 0;
        let hr = unsafe { self.native.get_versions(ptr::null_mut(), &mut count) };
        hr != codes::NOT_INSTALLED
    }

    pub fn version_info(&self, version: &str) -> Result<VersionInfo> {
        let w_version = wide("version", version)?;
        tracing::debug!(%version, "Getting LocalDB version information");

        let mut raw = LocalDbVersionInfo::empty();
        let hr = unsafe {
            self.native
                .get_version_info(w_version.as_ptr(), &mut raw, LocalDbVersionInfo::SIZE)
        };
        self.check(hr, None)?;

        Ok(VersionInfo::from(&raw))
    }

    /// Names of the current user's instances.
    pub fn instance_names(&self) -> Result<Vec<String>> {
        tracing::debug!("Getting LocalDB instance names");
        let names = self.enumerate(
            [0u16; MAX_LOCALDB_INSTANCE_NAME_LENGTH + 1],
            |buf, count| unsafe { self.native.get_instances(buf, count) },
        )?;
        let names: Vec<String> = names.iter().map(|n| from_wide(n)).collect();
        tracing::debug!(count = names.len(), "Got LocalDB instance names");
        Ok(names)
    }

    pub fn instance_info(&self, instance_name: &str) -> Result<InstanceInfo> {
        let w_name = wide("instance_name", instance_name)?;
        tracing::debug!(instance = %instance_name, "Getting LocalDB instance information");

        let mut raw = LocalDbInstanceInfo::empty();
        let hr = unsafe {
            self.native
                .get_instance_info(w_name.as_ptr(), &mut raw, LocalDbInstanceInfo::SIZE)
        };
        self.check(hr, Some(instance_name))?;

        Ok(InstanceInfo::from(&raw))
    }

    /// Create an instance of `version`; see [`latest_version`](Self::latest_version).
    pub fn create_instance(&self, instance_name: &str, version: &str) -> Result<()> {
        let w_name = wide("instance_name", instance_name)?;
        let w_version = wide("version", version)?;
        tracing::debug!(instance = %instance_name, %version, "Creating LocalDB instance");

        let hr = unsafe {
            self.native
                .create_instance(w_version.as_ptr(), w_name.as_ptr(), 0)
        };
        self.check(hr, Some(instance_name))?;

        tracing::debug!(instance = %instance_name, %version, "Created LocalDB instance");
        Ok(())
    }

    /// Create an instance of the highest installed version.
    pub fn create_instance_latest(&self, instance_name: &str) -> Result<()> {
        let version = self.latest_version()?;
        self.create_instance(instance_name, &version)
    }

    pub fn delete_instance(&self, instance_name: &str) -> Result<()> {
        let w_name = wide("instance_name", instance_name)?;
        tracing::debug!(instance = %instance_name, "Deleting LocalDB instance");

        let hr = unsafe { self.native.delete_instance(w_name.as_ptr(), 0) };
        self.check(hr, Some(instance_name))?;

        tracing::debug!(instance = %instance_name, "Deleted LocalDB instance");
        Ok(())
    }

    /// Share `instance_name` with other users of the machine as `shared_name`.
    pub fn share_instance(
        &self,
        owner_sid: &str,
        instance_name: &str,
        shared_name: &str,
    ) -> Result<()> {
        // The native API accepts an empty private name and then misbehaves
        // on every later call for the shared instance.
        if instance_name.is_empty() {
            return Err(SqlLocalDbError::InvalidArgument {
                name: "instance_name",
                reason: "an instance name is required to share an instance".to_string(),
            });
        }

        let sid: Sid = owner_sid.parse()?;
        let w_name = wide("instance_name", instance_name)?;
        let w_shared = wide("shared_name", shared_name)?;
        tracing::debug!(instance = %instance_name, owner = %sid, shared = %shared_name, "Sharing LocalDB instance");

        let mut sid_bytes = sid.as_bytes().to_vec();
        let hr = unsafe {
            self.native.share_instance(
                sid_bytes.as_mut_ptr() as PSID,
                w_name.as_ptr(),
                w_shared.as_ptr(),
                0,
            )
        };
        self.check(hr, Some(instance_name))?;

        tracing::debug!(instance = %instance_name, shared = %shared_name, "Shared LocalDB instance");
        Ok(())
    }

    pub fn unshare_instance(&self, instance_name: &str) -> Result<()> {
        let w_name = wide("instance_name", instance_name)?;
        tracing::debug!(instance = %instance_name, "Unsharing LocalDB instance");

        let hr = unsafe { self.native.unshare_instance(w_name.as_ptr(), 0) };
        self.check(hr, Some(instance_name))?;

        tracing::debug!(instance = %instance_name, "Unshared LocalDB instance");
        Ok(())
    }

    /// Start an instance and return its named pipe.
    pub fn start_instance(&self, instance_name: &str) -> Result<String> {
        let w_name = wide("instance_name", instance_name)?;
        tracing::debug!(instance = %instance_name, "Starting LocalDB instance");

        let mut buf = vec![0u16; LOCALDB_MAX_SQLCONNECTION_BUFFER_SIZE + 1];
        let mut len = buf.len() as DWORD;
        let hr = unsafe {
            self.native
                .start_instance(w_name.as_ptr(), 0, buf.as_mut_ptr(), &mut len)
        };
        self.check(hr, Some(instance_name))?;

        let named_pipe = from_wide(&buf);
        tracing::debug!(instance = %instance_name, pipe = %named_pipe, "Started LocalDB instance");
        Ok(named_pipe)
    }

    /// Stop an instance with the configured options and timeout.
    pub fn stop_instance(&self, instance_name: &str) -> Result<()> {
        self.stop_instance_with(
            instance_name,
            self.config.stop_options,
            self.config.stop_timeout(),
        )
    }

    /// Stop an instance. A zero timeout returns without waiting; the
    /// timeout is passed in whole seconds.
    pub fn stop_instance_with(
        &self,
        instance_name: &str,
        options: StopOptions,
        timeout: Duration,
    ) -> Result<()> {
        let w_name = wide("instance_name", instance_name)?;
        let timeout_secs = u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX);
        tracing::debug!(instance = %instance_name, timeout_secs, ?options, "Stopping LocalDB instance");

        let started = Instant::now();
        let hr = unsafe {
            self.native
                .stop_instance(w_name.as_ptr(), options.bits(), timeout_secs)
        };
        self.check(hr, Some(instance_name))?;

        tracing::debug!(instance = %instance_name, elapsed = ?started.elapsed(), "Stopped LocalDB instance");
        Ok(())
    }

    /// Enable API call tracing for all instances owned by the current user.
    pub fn start_tracing(&self) -> Result<()> {
        tracing::debug!("Starting LocalDB API tracing");
        let hr = unsafe { self.native.start_tracing() };
        self.check(hr, None)
    }

    pub fn stop_tracing(&self) -> Result<()> {
        tracing::debug!("Stopping LocalDB API tracing");
        let hr = unsafe { self.native.stop_tracing() };
        self.check(hr, None)
    }

    /// The native description of a LocalDB `HRESULT`, in the configured language.
    pub fn error_message(&self, hr: HRESULT) -> Result<String> {
        self.format_message(hr)
            .map_err(|lookup_hr| lookup_failure(hr, lookup_hr, None))
    }

    fn format_message(&self, hr: HRESULT) -> std::result::Result<String, HRESULT> {
        let mut buf = vec![0u16; LOCALDB_MAX_SQLCONNECTION_BUFFER_SIZE + 1];
        let mut len = buf.len() as DWORD;
        let lookup_hr = unsafe {
            self.native.format_message(
                hr,
                LOCALDB_TRUNCATE_ERR_MESSAGE,
                self.config.language_id,
                buf.as_mut_ptr(),
                &mut len,
            )
        };
        if lookup_hr != 0 {
            return Err(lookup_hr);
        }
        Ok(from_wide(&buf))
    }

    /// Query-then-fill enumeration used by `LocalDBGetVersions` and
    /// `LocalDBGetInstances`.
    fn enumerate<T: Copy>(
        &self,
        empty: T,
        call: impl Fn(*mut T, *mut DWORD) -> HRESULT,
    ) -> Result<Vec<T>> {
        let mut count: DWORD = 0;
        let hr = call(ptr::null_mut(), &mut count as *mut DWORD);
        if hr != 0 && hr != codes::INSUFFICIENT_BUFFER {
            return Err(self.failure(hr, None));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![empty; count as usize];
        let hr = call(buf.as_mut_ptr(), &mut count as *mut DWORD);
        self.check(hr, None)?;

        buf.truncate(count as usize);
        Ok(buf)
    }

    fn check(&self, hr: HRESULT, instance_name: Option<&str>) -> Result<()> {
        if hr == 0 {
            Ok(())
        } else {
            Err(self.failure(hr, instance_name))
        }
    }

    fn failure(&self, hr: HRESULT, instance_name: Option<&str>) -> SqlLocalDbError {
        tracing::error!(code = %hex(hr), instance = ?instance_name, "LocalDB API call failed");

        if hr == codes::NOT_INSTALLED {
            return SqlLocalDbError::NotInstalled;
        }

        match self.format_message(hr) {
            Ok(message) => SqlLocalDbError::LocalDb {
                code: hr,
                message,
                instance_name: instance_name.map(str::to_string),
            },
            Err(lookup_hr) => lookup_failure(hr, lookup_hr, instance_name),
        }
    }
}

/// Error for a failed call whose message could not be looked up either.
fn lookup_failure(hr: HRESULT, lookup_hr: HRESULT, instance_name: Option<&str>) -> SqlLocalDbError {
    if hr == codes::NOT_INSTALLED || lookup_hr == codes::NOT_INSTALLED {
        return SqlLocalDbError::NotInstalled;
    }
    tracing::error!(code = %hex(hr), lookup = %hex(lookup_hr), "LocalDB error message lookup failed");
    SqlLocalDbError::LocalDb {
        code: hr,
        message: format!(
            "The LocalDB instance API returned {} (no description available: {})",
            hex(hr),
            hex(lookup_hr)
        ),
        instance_name: instance_name.map(str::to_string),
    }
}

fn hex(hr: HRESULT) -> String {
    format!("{:#010X}", hr as u32)
}

fn wide(name: &'static str, value: &str) -> Result<Vec<u16>> {
    to_wide(value).ok_or_else(|| SqlLocalDbError::InvalidArgument {
        name,
        reason: "contains a NUL character".to_string(),
    })
}
