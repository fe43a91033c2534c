//! Dynamic Library Loader
//!
//! Binds the LocalDB instance API at run time with libloading and exposes
//! each entry point as a raw forwarding call.

use std::fmt;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use super::resolver::ResolvedApi;
use super::types::*;
use super::version::ApiVersion;
use super::{InteropError, InteropResult};

/// The thirteen LocalDB instance API entry points.
#[derive(Clone, Copy)]
pub struct LocalDbFunctions {
    pub create_instance: LocalDbCreateInstanceFn,
    pub delete_instance: LocalDbDeleteInstanceFn,
    pub format_message: LocalDbFormatMessageFn,
    pub get_instance_info: LocalDbGetInstanceInfoFn,
    pub get_instances: LocalDbGetInstancesFn,
    pub get_version_info: LocalDbGetVersionInfoFn,
    pub get_versions: LocalDbGetVersionsFn,
    pub share_instance: LocalDbShareInstanceFn,
    pub start_instance: LocalDbStartInstanceFn,
    pub start_tracing: LocalDbStartTracingFn,
    pub stop_instance: LocalDbStopInstanceFn,
    pub stop_tracing: LocalDbStopTracingFn,
    pub unshare_instance: LocalDbUnshareInstanceFn,
}

/// A bound LocalDB instance API.
pub struct NativeApi {
    functions: LocalDbFunctions,
    path: Option<PathBuf>,
    version: Option<ApiVersion>,
    /// Keeps the module mapped for as long as `functions` is reachable.
    _library: Option<Library>,
}

impl NativeApi {
    /// Load the library at `path` and resolve every entry point.
    pub fn load(path: impl AsRef<Path>, version: Option<ApiVersion>) -> InteropResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading runs the module's initializers. The path comes
        // from the LocalDB installation registry or explicit configuration.
        let library = unsafe { Library::new(&path) }.map_err(|source| InteropError::Load {
            path: path.clone(),
            source,
        })?;

        let functions = LocalDbFunctions {
            create_instance: symbol(&library, &path, "LocalDBCreateInstance")?,
            delete_instance: symbol(&library, &path, "LocalDBDeleteInstance")?,
            format_message: symbol(&library, &path, "LocalDBFormatMessage")?,
            get_instance_info: symbol(&library, &path, "LocalDBGetInstanceInfo")?,
            get_instances: symbol(&library, &path, "LocalDBGetInstances")?,
            get_version_info: symbol(&library, &path, "LocalDBGetVersionInfo")?,
            get_versions: symbol(&library, &path, "LocalDBGetVersions")?,
            share_instance: symbol(&library, &path, "LocalDBShareInstance")?,
            start_instance: symbol(&library, &path, "LocalDBStartInstance")?,
            start_tracing: symbol(&library, &path, "LocalDBStartTracing")?,
            stop_instance: symbol(&library, &path, "LocalDBStopInstance")?,
            stop_tracing: symbol(&library, &path, "LocalDBStopTracing")?,
            unshare_instance: symbol(&library, &path, "LocalDBUnshareInstance")?,
        };

        tracing::debug!(path = %path.display(), "Loaded LocalDB instance API");

        Ok(Self {
            functions,
            path: Some(path),
            version,
            _library: Some(library),
        })
    }

    /// Load the library a resolver located.
    pub fn load_resolved(resolved: ResolvedApi) -> InteropResult<Self> {
        Self::load(resolved.path, resolved.version)
    }

    /// Wrap entry points that live in the current process.
    pub fn from_functions(functions: LocalDbFunctions) -> Self {
        Self {
            functions,
            path: None,
            version: None,
            _library: None,
        }
    }

    /// Path of the loaded library, if the table came from one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Installed LocalDB version whose API was loaded, if known.
    pub fn version(&self) -> Option<ApiVersion> {
        self.version
    }

    pub fn functions(&self) -> &LocalDbFunctions {
        &self.functions
    }

    // Forwarding calls. Every pointer argument must satisfy the contract of
    // the corresponding LocalDB function.

    /// # Safety
    /// `version` and `instance_name` must be null or valid null-terminated UTF-16.
    pub unsafe fn create_instance(
        &self,
        version: PCWSTR,
        instance_name: PCWSTR,
        flags: DWORD,
    ) -> HRESULT {
        (self.functions.create_instance)(version, instance_name, flags)
    }

    /// # Safety
    /// `instance_name` must be null or valid null-terminated UTF-16.
    pub unsafe fn delete_instance(&self, instance_name: PCWSTR, flags: DWORD) -> HRESULT {
        (self.functions.delete_instance)(instance_name, flags)
    }

    /// # Safety
    /// `message` must hold `*message_len` characters; `message_len` must be valid.
    pub unsafe fn format_message(
        &self,
        hr_localdb: HRESULT,
        flags: DWORD,
        language_id: DWORD,
        message: PWSTR,
        message_len: *mut DWORD,
    ) -> HRESULT {
        (self.functions.format_message)(hr_localdb, flags, language_id, message, message_len)
    }

    /// # Safety
    /// `info` must point to at least `info_size` writable bytes.
    pub unsafe fn get_instance_info(
        &self,
        instance_name: PCWSTR,
        info: *mut LocalDbInstanceInfo,
        info_size: DWORD,
    ) -> HRESULT {
        (self.functions.get_instance_info)(instance_name, info, info_size)
    }

    /// # Safety
    /// `names` must be null or hold `*count` elements; `count` must be valid.
    pub unsafe fn get_instances(
        &self,
        names: *mut LocalDbInstanceName,
        count: *mut DWORD,
    ) -> HRESULT {
        (self.functions.get_instances)(names, count)
    }

    /// # Safety
    /// `info` must point to at least `info_size` writable bytes.
    pub unsafe fn get_version_info(
        &self,
        version_name: PCWSTR,
        info: *mut LocalDbVersionInfo,
        info_size: DWORD,
    ) -> HRESULT {
        (self.functions.get_version_info)(version_name, info, info_size)
    }

    /// # Safety
    /// `versions` must be null or hold `*count` elements; `count` must be valid.
    pub unsafe fn get_versions(&self, versions: *mut LocalDbVersionName, count: *mut DWORD) -> HRESULT {
        (self.functions.get_versions)(versions, count)
    }

    /// # Safety
    /// `owner_sid` must be a binary SID; names must be valid UTF-16 strings.
    pub unsafe fn share_instance(
        &self,
        owner_sid: PSID,
        private_name: PCWSTR,
        shared_name: PCWSTR,
        flags: DWORD,
    ) -> HRESULT {
        (self.functions.share_instance)(owner_sid, private_name, shared_name, flags)
    }

    /// # Safety
    /// `connection` must hold `*connection_len` characters.
    pub unsafe fn start_instance(
        &self,
        instance_name: PCWSTR,
        flags: DWORD,
        connection: PWSTR,
        connection_len: *mut DWORD,
    ) -> HRESULT {
        (self.functions.start_instance)(instance_name, flags, connection, connection_len)
    }

    /// # Safety
    /// Calls into native code.
    pub unsafe fn start_tracing(&self) -> HRESULT {
        (self.functions.start_tracing)()
    }

    /// # Safety
    /// `instance_name` must be null or valid null-terminated UTF-16.
    pub unsafe fn stop_instance(&self, instance_name: PCWSTR, flags: DWORD, timeout: ULONG) -> HRESULT {
        (self.functions.stop_instance)(instance_name, flags, timeout)
    }

    /// # Safety
    /// Calls into native code.
    pub unsafe fn stop_tracing(&self) -> HRESULT {
        (self.functions.stop_tracing)()
    }

    /// # Safety
    /// `instance_name` must be null or valid null-terminated UTF-16.
    pub unsafe fn unshare_instance(&self, instance_name: PCWSTR, flags: DWORD) -> HRESULT {
        (self.functions.unshare_instance)(instance_name, flags)
    }
}

impl fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeApi")
            .field("path", &self.path)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Resolve one entry point by its exported name.
fn symbol<T: Copy>(library: &Library, path: &Path, name: &'static str) -> InteropResult<T> {
    // Safety: T is the function pointer type declared for `name` in types.rs.
    let symbol: Symbol<T> =
        unsafe { library.get(name.as_bytes()) }.map_err(|source| InteropError::SymbolNotFound {
            name,
            path: path.to_path_buf(),
            source,
        })?;
    Ok(*symbol)
}
