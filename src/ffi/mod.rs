//! FFI Module for the LocalDB instance API
//!
//! Binds `SqlUserInstance.dll` at run time and mirrors its types.
//!
//! # Architecture
//!
//! ```text
//! sqllocaldb.toml / registry
//!       │
//!       ▼
//! ApiPathResolver (Installed Versions\<ver>\InstanceAPIPath)
//!       │
//!       ▼
//! NativeApi (libloading, 13 resolved entry points)
//!       │
//!       ├──▶ exports (flat shim for P/Invoke callers)
//!       └──▶ SqlLocalDbApi (typed Rust wrapper)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let resolved = ApiPathResolver::system().resolve()?;
//! let native = NativeApi::load_resolved(resolved)?;
//! let hr = unsafe { native.start_tracing() };
//! ```

mod error;
mod loader;
mod resolver;
mod sid;
mod types;
mod version;

pub use error::{InteropError, InteropResult};
pub use loader::{LocalDbFunctions, NativeApi};
pub use resolver::{
    is_wow64_process, registry_key_name, ApiPathResolver, Registry, ResolvedApi, SystemRegistry,
    INSTANCE_API_PATH_VALUE,
};
pub use sid::{ParseSidError, Sid, SECURITY_MAX_SID_SIZE, SID_MAX_SUB_AUTHORITIES};
pub use types::*;
pub use version::{ApiVersion, ParseVersionError};

#[cfg(test)]
mod tests;
