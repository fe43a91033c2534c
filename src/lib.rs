//! SqlLocalDb Interop - SQL Server Express LocalDB instance API
//!
//! Two surfaces over the native LocalDB instance API (`SqlUserInstance.dll`):
//!
//! - **Flat exports** ([`exports`]): `CreateInstance`, `StartInstance`,
//!   `GetLocalDbError` and the rest, built into the `cdylib` for callers that
//!   bind by name. Each forwards to the matching `LocalDB*` function with
//!   reserved flags set to zero and returns its `HRESULT` unchanged.
//! - **Typed API** ([`SqlLocalDbApi`]): UTF-16 conversion, buffer sizing and
//!   error lookup for Rust callers.
//!
//! The native library is located through the LocalDB installation registry
//! (or `sqllocaldb.toml`) and bound at run time.
//!
//! # Example
//!
//! ```no_run
//! use sqllocaldb::{LocalDbConfig, SqlLocalDbApi};
//!
//! let api = SqlLocalDbApi::new(&LocalDbConfig::default())?;
//! let version = api.latest_version()?;
//! api.create_instance("MyInstance", &version)?;
//! let pipe = api.start_instance("MyInstance")?;
//! println!("connect via {}", pipe);
//! api.stop_instance("MyInstance")?;
//! # Ok::<(), sqllocaldb::SqlLocalDbError>(())
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod exports;
pub mod ffi;
pub mod model;

pub use api::SqlLocalDbApi;
pub use config::{ConfigError, ConfigResult, InstanceConfig, LocalDbConfig, NativeConfig};
pub use error::{codes, Result, SqlLocalDbError};
pub use ffi::{ApiVersion, InteropError, InteropResult, NativeApi, Sid, StopOptions};
pub use model::{InstanceInfo, VersionInfo};
