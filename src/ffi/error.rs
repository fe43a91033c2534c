//! Errors raised while locating and loading the native LocalDB API.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for native API resolution and loading.
#[derive(Debug, Error)]
pub enum InteropError {
    #[error("LocalDB registry key not found: HKLM\\{0}")]
    RegistryKeyNotFound(String),

    #[error("No LocalDB instance API path is registered for any installed version")]
    NativeApiNotFound,

    #[error("LocalDB instance API library does not exist: {}", .0.display())]
    LibraryNotFound(PathBuf),

    #[error("Failed to load library '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Symbol '{name}' not found in '{}': {source}", path.display())]
    SymbolNotFound {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Failed to read the registry: {0}")]
    Registry(#[from] std::io::Error),

    #[error("The exported LocalDB function table is already initialized")]
    AlreadyInitialized,
}

/// Result type for interop operations.
pub type InteropResult<T> = Result<T, InteropError>;
