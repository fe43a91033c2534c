//! Errors for the typed LocalDB API.

use thiserror::Error;

use crate::ffi::{InteropError, HRESULT};

/// Error type for [`SqlLocalDbApi`](crate::SqlLocalDbApi) operations.
#[derive(Debug, Error)]
pub enum SqlLocalDbError {
    /// A LocalDB call failed. `message` is the text from `LocalDBFormatMessage`.
    #[error("{message}")]
    LocalDb {
        code: HRESULT,
        message: String,
        instance_name: Option<String>,
    },

    #[error("SQL Server LocalDB is not installed on this machine")]
    NotInstalled,

    #[error("No versions of SQL Server LocalDB are installed on this machine")]
    NoVersionsInstalled,

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error(transparent)]
    InvalidSid(#[from] crate::ffi::ParseSidError),

    #[error(transparent)]
    Interop(#[from] InteropError),
}

impl SqlLocalDbError {
    /// The LocalDB `HRESULT` behind this error, if there is one.
    pub fn code(&self) -> Option<HRESULT> {
        match self {
            SqlLocalDbError::LocalDb { code, .. } => Some(*code),
            SqlLocalDbError::NotInstalled => Some(codes::NOT_INSTALLED),
            _ => None,
        }
    }

    /// The instance the failed call targeted.
    pub fn instance_name(&self) -> Option<&str> {
        match self {
            SqlLocalDbError::LocalDb { instance_name, .. } => instance_name.as_deref(),
            _ => None,
        }
    }
}

/// Result type for typed LocalDB operations.
pub type Result<T> = std::result::Result<T, SqlLocalDbError>;

/// `HRESULT` values returned by the LocalDB instance API.
pub mod codes {
    use crate::ffi::HRESULT;

    const fn hr(value: u32) -> HRESULT {
        value as HRESULT
    }

    pub const CANNOT_CREATE_INSTANCE_FOLDER: HRESULT = hr(0x89C5_0100);
    pub const INVALID_PARAMETER: HRESULT = hr(0x89C5_0101);
    pub const INSTANCE_EXISTS_WITH_LOWER_VERSION: HRESULT = hr(0x89C5_0102);
    pub const CANNOT_GET_USER_PROFILE_FOLDER: HRESULT = hr(0x89C5_0103);
    pub const INSTANCE_FOLDER_PATH_TOO_LONG: HRESULT = hr(0x89C5_0104);
    pub const CANNOT_ACCESS_INSTANCE_FOLDER: HRESULT = hr(0x89C5_0105);
    pub const CANNOT_ACCESS_INSTANCE_REGISTRY: HRESULT = hr(0x89C5_0106);
    pub const UNKNOWN_INSTANCE: HRESULT = hr(0x89C5_0107);
    pub const INTERNAL_ERROR: HRESULT = hr(0x89C5_0108);
    pub const CANNOT_MODIFY_INSTANCE_REGISTRY: HRESULT = hr(0x89C5_0109);
    pub const SERVER_STARTUP_FAILED: HRESULT = hr(0x89C5_010A);
    pub const INSTANCE_CONFIGURATION_CORRUPT: HRESULT = hr(0x89C5_010B);
    pub const CANNOT_CREATE_SQL_PROCESS: HRESULT = hr(0x89C5_010C);
    pub const UNKNOWN_VERSION: HRESULT = hr(0x89C5_010D);
    pub const UNKNOWN_LANGUAGE_ID: HRESULT = hr(0x89C5_010E);
    pub const INSTANCE_STOP_FAILED: HRESULT = hr(0x89C5_010F);
    pub const UNKNOWN_ERROR_CODE: HRESULT = hr(0x89C5_0110);
    pub const VERSION_NOT_INSTALLED: HRESULT = hr(0x89C5_0111);
    pub const INSTANCE_BUSY: HRESULT = hr(0x89C5_0112);
    pub const INVALID_OPERATION: HRESULT = hr(0x89C5_0113);
    pub const INSUFFICIENT_BUFFER: HRESULT = hr(0x89C5_0114);
    pub const WAIT_TIMEOUT: HRESULT = hr(0x89C5_0115);
    pub const NOT_INSTALLED: HRESULT = hr(0x89C5_0116);
    pub const XEVENT_FAILED: HRESULT = hr(0x89C5_0117);
    pub const AUTO_INSTANCE_CREATE_FAILED: HRESULT = hr(0x89C5_0118);
    pub const SHARED_NAME_TAKEN: HRESULT = hr(0x89C5_0119);
    pub const CALLER_IS_NOT_OWNER: HRESULT = hr(0x89C5_011A);
    pub const INVALID_INSTANCE_NAME: HRESULT = hr(0x89C5_011B);
    pub const INSTANCE_ALREADY_SHARED: HRESULT = hr(0x89C5_011C);
    pub const INSTANCE_NOT_SHARED: HRESULT = hr(0x89C5_011D);
    pub const ADMIN_RIGHTS_REQUIRED: HRESULT = hr(0x89C5_011E);
    pub const TOO_MANY_SHARED_INSTANCES: HRESULT = hr(0x89C5_011F);
    pub const CANNOT_GET_LOCAL_APP_DATA_PATH: HRESULT = hr(0x89C5_0120);
    pub const CANNOT_LOAD_RESOURCES: HRESULT = hr(0x89C5_0121);

    // Detailed messages
    pub const DATA_DIRECTORY_MISSING: HRESULT = hr(0x89C5_0200);
    pub const CANNOT_ACCESS_INSTANCE_FOLDER_DETAIL: HRESULT = hr(0x89C5_0201);
    pub const DATA_DIRECTORY_IS_TOO_LONG: HRESULT = hr(0x89C5_0202);
    pub const PARENT_INSTANCE_IS_MISSING: HRESULT = hr(0x89C5_0203);
    pub const PARENT_INSTANCE_IS_TOO_LONG: HRESULT = hr(0x89C5_0204);
    pub const DATA_DIRECTORY_INVALID: HRESULT = hr(0x89C5_0205);
    pub const XEVENT_ASSERT: HRESULT = hr(0x89C5_0206);
    pub const XEVENT_ERROR: HRESULT = hr(0x89C5_0207);
    pub const INSTALLATION_CORRUPTED: HRESULT = hr(0x89C5_0208);
    pub const CANNOT_GET_PROGRAM_FILES_LOCATION: HRESULT = hr(0x89C5_0209);
    pub const CANNOT_INITIALIZE_XEVENT: HRESULT = hr(0x89C5_020A);
    pub const CANNOT_FIND_XEVENT_CONFIG_FILE: HRESULT = hr(0x89C5_020B);
    pub const CANNOT_CONFIGURE_XEVENT: HRESULT = hr(0x89C5_020C);
    pub const XEVENT_CONFIG_FILE_TOO_LONG: HRESULT = hr(0x89C5_020D);
    pub const CO_INITIALIZE_EX_FAILED: HRESULT = hr(0x89C5_020E);
    pub const PARENT_INSTANCE_VERSION_INVALID: HRESULT = hr(0x89C5_020F);
    pub const WINDOWS_API_ERROR: HRESULT = hr(0x89C5_0210);
    pub const UNEXPECTED_RESULT: HRESULT = hr(0x89C5_0211);
}
