//! Dotted LocalDB version numbers (`11.0`, `13.0`, `15.0.4153.1`).

use std::fmt;
use std::str::FromStr;

/// A version with two to four numeric components.
///
/// Absent build/revision components order below any present value, so
/// `13.0 < 13.0.0`. Display reproduces exactly the parsed components, which
/// matters because registry sub-keys are reopened by this string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl ApiVersion {
    /// A two-component version.
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    /// A fully specified four-component version.
    pub fn full(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build: Some(build),
            revision: Some(revision),
        }
    }
}

/// Error returned when a string is not a dotted version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version string '{0}'")]
pub struct ParseVersionError(String);

impl FromStr for ApiVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_string());
        let parts = s
            .split('.')
            .map(|p| {
                // Reject signs and whitespace that u32::from_str would otherwise accept.
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(err());
                }
                p.parse::<u32>().map_err(|_| err())
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor)),
            [major, minor, build] => Ok(Self {
                major: *major,
                minor: *minor,
                build: Some(*build),
                revision: None,
            }),
            [major, minor, build, revision] => Ok(Self::full(*major, *minor, *build, *revision)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}
