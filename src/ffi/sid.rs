//! Binary Windows security identifiers.
//!
//! `LocalDBShareInstance` takes the owner as a binary SID, while callers
//! naturally hold the string form (`S-1-5-21-...`).

use std::fmt;
use std::str::FromStr;

/// Most sub-authorities a SID may carry.
pub const SID_MAX_SUB_AUTHORITIES: usize = 15;
/// Largest binary SID: 8 byte header plus 15 sub-authorities.
pub const SECURITY_MAX_SID_SIZE: usize = 8 + 4 * SID_MAX_SUB_AUTHORITIES;

/// Error returned for malformed SID strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid security identifier '{0}'")]
pub struct ParseSidError(String);

/// A security identifier in its binary layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sid {
    bytes: Vec<u8>,
}

impl Sid {
    pub fn revision(&self) -> u8 {
        self.bytes[0]
    }

    pub fn identifier_authority(&self) -> u64 {
        self.bytes[2..8]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    pub fn sub_authorities(&self) -> impl Iterator<Item = u32> + '_ {
        self.bytes[8..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// The binary form passed to the native API.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FromStr for Sid {
    type Err = ParseSidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSidError(s.to_string());
        let mut parts = s.split('-');

        match parts.next() {
            Some(prefix) if prefix.eq_ignore_ascii_case("S") => {}
            _ => return Err(err()),
        }

        let revision = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .filter(|&r| r == 1)
            .ok_or_else(err)?;

        let authority = parts.next().and_then(parse_authority).ok_or_else(err)?;

        let sub_authorities = parts
            .map(|p| p.parse::<u32>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()?;
        if sub_authorities.len() > SID_MAX_SUB_AUTHORITIES {
            return Err(err());
        }

        let mut bytes = Vec::with_capacity(8 + 4 * sub_authorities.len());
        bytes.push(revision);
        bytes.push(sub_authorities.len() as u8);
        bytes.extend_from_slice(&authority.to_be_bytes()[2..]);
        for sub in &sub_authorities {
            bytes.extend_from_slice(&sub.to_le_bytes());
        }

        Ok(Self { bytes })
    }
}

/// Decimal, or `0x` hex for authorities of 2^32 and above. Must fit 48 bits.
fn parse_authority(s: &str) -> Option<u64> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => s.parse::<u64>().ok()?,
    };
    (value < 1 << 48).then_some(value)
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authority = self.identifier_authority();
        write!(f, "S-{}-", self.revision())?;
        if authority >= 1 << 32 {
            write!(f, "0x{:012X}", authority)?;
        } else {
            write!(f, "{}", authority)?;
        }
        for sub in self.sub_authorities() {
            write!(f, "-{}", sub)?;
        }
        Ok(())
    }
}
