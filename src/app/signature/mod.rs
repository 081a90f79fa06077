//! Construction gate and detached signature verification
//!
//! Before a source touches the disk or the network its format tag and
//! encoded public key are checked here. The parsed [`PublicKey`] is then
//! the only thing that can promote bytes to a trusted payload.

pub mod key;
pub mod minisig;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::str::FromStr;

pub use key::PublicKey;
pub use minisig::SignatureFile;

use crate::constants::format;
use crate::errors::{GateError, GateResult};

/// Source container formats this client understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceFormat {
    /// Minisign-signed raw payload
    #[default]
    V2,
}

impl SourceFormat {
    /// Tag used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::V2 => format::SUPPORTED_FORMAT,
        }
    }
}

impl FromStr for SourceFormat {
    type Err = GateError;

    fn from_str(tag: &str) -> GateResult<Self> {
        if tag == format::SUPPORTED_FORMAT {
            Ok(SourceFormat::V2)
        } else {
            Err(GateError::UnsupportedFormat {
                found: tag.to_string(),
                expected: format::SUPPORTED_FORMAT,
            })
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate construction parameters, format first, then the key
pub fn check_parameters(format_tag: &str, encoded_key: &str) -> GateResult<(SourceFormat, PublicKey)> {
    let format = format_tag.parse::<SourceFormat>()?;
    let key = PublicKey::from_base64(encoded_key)?;
    Ok((format, key))
}
