//! Detached minisign signature files
//!
//! Layout, one item per line:
//!
//! ```text
//! untrusted comment: <free text>
//! base64(<algorithm:2> <key id:8> <signature:64>)
//! trusted comment: <free text covered by the global signature>
//! base64(<global signature:64>)
//! ```

use base64::{engine::general_purpose, Engine as _};
use ed25519_dalek::Signature;

use crate::constants::format;
use crate::errors::{SignatureError, SignatureResult};

const SIGNATURE_LINE_LENGTH: usize = 2 + format::KEY_ID_LENGTH + Signature::BYTE_SIZE;

/// A decoded detached signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFile {
    algorithm: [u8; 2],
    key_id: [u8; format::KEY_ID_LENGTH],
    signature: Signature,
    trusted_comment: String,
    global_signature: Signature,
}

impl SignatureFile {
    /// Decode a signature file from raw bytes
    ///
    /// Truncated or otherwise damaged files fail with
    /// `SignatureError::Malformed`.
    pub fn decode(bytes: &[u8]) -> SignatureResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| malformed("not valid UTF-8"))?;
        let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));

        let untrusted = lines.next().ok_or_else(|| malformed("empty file"))?;
        if !untrusted.starts_with(format::UNTRUSTED_COMMENT_PREFIX) {
            return Err(malformed("missing untrusted comment"));
        }

        let encoded = lines
            .next()
            .ok_or_else(|| malformed("missing signature line"))?;
        let raw = decode_base64(encoded, "signature")?;
        if raw.len() != SIGNATURE_LINE_LENGTH {
            return Err(malformed(format!(
                "signature line is {} bytes, expected {SIGNATURE_LINE_LENGTH}",
                raw.len()
            )));
        }

        let mut algorithm = [0u8; 2];
        algorithm.copy_from_slice(&raw[..2]);
        if algorithm != format::ALG_ED25519 && algorithm != format::ALG_ED25519_PREHASHED {
            return Err(SignatureError::UnsupportedAlgorithm {
                algorithm: String::from_utf8_lossy(&algorithm).into_owned(),
            });
        }

        let mut key_id = [0u8; format::KEY_ID_LENGTH];
        key_id.copy_from_slice(&raw[2..2 + format::KEY_ID_LENGTH]);
        let signature = signature_from_slice(&raw[2 + format::KEY_ID_LENGTH..])?;

        let trusted_comment = lines
            .next()
            .and_then(|line| line.strip_prefix(format::TRUSTED_COMMENT_PREFIX))
            .ok_or_else(|| malformed("missing trusted comment"))?
            .to_string();

        let encoded_global = lines
            .next()
            .ok_or_else(|| malformed("missing global signature"))?;
        let global_signature = signature_from_slice(&decode_base64(encoded_global, "global signature")?)?;

        Ok(Self {
            algorithm,
            key_id,
            signature,
            trusted_comment,
            global_signature,
        })
    }

    /// Key id the signature claims to be made with
    pub fn key_id(&self) -> [u8; format::KEY_ID_LENGTH] {
        self.key_id
    }

    /// Whether the payload signature covers a BLAKE2b-512 digest
    pub fn is_prehashed(&self) -> bool {
        self.algorithm == format::ALG_ED25519_PREHASHED
    }

    /// The comment covered by the global signature
    pub fn trusted_comment(&self) -> &str {
        &self.trusted_comment
    }

    pub(crate) fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn global_signature(&self) -> &Signature {
        &self.global_signature
    }

    /// Bytes covered by the global signature: payload signature then trusted comment
    pub(crate) fn global_message(&self) -> Vec<u8> {
        let mut message = self.signature.to_bytes().to_vec();
        message.extend_from_slice(self.trusted_comment.as_bytes());
        message
    }
}

fn decode_base64(line: &str, what: &str) -> SignatureResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(line.trim())
        .map_err(|err| malformed(format!("malformed base64 in {what}: {err}")))
}

fn signature_from_slice(raw: &[u8]) -> SignatureResult<Signature> {
    let array: [u8; Signature::BYTE_SIZE] = raw
        .try_into()
        .map_err(|_| malformed("signature must be 64 bytes"))?;
    Ok(Signature::from_bytes(&array))
}

fn malformed(reason: impl Into<String>) -> SignatureError {
    SignatureError::Malformed {
        reason: reason.into(),
    }
}
