//! Minisign public keys
//!
//! A minisign public key is the base64 encoding of a two-byte algorithm tag,
//! an eight-byte key id and a 32-byte Ed25519 public key.

use std::borrow::Cow;
use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{Verifier, VerifyingKey};

use crate::app::signature::minisig::SignatureFile;
use crate::constants::format;
use crate::errors::{GateError, GateResult, SignatureError, SignatureResult};

const ENCODED_KEY_LENGTH: usize = 2 + format::KEY_ID_LENGTH + 32;

/// Trusted public key used to authenticate payloads
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_id: [u8; format::KEY_ID_LENGTH],
    key: VerifyingKey,
}

impl PublicKey {
    /// Decode a key from its base64 form
    ///
    /// Accepts either the bare base64 line or the full two-line key file
    /// (the `untrusted comment:` line is skipped).
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidPublicKey` if the string is empty, not valid
    /// base64, has the wrong length or algorithm, or is not an Ed25519 point.
    pub fn from_base64(encoded: &str) -> GateResult<Self> {
        let line = encoded
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !line.starts_with(format::UNTRUSTED_COMMENT_PREFIX))
            .last()
            .ok_or_else(|| invalid_key("key string is empty"))?;

        let raw = general_purpose::STANDARD
            .decode(line)
            .map_err(|err| invalid_key(format!("malformed base64: {err}")))?;

        if raw.len() != ENCODED_KEY_LENGTH {
            return Err(invalid_key(format!(
                "expected {ENCODED_KEY_LENGTH} bytes, got {}",
                raw.len()
            )));
        }

        if raw[..2] != format::ALG_ED25519 {
            return Err(invalid_key(format!(
                "unsupported key algorithm {}",
                String::from_utf8_lossy(&raw[..2])
            )));
        }

        let mut key_id = [0u8; format::KEY_ID_LENGTH];
        key_id.copy_from_slice(&raw[2..2 + format::KEY_ID_LENGTH]);

        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&raw[2 + format::KEY_ID_LENGTH..]);
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|err| invalid_key(format!("not an Ed25519 public key: {err}")))?;

        Ok(Self { key_id, key })
    }

    /// Build a key from its parts
    pub fn from_parts(key_id: [u8; format::KEY_ID_LENGTH], key: VerifyingKey) -> Self {
        Self { key_id, key }
    }

    /// Raw key id bytes
    pub fn key_id(&self) -> [u8; format::KEY_ID_LENGTH] {
        self.key_id
    }

    /// Key id in the upper-case hex form minisign prints
    pub fn key_id_hex(&self) -> String {
        key_id_hex(&self.key_id)
    }

    /// Encode the key back to its base64 line
    pub fn to_base64(&self) -> String {
        let mut raw = Vec::with_capacity(ENCODED_KEY_LENGTH);
        raw.extend_from_slice(&format::ALG_ED25519);
        raw.extend_from_slice(&self.key_id);
        raw.extend_from_slice(self.key.as_bytes());
        general_purpose::STANDARD.encode(raw)
    }

    /// Verify `payload` against a decoded detached signature
    ///
    /// Checks the key id, the payload signature (over the BLAKE2b-512 digest
    /// for prehashed signatures), and the signature over the trusted comment.
    pub fn verify(&self, payload: &[u8], signature: &SignatureFile) -> SignatureResult<()> {
        if signature.key_id() != self.key_id {
            return Err(SignatureError::KeyMismatch {
                expected: self.key_id_hex(),
                found: key_id_hex(&signature.key_id()),
            });
        }

        let message: Cow<'_, [u8]> = if signature.is_prehashed() {
            Cow::Owned(Blake2b512::digest(payload).to_vec())
        } else {
            Cow::Borrowed(payload)
        };

        self.key
            .verify(&message, signature.signature())
            .map_err(|_| SignatureError::Invalid)?;

        self.key
            .verify(&signature.global_message(), signature.global_signature())
            .map_err(|_| SignatureError::GlobalInvalid)
    }

    /// Decode `signature` and verify `payload` against it
    pub fn verify_detached(&self, payload: &[u8], signature: &[u8]) -> SignatureResult<SignatureFile> {
        let decoded = SignatureFile::decode(signature)?;
        self.verify(payload, &decoded)?;
        Ok(decoded)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_id", &self.key_id_hex())
            .finish()
    }
}

fn invalid_key(reason: impl Into<String>) -> GateError {
    GateError::InvalidPublicKey {
        reason: reason.into(),
    }
}

pub(crate) fn key_id_hex(key_id: &[u8; format::KEY_ID_LENGTH]) -> String {
    format!("{:016X}", u64::from_le_bytes(*key_id))
}
