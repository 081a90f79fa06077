//! Signing helpers for tests

use base64::{engine::general_purpose, Engine as _};
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{Signer, SigningKey};

use crate::app::signature::PublicKey;
use crate::constants::format;

/// Deterministic minisign-compatible signer
pub(crate) struct TestSigner {
    signing_key: SigningKey,
    key_id: [u8; format::KEY_ID_LENGTH],
}

impl TestSigner {
    pub(crate) fn new(seed: u8) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&[seed; 32]),
            key_id: [seed.wrapping_add(0x40); format::KEY_ID_LENGTH],
        }
    }

    pub(crate) fn key_id(&self) -> [u8; format::KEY_ID_LENGTH] {
        self.key_id
    }

    pub(crate) fn public_key(&self) -> PublicKey {
        PublicKey::from_parts(self.key_id, self.signing_key.verifying_key())
    }

    pub(crate) fn public_key_base64(&self) -> String {
        self.public_key().to_base64()
    }

    /// Prehashed signature, the default minisign produces
    pub(crate) fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let digest = Blake2b512::digest(payload);
        self.encode(format::ALG_ED25519_PREHASHED, &digest)
    }

    /// Legacy signature over the raw payload
    pub(crate) fn sign_legacy(&self, payload: &[u8]) -> Vec<u8> {
        self.encode(format::ALG_ED25519, payload)
    }

    fn encode(&self, algorithm: [u8; 2], message: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(message).to_bytes();
        let trusted_comment = "timestamp:1700000000\tfile:sources.md";

        let mut line = Vec::with_capacity(74);
        line.extend_from_slice(&algorithm);
        line.extend_from_slice(&self.key_id);
        line.extend_from_slice(&signature);

        let mut global = signature.to_vec();
        global.extend_from_slice(trusted_comment.as_bytes());
        let global_signature = self.signing_key.sign(&global).to_bytes();

        format!(
            "untrusted comment: signature from test secret key\n{}\ntrusted comment: {}\n{}\n",
            general_purpose::STANDARD.encode(line),
            trusted_comment,
            general_purpose::STANDARD.encode(global_signature)
        )
        .into_bytes()
    }
}
