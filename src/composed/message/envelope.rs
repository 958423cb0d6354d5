use bytes::Bytes;

use crate::types::KeyId;

/// Result and request record for one message.
///
/// `encrypted_message` holds the bytes as received or to be sent; every
/// other field is populated by [`inspect_envelope`](super::inspect_envelope)
/// or [`decrypt_and_verify`](super::decrypt_and_verify). Each flag is set by
/// exactly one pipeline stage per run; the two `*_verified` flags are only
/// ever true when the corresponding check actually ran and passed.
#[derive(Debug, Clone, Default)]
pub struct MessageEnvelope {
    pub encrypted_message: Bytes,
    pub decrypted_message: Option<Bytes>,
    pub sender_key_id: KeyId,
    pub receiver_key_id: KeyId,
    /// Display name of the symmetric algorithm, empty until determined.
    pub symmetric_algorithm: String,
    pub is_encrypted: bool,
    pub is_signed: bool,
    pub is_compressed: bool,
    pub is_armored: bool,
    pub is_integrity_verified: bool,
    pub is_signature_verified: bool,
}

impl MessageEnvelope {
    pub fn from_bytes(encrypted_message: impl Into<Bytes>) -> Self {
        MessageEnvelope {
            encrypted_message: encrypted_message.into(),
            ..Default::default()
        }
    }

    /// Clears everything a decode run writes, so each run starts from a
    /// clean slate and every flag is written by at most one stage.
    pub(crate) fn reset_decode_state(&mut self) {
        self.decrypted_message = None;
        self.sender_key_id = KeyId::UNKNOWN;
        self.receiver_key_id = KeyId::UNKNOWN;
        self.symmetric_algorithm.clear();
        self.is_encrypted = false;
        self.is_signed = false;
        self.is_compressed = false;
        self.is_armored = false;
        self.is_integrity_verified = false;
        self.is_signature_verified = false;
    }
}
