use std::io;

use bytes::Bytes;
use rand::{CryptoRng, Rng};
use sha2::{Digest, Sha256};

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{malformed, unsupported_err, Error, Result};
use crate::ser::Serialize;
use crate::types::Tag;

use super::PacketTrait;

const PROTECTED_DATA_VERSION: u8 = 1;

/// Modification detection code captured during decryption.
///
/// Comparison is deferred so the pipeline can verify integrity after the
/// literal data has been extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mdc {
    expected: [u8; 32],
    computed: [u8; 32],
}

impl Mdc {
    pub fn is_valid(&self) -> bool {
        self.expected == self.computed
    }

    pub fn verify(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::IntegrityCheck);
        }
        Ok(())
    }
}

/// Sym. Encrypted and Integrity Protected Data Packet.
///
/// The plaintext is `prefix || body || SHA-256(prefix || body)`, where the
/// prefix is one random block followed by its last two octets repeated
/// (the decryption quick check).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymEncryptedProtectedData {
    data: Bytes,
}

impl SymEncryptedProtectedData {
    pub fn encrypt<R: CryptoRng + Rng>(
        rng: &mut R,
        alg: SymmetricKeyAlgorithm,
        session_key: &[u8],
        plaintext: &[u8],
    ) -> Result<Self> {
        let bs = alg.block_size();
        if bs == 0 {
            unsupported_err!("symmetric algorithm {}", alg.display_name());
        }
        let mut buf = Vec::with_capacity(bs + 2 + plaintext.len() + 32);

        let mut prefix = vec![0u8; bs];
        rng.fill(&mut prefix[..]);
        buf.extend_from_slice(&prefix);
        buf.extend_from_slice(&prefix[bs - 2..]);
        buf.extend_from_slice(plaintext);

        let mdc = Sha256::digest(&buf);
        buf.extend_from_slice(&mdc);

        alg.encrypt_cfb(session_key, &mut buf)?;

        Ok(SymEncryptedProtectedData { data: buf.into() })
    }

    /// Decrypts the body, returning the inner packet bytes and the
    /// detection code for the deferred integrity check.
    pub fn decrypt(
        &self,
        alg: SymmetricKeyAlgorithm,
        session_key: &[u8],
    ) -> Result<(Vec<u8>, Mdc)> {
        let bs = alg.block_size();
        if bs == 0 {
            unsupported_err!("symmetric algorithm {}", alg.display_name());
        }
        let mut buf = self.data.to_vec();
        alg.decrypt_cfb(session_key, &mut buf)?;

        if buf.len() < bs + 2 + 32 {
            malformed!("encrypted data packet is too short");
        }
        if buf[bs - 2..bs] != buf[bs..bs + 2] {
            malformed!("decryption quick check failed");
        }

        let mdc_offset = buf.len() - 32;
        let mut expected = [0u8; 32];
        expected.copy_from_slice(&buf[mdc_offset..]);
        let mut computed = [0u8; 32];
        computed.copy_from_slice(&Sha256::digest(&buf[..mdc_offset]));

        let body = buf[bs + 2..mdc_offset].to_vec();

        Ok((body, Mdc { expected, computed }))
    }

    pub fn version(&self) -> u8 {
        PROTECTED_DATA_VERSION
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let Some((&version, rest)) = input.split_first() else {
            malformed!("encrypted data packet is empty");
        };
        if version != PROTECTED_DATA_VERSION {
            malformed!("unsupported protected data version {}", version);
        }
        Ok(SymEncryptedProtectedData {
            data: Bytes::copy_from_slice(rest),
        })
    }
}

impl Serialize for SymEncryptedProtectedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[PROTECTED_DATA_VERSION])?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + self.data.len()
    }
}

impl PacketTrait for SymEncryptedProtectedData {
    fn tag(&self) -> Tag {
        Tag::SymEncryptedProtectedData
    }
}
