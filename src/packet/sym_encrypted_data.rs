use std::io;

use bytes::Bytes;
use rand::{CryptoRng, Rng};

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{malformed, unsupported_err, Result};
use crate::ser::Serialize;
use crate::types::Tag;

use super::PacketTrait;

/// Symmetrically Encrypted Data Packet, without integrity protection.
///
/// Kept for reading messages from senders that chose not to enable the
/// protection sub-packet; this crate never composes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymEncryptedData {
    data: Bytes,
}

impl SymEncryptedData {
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
        let mut buf = Vec::with_capacity(bs + 2 + plaintext.len());

        let mut prefix = vec![0u8; bs];
        rng.fill(&mut prefix[..]);
        buf.extend_from_slice(&prefix);
        buf.extend_from_slice(&prefix[bs - 2..]);
        buf.extend_from_slice(plaintext);

        alg.encrypt_cfb(session_key, &mut buf)?;

        Ok(SymEncryptedData { data: buf.into() })
    }

    pub fn decrypt(&self, alg: SymmetricKeyAlgorithm, session_key: &[u8]) -> Result<Vec<u8>> {
        let bs = alg.block_size();
        if bs == 0 {
            unsupported_err!("symmetric algorithm {}", alg.display_name());
        }
        let mut buf = self.data.to_vec();
        alg.decrypt_cfb(session_key, &mut buf)?;

        if buf.len() < bs + 2 {
            malformed!("encrypted data packet is too short");
        }
        if buf[bs - 2..bs] != buf[bs..bs + 2] {
            malformed!("decryption quick check failed");
        }

        Ok(buf[bs + 2..].to_vec())
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        Ok(SymEncryptedData {
            data: Bytes::copy_from_slice(input),
        })
    }
}

impl Serialize for SymEncryptedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.data.len()
    }
}

impl PacketTrait for SymEncryptedData {
    fn tag(&self) -> Tag {
        Tag::SymEncryptedData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(51);
        let alg = SymmetricKeyAlgorithm::AES192;
        let key = alg.new_session_key(&mut rng);

        let packet = SymEncryptedData::encrypt(&mut rng, alg, &key, b"unprotected").unwrap();
        assert_eq!(packet.decrypt(alg, &key).unwrap(), b"unprotected");
    }
}
