use std::io;

use bytes::Bytes;
use rand::{CryptoRng, Rng};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::crypto::rsa::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::crypto::{checksum, rsa as rsa_ops};
use crate::errors::{malformed, Result};
use crate::ser::Serialize;
use crate::types::{KeyId, Tag};

use super::PacketTrait;

const PKESK_VERSION: u8 = 3;

/// Public-Key Encrypted Session Key Packet: one per intended recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyEncryptedSessionKey {
    key_id: KeyId,
    pub_algorithm: PublicKeyAlgorithm,
    encrypted_session_key: Bytes,
}

impl PublicKeyEncryptedSessionKey {
    /// Encrypts a session key to the recipient's public key.
    ///
    /// The encrypted blob carries the symmetric algorithm id, the key and a
    /// checksum over the key, so corruption is detected on decryption.
    pub fn from_session_key<R: CryptoRng + Rng>(
        rng: &mut R,
        session_key: &[u8],
        alg: SymmetricKeyAlgorithm,
        key_id: KeyId,
        key: &RsaPublicKey,
    ) -> Result<Self> {
        let mut plain = Zeroizing::new(Vec::with_capacity(session_key.len() + 3));
        plain.push(alg.into());
        plain.extend_from_slice(session_key);
        plain.extend_from_slice(&checksum::calculate(session_key).to_be_bytes());

        let encrypted_session_key = rsa_ops::encrypt(rng, key, &plain)?;

        Ok(PublicKeyEncryptedSessionKey {
            key_id,
            pub_algorithm: PublicKeyAlgorithm::RSA,
            encrypted_session_key: encrypted_session_key.into(),
        })
    }

    /// Recovers the session key with the recipient's unlocked secret key.
    pub fn decrypt(
        &self,
        key: &RsaPrivateKey,
    ) -> Result<(SymmetricKeyAlgorithm, Zeroizing<Vec<u8>>)> {
        let plain = rsa_ops::decrypt(key, &self.encrypted_session_key)?;
        if plain.len() < 3 {
            malformed!("encrypted session key is too short");
        }

        let alg = SymmetricKeyAlgorithm::from(plain[0]);
        let (session_key, check) = plain[1..].split_at(plain.len() - 3);
        checksum::verify(session_key, u16::from_be_bytes([check[0], check[1]]))?;

        Ok((alg, Zeroizing::new(session_key.to_vec())))
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn pub_algorithm(&self) -> PublicKeyAlgorithm {
        self.pub_algorithm
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        if input.len() < 12 {
            malformed!("public-key encrypted session key packet is truncated");
        }
        if input[0] != PKESK_VERSION {
            malformed!("unsupported pkesk version {}", input[0]);
        }
        let key_id = KeyId::from_slice(&input[1..9])?;
        let pub_algorithm = PublicKeyAlgorithm::from(input[9]);
        let len = u16::from_be_bytes([input[10], input[11]]) as usize;
        let Some(encrypted) = input.get(12..12 + len) else {
            malformed!("encrypted session key is truncated");
        };
        if input.len() != 12 + len {
            malformed!("trailing bytes after encrypted session key");
        }

        Ok(PublicKeyEncryptedSessionKey {
            key_id,
            pub_algorithm,
            encrypted_session_key: Bytes::copy_from_slice(encrypted),
        })
    }
}

impl Serialize for PublicKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[PKESK_VERSION])?;
        writer.write_all(self.key_id.as_ref())?;
        writer.write_all(&[self.pub_algorithm.into()])?;
        writer.write_all(&u16::try_from(self.encrypted_session_key.len())?.to_be_bytes())?;
        writer.write_all(&self.encrypted_session_key)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        12 + self.encrypted_session_key.len()
    }
}

impl PacketTrait for PublicKeyEncryptedSessionKey {
    fn tag(&self) -> Tag {
        Tag::PublicKeyEncryptedSessionKey
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn session_key_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let secret = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&secret);

        let alg = SymmetricKeyAlgorithm::AES256;
        let session_key = alg.new_session_key(&mut rng);
        let key_id = KeyId::from([1, 1, 2, 2, 3, 3, 4, 4]);

        let pkesk =
            PublicKeyEncryptedSessionKey::from_session_key(&mut rng, &session_key, alg, key_id, &public)
                .unwrap();

        let parsed =
            PublicKeyEncryptedSessionKey::from_slice(&pkesk.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, pkesk);
        assert_eq!(parsed.key_id(), &key_id);

        let (recovered_alg, recovered_key) = parsed.decrypt(&secret).unwrap();
        assert_eq!(recovered_alg, alg);
        assert_eq!(&recovered_key[..], &session_key[..]);
    }

    #[test]
    fn wrong_key_fails() {
        let mut rng = ChaCha20Rng::seed_from_u64(32);
        let secret = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&secret);
        let other = RsaPrivateKey::new(&mut rng, 2048).unwrap();

        let alg = SymmetricKeyAlgorithm::AES128;
        let session_key = alg.new_session_key(&mut rng);

        let pkesk = PublicKeyEncryptedSessionKey::from_session_key(
            &mut rng,
            &session_key,
            alg,
            KeyId::UNKNOWN,
            &public,
        )
        .unwrap();

        assert!(pkesk.decrypt(&other).is_err());
    }
}
