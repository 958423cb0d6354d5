//! Keys and the local keyring.
//!
//! Secret key material is locked at rest: the pkcs8 DER of the RSA key,
//! with an embedded SHA-256 checksum, is encrypted under a passphrase-derived
//! key. Unlocking with the wrong passphrase fails the checksum
//! deterministically instead of yielding a garbage key.

use chrono::{DateTime, SubsecRound, Utc};
use log::debug;
use rand::{CryptoRng, Rng};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use smallvec::{smallvec, SmallVec};
use zeroize::Zeroizing;

use crate::crypto::rsa::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{format_err, Error, Result};
use crate::types::{KeyId, Password, StringToKey};

/// Local key lookup, by key id.
pub trait KeyStore {
    fn find_secret_key(&self, key_id: &KeyId) -> Option<&SecretKey>;
    fn find_public_key(&self, key_id: &KeyId) -> Option<&PublicKey>;
}

#[derive(Debug, Clone)]
pub struct PublicKey {
    key_id: KeyId,
    algorithm: PublicKeyAlgorithm,
    created: DateTime<Utc>,
    user_ids: SmallVec<[String; 1]>,
    key: RsaPublicKey,
}

impl PublicKey {
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    pub fn primary_user_id(&self) -> Option<&str> {
        self.user_ids.first().map(String::as_str)
    }

    pub fn rsa(&self) -> &RsaPublicKey {
        &self.key
    }
}

/// A passphrase-locked secret key and its public half.
#[derive(Debug, Clone)]
pub struct SecretKey {
    details: PublicKey,
    s2k: StringToKey,
    locked: Vec<u8>,
}

/// Secret key material unlocked for one operation.
///
/// The inner RSA key zeroizes itself on drop.
pub struct UnlockedSecretKey {
    key_id: KeyId,
    key: RsaPrivateKey,
}

impl UnlockedSecretKey {
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn rsa(&self) -> &RsaPrivateKey {
        &self.key
    }
}

/// Key id: the low 8 bytes of the SHA-256 of the public key DER.
fn derive_key_id(key: &RsaPublicKey) -> Result<KeyId> {
    let der = key
        .to_public_key_der()
        .map_err(|err| format_err!("could not encode public key: {}", err))?;
    let digest = Sha256::digest(der.as_bytes());
    KeyId::from_slice(&digest[digest.len() - 8..])
}

impl SecretKey {
    /// Generates a fresh RSA key pair locked under `passphrase`.
    pub fn generate<R: Rng + CryptoRng>(
        rng: &mut R,
        bits: usize,
        user_id: impl Into<String>,
        passphrase: &Password,
    ) -> Result<SecretKey> {
        let key = RsaPrivateKey::new(rng, bits)?;
        let public = RsaPublicKey::from(&key);
        let key_id = derive_key_id(&public)?;
        debug!("generated key {}", key_id);

        let der = key
            .to_pkcs8_der()
            .map_err(|err| format_err!("could not encode secret key: {}", err))?;

        let s2k = StringToKey::new(rng);
        let kek = s2k.derive_key(
            &passphrase.read(),
            SymmetricKeyAlgorithm::AES256.key_size(),
        );

        let mut locked = Vec::with_capacity(der.as_bytes().len() + 32);
        locked.extend_from_slice(der.as_bytes());
        locked.extend_from_slice(&Sha256::digest(der.as_bytes()));
        SymmetricKeyAlgorithm::AES256.encrypt_cfb(&kek, &mut locked)?;

        Ok(SecretKey {
            details: PublicKey {
                key_id,
                algorithm: PublicKeyAlgorithm::RSA,
                created: Utc::now().trunc_subsecs(0),
                user_ids: smallvec![user_id.into()],
                key: public,
            },
            s2k,
            locked,
        })
    }

    pub fn key_id(&self) -> &KeyId {
        self.details.key_id()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.details
    }

    /// Unlocks the secret key material with the given passphrase.
    pub fn unlock(&self, passphrase: &Password) -> Result<UnlockedSecretKey> {
        let kek = self.s2k.derive_key(
            &passphrase.read(),
            SymmetricKeyAlgorithm::AES256.key_size(),
        );

        let mut buf = Zeroizing::new(self.locked.clone());
        SymmetricKeyAlgorithm::AES256.decrypt_cfb(&kek, &mut buf)?;

        if buf.len() < 32 {
            return Err(Error::KeyUnlock);
        }
        let (der, check) = buf.split_at(buf.len() - 32);
        if Sha256::digest(der).as_slice() != check {
            return Err(Error::KeyUnlock);
        }

        let key = RsaPrivateKey::from_pkcs8_der(der).map_err(|_| Error::KeyUnlock)?;

        Ok(UnlockedSecretKey {
            key_id: self.details.key_id,
            key,
        })
    }
}

/// In-memory keyring: the `KeyStore` collaborator.
#[derive(Debug, Default)]
pub struct Keyring {
    secret_keys: Vec<SecretKey>,
    public_keys: Vec<PublicKey>,
}

impl Keyring {
    pub fn new() -> Self {
        Keyring::default()
    }

    pub fn add_secret_key(&mut self, key: SecretKey) {
        // the public half is always reachable too
        self.public_keys.push(key.public_key().clone());
        self.secret_keys.push(key);
    }

    pub fn add_public_key(&mut self, key: PublicKey) {
        self.public_keys.push(key);
    }

    pub fn secret_keys(&self) -> &[SecretKey] {
        &self.secret_keys
    }

    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }
}

impl KeyStore for Keyring {
    fn find_secret_key(&self, key_id: &KeyId) -> Option<&SecretKey> {
        self.secret_keys.iter().find(|key| key.key_id() == key_id)
    }

    fn find_public_key(&self, key_id: &KeyId) -> Option<&PublicKey> {
        self.public_keys.iter().find(|key| key.key_id() == key_id)
    }
}
