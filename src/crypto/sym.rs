use aes::{Aes128, Aes192, Aes256};
use cast5::Cast5;
use cfb_mode::{cipher::KeyIvInit, BufDecryptor, BufEncryptor};
use cipher::{BlockCipher, BlockEncryptMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::provider::Provider;
use crate::errors::{unsupported_err, Result};

fn encrypt<MODE>(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()>
where
    MODE: BlockEncryptMut + BlockCipher,
    BufEncryptor<MODE>: KeyIvInit,
{
    let mut mode = BufEncryptor::<MODE>::new_from_slices(key, iv)?;
    mode.encrypt(data);

    Ok(())
}

fn decrypt<MODE>(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()>
where
    MODE: BlockEncryptMut + BlockCipher,
    BufDecryptor<MODE>: KeyIvInit,
{
    let mut mode = BufDecryptor::<MODE>::new_from_slices(key, iv)?;
    mode.decrypt(data);

    Ok(())
}

/// Available symmetric key algorithms.
///
/// `Plaintext` doubles as the "no encryption" selector when composing.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    Plaintext = 0,
    /// IDEA
    IDEA = 1,
    /// Triple-DES
    TripleDES = 2,
    /// CAST5
    CAST5 = 3,
    /// Blowfish
    Blowfish = 4,
    // 5 & 6 are reserved for DES/SK
    /// AES with 128-bit key
    AES128 = 7,
    /// AES with 192-bit key
    AES192 = 8,
    /// AES with 256-bit key
    AES256 = 9,
    /// Twofish with 256-bit key
    Twofish = 10,
    /// Camellia with 128-bit key
    Camellia128 = 11,
    /// Camellia with 192-bit key
    Camellia192 = 12,
    /// Camellia with 256-bit key
    Camellia256 = 13,

    #[num_enum(catch_all)]
    Other(u8),
}

impl SymmetricKeyAlgorithm {
    /// The size of a single block in bytes.
    pub fn block_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Plaintext => 0,
            SymmetricKeyAlgorithm::IDEA
            | SymmetricKeyAlgorithm::TripleDES
            | SymmetricKeyAlgorithm::CAST5
            | SymmetricKeyAlgorithm::Blowfish => 8,
            SymmetricKeyAlgorithm::AES128
            | SymmetricKeyAlgorithm::AES192
            | SymmetricKeyAlgorithm::AES256
            | SymmetricKeyAlgorithm::Twofish
            | SymmetricKeyAlgorithm::Camellia128
            | SymmetricKeyAlgorithm::Camellia192
            | SymmetricKeyAlgorithm::Camellia256 => 16,
            SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// The size of a key in bytes.
    pub fn key_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Plaintext => 0,
            SymmetricKeyAlgorithm::IDEA
            | SymmetricKeyAlgorithm::CAST5
            | SymmetricKeyAlgorithm::Blowfish
            | SymmetricKeyAlgorithm::AES128
            | SymmetricKeyAlgorithm::Camellia128 => 16,
            SymmetricKeyAlgorithm::TripleDES
            | SymmetricKeyAlgorithm::AES192
            | SymmetricKeyAlgorithm::Camellia192 => 24,
            SymmetricKeyAlgorithm::AES256
            | SymmetricKeyAlgorithm::Twofish
            | SymmetricKeyAlgorithm::Camellia256 => 32,
            SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// Display name as shown to the user, from the provider catalog.
    pub fn display_name(self) -> &'static str {
        Provider::global().symmetric_name(self.into())
    }

    /// Generate a new session key.
    pub fn new_session_key<R: Rng + CryptoRng>(self, rng: &mut R) -> Zeroizing<Vec<u8>> {
        let mut session_key = Zeroizing::new(vec![0u8; self.key_size()]);
        rng.fill(&mut session_key[..]);
        session_key
    }

    /// Encrypts `data` in place, CFB mode with an all-zero IV.
    pub fn encrypt_cfb(self, key: &[u8], data: &mut [u8]) -> Result<()> {
        let iv = vec![0u8; self.block_size()];
        match self {
            SymmetricKeyAlgorithm::CAST5 => encrypt::<Cast5>(key, &iv, data),
            SymmetricKeyAlgorithm::AES128 => encrypt::<Aes128>(key, &iv, data),
            SymmetricKeyAlgorithm::AES192 => encrypt::<Aes192>(key, &iv, data),
            SymmetricKeyAlgorithm::AES256 => encrypt::<Aes256>(key, &iv, data),
            _ => unsupported_err!("symmetric algorithm {}", self.display_name()),
        }
    }

    /// Decrypts `data` in place, CFB mode with an all-zero IV.
    pub fn decrypt_cfb(self, key: &[u8], data: &mut [u8]) -> Result<()> {
        let iv = vec![0u8; self.block_size()];
        match self {
            SymmetricKeyAlgorithm::CAST5 => decrypt::<Cast5>(key, &iv, data),
            SymmetricKeyAlgorithm::AES128 => decrypt::<Aes128>(key, &iv, data),
            SymmetricKeyAlgorithm::AES192 => decrypt::<Aes192>(key, &iv, data),
            SymmetricKeyAlgorithm::AES256 => decrypt::<Aes256>(key, &iv, data),
            _ => unsupported_err!("symmetric algorithm {}", self.display_name()),
        }
    }
}
