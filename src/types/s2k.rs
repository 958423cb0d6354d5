use rand::{CryptoRng, Rng};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Salted, iterated string-to-key parameters for turning a passphrase
/// into a symmetric key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToKey {
    salt: [u8; 8],
    /// Number of octets of `salt || passphrase` fed into the hash per block.
    count: u32,
}

pub const DEFAULT_ITER_COUNT: u32 = 65536;

impl StringToKey {
    pub fn new<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut salt = [0u8; 8];
        rng.fill(&mut salt[..]);
        StringToKey {
            salt,
            count: DEFAULT_ITER_COUNT,
        }
    }

    /// Derives `key_size` octets of key material from the passphrase.
    ///
    /// Blocks are SHA-256 over a block counter followed by `salt || passphrase`
    /// repeated until `count` octets have been hashed.
    pub fn derive_key(&self, passphrase: &[u8], key_size: usize) -> Zeroizing<Vec<u8>> {
        let mut key = Zeroizing::new(Vec::with_capacity(key_size));
        let mut block = 0u32;

        while key.len() < key_size {
            let mut hasher = Sha256::new();
            hasher.update(block.to_be_bytes());

            let mut hashed = 0usize;
            while hashed < self.count as usize {
                hasher.update(self.salt);
                hasher.update(passphrase);
                hashed += self.salt.len() + passphrase.len();
            }

            key.extend_from_slice(&hasher.finalize());
            block += 1;
        }

        key.truncate(key_size);
        key
    }
}
