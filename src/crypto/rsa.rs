use num_enum::{FromPrimitive, IntoPrimitive};
use rand::{CryptoRng, Rng};
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use snafu::ResultExt;
use zeroize::Zeroizing;

use crate::errors::{EncryptionSnafu, Error, Result, SigningSnafu};

/// Available public key algorithms.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PublicKeyAlgorithm {
    /// RSA (Encrypt and Sign)
    RSA = 1,

    #[num_enum(catch_all)]
    Other(u8),
}

/// RSA encryption of a session key, PKCS#1 v1.5 padded.
pub fn encrypt<R: CryptoRng + Rng>(
    rng: &mut R,
    key: &RsaPublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    key.encrypt(rng, Pkcs1v15Encrypt, plaintext)
        .context(EncryptionSnafu)
}

/// RSA decryption of a session key.
pub fn decrypt(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = key
        .decrypt(Pkcs1v15Encrypt, ciphertext)
        .context(EncryptionSnafu)?;
    Ok(Zeroizing::new(plaintext))
}

/// Signs a SHA-256 digest.
pub fn sign_digest(key: &RsaPrivateKey, digest: &[u8]) -> Result<Vec<u8>> {
    key.sign(Pkcs1v15Sign::new::<Sha256>(), digest)
        .context(SigningSnafu)
}

/// Verifies an RSA signature over a SHA-256 digest.
pub fn verify_digest(key: &RsaPublicKey, digest: &[u8], signature: &[u8]) -> Result<()> {
    key.verify(Pkcs1v15Sign::new::<Sha256>(), digest, signature)
        .map_err(|_| Error::SignatureVerification)
}
