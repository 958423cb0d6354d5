use std::io;

use bytes::Bytes;
use chrono::{SubsecRound, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::rsa::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{malformed, unsupported_err, Result};
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, KeyId, Tag};

use super::{OnePassSignature, PacketTrait};

#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature over a binary document.
    Binary = 0x00,
    /// Signature over a canonical text document.
    Text = 0x01,

    #[num_enum(catch_all)]
    Other(u8),
}

const SIGNATURE_VERSION: u8 = 4;

/// Everything a signature carries except the signature value itself.
///
/// The fields after the key id form the hashed metadata area: they are
/// covered by the signature hash. The preference lists are advisory hints
/// for recipients, not enforced locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    pub typ: SignatureType,
    pub pub_algorithm: PublicKeyAlgorithm,
    pub hash_algorithm: HashAlgorithm,
    pub key_id: KeyId,
    /// Creation time, seconds since the epoch.
    pub created: u32,
    pub signer_user_id: Bytes,
    pub preferred_hash_algorithms: SmallVec<[HashAlgorithm; 4]>,
    pub preferred_symmetric_algorithms: SmallVec<[SymmetricKeyAlgorithm; 4]>,
    pub preferred_compression_algorithms: SmallVec<[CompressionAlgorithm; 4]>,
}

impl SignatureConfig {
    pub fn v4(
        typ: SignatureType,
        pub_algorithm: PublicKeyAlgorithm,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        let created = u32::try_from(Utc::now().trunc_subsecs(0).timestamp()).unwrap_or_default();
        SignatureConfig {
            typ,
            pub_algorithm,
            hash_algorithm,
            key_id: KeyId::UNKNOWN,
            created,
            signer_user_id: Bytes::new(),
            preferred_hash_algorithms: SmallVec::new(),
            preferred_symmetric_algorithms: SmallVec::new(),
            preferred_compression_algorithms: SmallVec::new(),
        }
    }

    /// Serialized hashed metadata area, covered by the signature hash.
    pub fn hashed_area(&self) -> Result<Vec<u8>> {
        let mut area = Vec::with_capacity(16 + self.signer_user_id.len());
        area.extend_from_slice(&self.created.to_be_bytes());
        area.extend_from_slice(&u16::try_from(self.signer_user_id.len())?.to_be_bytes());
        area.extend_from_slice(&self.signer_user_id);
        area.push(u8::try_from(self.preferred_hash_algorithms.len())?);
        area.extend(self.preferred_hash_algorithms.iter().map(|a| u8::from(*a)));
        area.push(u8::try_from(self.preferred_symmetric_algorithms.len())?);
        area.extend(
            self.preferred_symmetric_algorithms
                .iter()
                .map(|a| u8::from(*a)),
        );
        area.push(u8::try_from(self.preferred_compression_algorithms.len())?);
        area.extend(
            self.preferred_compression_algorithms
                .iter()
                .map(|a| u8::from(*a)),
        );
        Ok(area)
    }

    /// Hash over the raw data being signed plus the hashed metadata area.
    fn digest(&self, data: &[u8]) -> Result<Vec<u8>> {
        if self.hash_algorithm != HashAlgorithm::SHA2_256 {
            unsupported_err!("hash algorithm {:?}", self.hash_algorithm);
        }
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.update(self.hashed_area()?);
        Ok(hasher.finalize().to_vec())
    }

    /// Signs `data` with the unlocked secret key.
    pub fn sign(self, key: &RsaPrivateKey, data: &[u8]) -> Result<Signature> {
        let digest = self.digest(data)?;
        let signature = crate::crypto::rsa::sign_digest(key, &digest)?;

        Ok(Signature {
            config: self,
            signature: signature.into(),
        })
    }
}

/// Signature Packet: the trailer following the literal data, carrying the
/// actual signature value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    config: SignatureConfig,
    signature: Bytes,
}

impl Signature {
    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    pub fn key_id(&self) -> &KeyId {
        &self.config.key_id
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Verifies this signature over `data` with the signer's public key.
    pub fn verify(&self, key: &RsaPublicKey, data: &[u8]) -> Result<()> {
        let digest = self.config.digest(data)?;
        crate::crypto::rsa::verify_digest(key, &digest, &self.signature)
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(input);

        let version = cursor.u8()?;
        if version != SIGNATURE_VERSION {
            malformed!("unsupported signature version {}", version);
        }
        let typ = SignatureType::from(cursor.u8()?);
        let pub_algorithm = PublicKeyAlgorithm::from(cursor.u8()?);
        let hash_algorithm = HashAlgorithm::from(cursor.u8()?);
        let key_id = KeyId::from_slice(cursor.take(8)?)?;
        let created = cursor.u32()?;
        let uid_len = cursor.u16()? as usize;
        let signer_user_id = Bytes::copy_from_slice(cursor.take(uid_len)?);

        let mut preferred_hash_algorithms = SmallVec::new();
        for _ in 0..cursor.u8()? {
            preferred_hash_algorithms.push(HashAlgorithm::from(cursor.u8()?));
        }
        let mut preferred_symmetric_algorithms = SmallVec::new();
        for _ in 0..cursor.u8()? {
            preferred_symmetric_algorithms.push(SymmetricKeyAlgorithm::from(cursor.u8()?));
        }
        let mut preferred_compression_algorithms = SmallVec::new();
        for _ in 0..cursor.u8()? {
            preferred_compression_algorithms.push(CompressionAlgorithm::from(cursor.u8()?));
        }

        let sig_len = cursor.u16()? as usize;
        let signature = Bytes::copy_from_slice(cursor.take(sig_len)?);
        cursor.finish()?;

        Ok(Signature {
            config: SignatureConfig {
                typ,
                pub_algorithm,
                hash_algorithm,
                key_id,
                created,
                signer_user_id,
                preferred_hash_algorithms,
                preferred_symmetric_algorithms,
                preferred_compression_algorithms,
            },
            signature,
        })
    }
}

impl Serialize for Signature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let config = &self.config;
        writer.write_all(&[
            SIGNATURE_VERSION,
            config.typ.into(),
            config.pub_algorithm.into(),
            config.hash_algorithm.into(),
        ])?;
        writer.write_all(config.key_id.as_ref())?;
        writer.write_all(&config.hashed_area()?)?;
        writer.write_all(&u16::try_from(self.signature.len())?.to_be_bytes())?;
        writer.write_all(&self.signature)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        let config = &self.config;
        4 + 8
            + 4
            + 2
            + config.signer_user_id.len()
            + 3
            + config.preferred_hash_algorithms.len()
            + config.preferred_symmetric_algorithms.len()
            + config.preferred_compression_algorithms.len()
            + 2
            + self.signature.len()
    }
}

impl PacketTrait for Signature {
    fn tag(&self) -> Tag {
        Tag::Signature
    }
}

/// Incremental verifier seeded from a one-pass signature header.
///
/// Feed it the literal data as it is extracted, then check the trailing
/// signature packet against the accumulated hash.
pub struct OnePassVerifier {
    hasher: Sha256,
    key: RsaPublicKey,
}

impl OnePassVerifier {
    pub fn new(ops: &OnePassSignature, key: RsaPublicKey) -> Result<Self> {
        if ops.hash_algorithm() != HashAlgorithm::SHA2_256 {
            unsupported_err!("hash algorithm {:?}", ops.hash_algorithm());
        }
        Ok(OnePassVerifier {
            hasher: Sha256::new(),
            key,
        })
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Compares the accumulated hash against the signature trailer.
    pub fn verify(self, signature: &Signature) -> Result<()> {
        let mut hasher = self.hasher;
        hasher.update(signature.config.hashed_area()?);
        crate::crypto::rsa::verify_digest(&self.key, &hasher.finalize(), &signature.signature)
    }
}

/// Bounds-checked slice reader for packet bodies.
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a [u8]) -> Self {
        Cursor { input, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(out) = self.input.get(self.pos..self.pos + len) else {
            malformed!("packet body is truncated");
        };
        self.pos += len;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn finish(self) -> Result<()> {
        if self.pos != self.input.len() {
            malformed!("trailing bytes after packet body");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use smallvec::smallvec;

    fn test_config(key_id: KeyId) -> SignatureConfig {
        let mut config = SignatureConfig::v4(
            SignatureType::Binary,
            PublicKeyAlgorithm::RSA,
            HashAlgorithm::SHA2_256,
        );
        config.key_id = key_id;
        config.signer_user_id = Bytes::from_static(b"Alice <alice@example.com>");
        config.preferred_hash_algorithms = smallvec![HashAlgorithm::SHA2_256];
        config.preferred_symmetric_algorithms =
            smallvec![SymmetricKeyAlgorithm::AES256, SymmetricKeyAlgorithm::AES128];
        config.preferred_compression_algorithms = smallvec![CompressionAlgorithm::ZIP];
        config
    }

    #[test]
    fn sign_verify_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let secret = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&secret);

        let key_id = KeyId::from([1, 2, 3, 4, 5, 6, 7, 8]);
        let signature = test_config(key_id).sign(&secret, b"signed payload").unwrap();

        signature.verify(&public, b"signed payload").unwrap();
        assert!(signature.verify(&public, b"signed payloaX").is_err());
    }

    #[test]
    fn wire_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let secret = RsaPrivateKey::new(&mut rng, 2048).unwrap();

        let key_id = KeyId::from([8, 7, 6, 5, 4, 3, 2, 1]);
        let signature = test_config(key_id).sign(&secret, b"data").unwrap();

        let bytes = signature.to_bytes().unwrap();
        assert_eq!(bytes.len(), signature.write_len());
        let parsed = Signature::from_slice(&bytes).unwrap();
        assert_eq!(parsed, signature);
    }

    #[test]
    fn one_pass_verifier_matches_direct_verification() {
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        let secret = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&secret);

        let key_id = KeyId::from([1; 8]);
        let signature = test_config(key_id).sign(&secret, b"streamed data").unwrap();

        let ops = OnePassSignature::v3(
            SignatureType::Binary,
            HashAlgorithm::SHA2_256,
            PublicKeyAlgorithm::RSA,
            key_id,
        );
        let mut verifier = OnePassVerifier::new(&ops, public).unwrap();
        verifier.update(b"streamed ");
        verifier.update(b"data");
        verifier.verify(&signature).unwrap();
    }
}
