use std::io;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::rsa::PublicKeyAlgorithm;
use crate::errors::{malformed, Result};
use crate::ser::Serialize;
use crate::types::{KeyId, Tag};

use super::{PacketTrait, SignatureType};

const ONE_PASS_VERSION: u8 = 3;

/// One-Pass Signature Packet: forward declaration preceding the literal
/// data, so a verifier can begin hashing before seeing the trailing
/// signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnePassSignature {
    typ: SignatureType,
    hash_algorithm: HashAlgorithm,
    pub_algorithm: PublicKeyAlgorithm,
    key_id: KeyId,
    /// Zero when another one-pass signature follows, one otherwise.
    last: u8,
}

impl OnePassSignature {
    pub fn v3(
        typ: SignatureType,
        hash_algorithm: HashAlgorithm,
        pub_algorithm: PublicKeyAlgorithm,
        key_id: KeyId,
    ) -> Self {
        OnePassSignature {
            typ,
            hash_algorithm,
            pub_algorithm,
            key_id,
            last: 1,
        }
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        if input.len() != 13 {
            malformed!("invalid one-pass signature packet length {}", input.len());
        }
        if input[0] != ONE_PASS_VERSION {
            malformed!("unsupported one-pass signature version {}", input[0]);
        }

        Ok(OnePassSignature {
            typ: SignatureType::from(input[1]),
            hash_algorithm: HashAlgorithm::from(input[2]),
            pub_algorithm: PublicKeyAlgorithm::from(input[3]),
            key_id: KeyId::from_slice(&input[4..12])?,
            last: input[12],
        })
    }

    pub fn typ(&self) -> SignatureType {
        self.typ
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn pub_algorithm(&self) -> PublicKeyAlgorithm {
        self.pub_algorithm
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }
}

impl Serialize for OnePassSignature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[
            ONE_PASS_VERSION,
            self.typ.into(),
            self.hash_algorithm.into(),
            self.pub_algorithm.into(),
        ])?;
        writer.write_all(self.key_id.as_ref())?;
        writer.write_all(&[self.last])?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        13
    }
}

impl PacketTrait for OnePassSignature {
    fn tag(&self) -> Tag {
        Tag::OnePassSignature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let ops = OnePassSignature::v3(
            SignatureType::Binary,
            HashAlgorithm::SHA2_256,
            PublicKeyAlgorithm::RSA,
            KeyId::from([9, 8, 7, 6, 5, 4, 3, 2]),
        );
        let bytes = ops.to_bytes().unwrap();
        assert_eq!(bytes.len(), ops.write_len());
        assert_eq!(OnePassSignature::from_slice(&bytes).unwrap(), ops);
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut bytes = OnePassSignature::v3(
            SignatureType::Binary,
            HashAlgorithm::SHA2_256,
            PublicKeyAlgorithm::RSA,
            KeyId::UNKNOWN,
        )
        .to_bytes()
        .unwrap();
        bytes[0] = 7;
        assert!(OnePassSignature::from_slice(&bytes).is_err());
    }
}
