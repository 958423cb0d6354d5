use bytes::Bytes;
use log::debug;

use crate::errors::{malformed, Result};
use crate::packet::{
    CompressedData, LiteralData, Marker, Mdc, OnePassSignature, Packet, PacketParser,
    PublicKeyEncryptedSessionKey, Signature, SymEncryptedData, SymEncryptedProtectedData,
};
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::types::Tag;

/// Encrypted Data: the body following the session key packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edata {
    SymEncryptedData(SymEncryptedData),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
}

impl Edata {
    pub fn tag(&self) -> Tag {
        match self {
            Edata::SymEncryptedData(_) => Tag::SymEncryptedData,
            Edata::SymEncryptedProtectedData(_) => Tag::SymEncryptedProtectedData,
        }
    }

    /// Whether the sender enabled integrity protection.
    pub fn is_integrity_protected(&self) -> bool {
        matches!(self, Edata::SymEncryptedProtectedData(_))
    }

    /// Decrypts the body. The detection code, when present, is returned for
    /// the deferred integrity check.
    pub fn decrypt(
        &self,
        alg: SymmetricKeyAlgorithm,
        session_key: &[u8],
    ) -> Result<(Vec<u8>, Option<Mdc>)> {
        match self {
            Edata::SymEncryptedData(p) => Ok((p.decrypt(alg, session_key)?, None)),
            Edata::SymEncryptedProtectedData(p) => {
                let (data, mdc) = p.decrypt(alg, session_key)?;
                Ok((data, Some(mdc)))
            }
        }
    }
}

/// A decoded object: one packet, except that consecutive session key
/// packets and the encrypted body that follows them group into a single
/// `Encrypted` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Marker(Marker),
    Encrypted {
        esk: Vec<PublicKeyEncryptedSessionKey>,
        edata: Edata,
    },
    Compressed(CompressedData),
    OnePassSignature(OnePassSignature),
    Literal(LiteralData),
    Signature(Signature),
    Unknown {
        tag: Tag,
        body: Bytes,
    },
}

impl Object {
    pub fn tag(&self) -> Tag {
        match self {
            Object::Marker(_) => Tag::Marker,
            Object::Encrypted { edata, .. } => edata.tag(),
            Object::Compressed(_) => Tag::CompressedData,
            Object::OnePassSignature(_) => Tag::OnePassSignature,
            Object::Literal(_) => Tag::LiteralData,
            Object::Signature(_) => Tag::Signature,
            Object::Unknown { tag, .. } => *tag,
        }
    }
}

/// Walks a packet stream, yielding one decoded object at a time.
#[derive(Debug)]
pub struct ObjectReader {
    packets: PacketParser,
}

impl ObjectReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        ObjectReader {
            packets: PacketParser::new(data),
        }
    }

    /// Decodes the next object, or `None` at the end of the stream.
    pub fn next_object(&mut self) -> Option<Result<Object>> {
        let packet = match self.packets.next()? {
            Ok(packet) => packet,
            Err(err) => return Some(Err(err)),
        };

        Some(self.object_from(packet))
    }

    fn object_from(&mut self, packet: Packet) -> Result<Object> {
        let object = match packet {
            Packet::Marker(p) => Object::Marker(p),
            Packet::CompressedData(p) => Object::Compressed(p),
            Packet::OnePassSignature(p) => Object::OnePassSignature(p),
            Packet::LiteralData(p) => Object::Literal(p),
            Packet::Signature(p) => Object::Signature(p),
            Packet::Unknown { tag, body } => Object::Unknown { tag, body },
            Packet::SymEncryptedData(p) => Object::Encrypted {
                esk: Vec::new(),
                edata: Edata::SymEncryptedData(p),
            },
            Packet::SymEncryptedProtectedData(p) => Object::Encrypted {
                esk: Vec::new(),
                edata: Edata::SymEncryptedProtectedData(p),
            },
            Packet::PublicKeyEncryptedSessionKey(first) => {
                let mut esk = vec![first];
                loop {
                    match self.packets.next() {
                        Some(Ok(Packet::PublicKeyEncryptedSessionKey(next))) => esk.push(next),
                        Some(Ok(Packet::SymEncryptedData(p))) => {
                            debug!("encrypted data list with {} recipients", esk.len());
                            return Ok(Object::Encrypted {
                                esk,
                                edata: Edata::SymEncryptedData(p),
                            });
                        }
                        Some(Ok(Packet::SymEncryptedProtectedData(p))) => {
                            debug!("encrypted data list with {} recipients", esk.len());
                            return Ok(Object::Encrypted {
                                esk,
                                edata: Edata::SymEncryptedProtectedData(p),
                            });
                        }
                        Some(Ok(other)) => {
                            malformed!(
                                "expected encrypted data after session keys, found {:?}",
                                other.tag()
                            );
                        }
                        Some(Err(err)) => return Err(err),
                        None => malformed!("encrypted session keys without encrypted data"),
                    }
                }
            }
        };
        Ok(object)
    }
}
