use std::io;

use bytes::Bytes;

use crate::errors::Result;
use crate::ser::Serialize;
use crate::types::Tag;

use super::{
    CompressedData, LiteralData, Marker, OnePassSignature, PacketTrait,
    PublicKeyEncryptedSessionKey, Signature, SymEncryptedData, SymEncryptedProtectedData,
};

/// Sum of all packets this crate decodes.
///
/// Tags we do not know parse into `Unknown` so a stream can still be
/// walked; consumers decide whether to reject them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Marker(Marker),
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    Signature(Signature),
    OnePassSignature(OnePassSignature),
    CompressedData(CompressedData),
    SymEncryptedData(SymEncryptedData),
    LiteralData(LiteralData),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
    Unknown { tag: Tag, body: Bytes },
}

impl Packet {
    pub fn tag(&self) -> Tag {
        match self {
            Packet::Marker(_) => Tag::Marker,
            Packet::PublicKeyEncryptedSessionKey(_) => Tag::PublicKeyEncryptedSessionKey,
            Packet::Signature(_) => Tag::Signature,
            Packet::OnePassSignature(_) => Tag::OnePassSignature,
            Packet::CompressedData(_) => Tag::CompressedData,
            Packet::SymEncryptedData(_) => Tag::SymEncryptedData,
            Packet::LiteralData(_) => Tag::LiteralData,
            Packet::SymEncryptedProtectedData(_) => Tag::SymEncryptedProtectedData,
            Packet::Unknown { tag, .. } => *tag,
        }
    }
}

impl Serialize for Packet {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Packet::Marker(p) => p.to_writer(writer),
            Packet::PublicKeyEncryptedSessionKey(p) => p.to_writer(writer),
            Packet::Signature(p) => p.to_writer(writer),
            Packet::OnePassSignature(p) => p.to_writer(writer),
            Packet::CompressedData(p) => p.to_writer(writer),
            Packet::SymEncryptedData(p) => p.to_writer(writer),
            Packet::LiteralData(p) => p.to_writer(writer),
            Packet::SymEncryptedProtectedData(p) => p.to_writer(writer),
            Packet::Unknown { body, .. } => {
                writer.write_all(body)?;
                Ok(())
            }
        }
    }

    fn write_len(&self) -> usize {
        match self {
            Packet::Marker(p) => p.write_len(),
            Packet::PublicKeyEncryptedSessionKey(p) => p.write_len(),
            Packet::Signature(p) => p.write_len(),
            Packet::OnePassSignature(p) => p.write_len(),
            Packet::CompressedData(p) => p.write_len(),
            Packet::SymEncryptedData(p) => p.write_len(),
            Packet::LiteralData(p) => p.write_len(),
            Packet::SymEncryptedProtectedData(p) => p.write_len(),
            Packet::Unknown { body, .. } => body.len(),
        }
    }
}

impl PacketTrait for Packet {
    fn tag(&self) -> Tag {
        Packet::tag(self)
    }
}
