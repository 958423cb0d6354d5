use bytes::{Buf, Bytes};
use log::debug;

use crate::errors::{Error, Result};
use crate::types::{read_packet_header, Tag};

use super::{
    CompressedData, LiteralData, Marker, OnePassSignature, Packet,
    PublicKeyEncryptedSessionKey, Signature, SymEncryptedData, SymEncryptedProtectedData,
};

/// Iterator over the packets of a raw byte stream.
///
/// Stops after the first error; a broken header leaves no way to resync.
#[derive(Debug)]
pub struct PacketParser {
    data: Bytes,
}

impl PacketParser {
    pub fn new(data: impl Into<Bytes>) -> Self {
        PacketParser { data: data.into() }
    }

    pub fn is_done(&self) -> bool {
        self.data.is_empty()
    }
}

impl Iterator for PacketParser {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let (header, consumed) = match read_packet_header(&self.data) {
            Ok(v) => v,
            Err(err) => {
                self.data.clear();
                return Some(Err(err));
            }
        };
        if self.data.len() < consumed + header.len {
            self.data.clear();
            return Some(Err(Error::MalformedMessage {
                message: format!("packet body for {:?} is truncated", header.tag),
            }));
        }

        self.data.advance(consumed);
        let body = self.data.split_to(header.len);
        debug!("packet {:?} ({} bytes)", header.tag, header.len);

        let packet = parse_body(header.tag, body);
        if packet.is_err() {
            self.data.clear();
        }
        Some(packet)
    }
}

fn parse_body(tag: Tag, body: Bytes) -> Result<Packet> {
    let packet = match tag {
        Tag::Marker => Packet::Marker(Marker::from_slice(&body)?),
        Tag::PublicKeyEncryptedSessionKey => Packet::PublicKeyEncryptedSessionKey(
            PublicKeyEncryptedSessionKey::from_slice(&body)?,
        ),
        Tag::Signature => Packet::Signature(Signature::from_slice(&body)?),
        Tag::OnePassSignature => Packet::OnePassSignature(OnePassSignature::from_slice(&body)?),
        Tag::CompressedData => Packet::CompressedData(CompressedData::from_slice(&body)?),
        Tag::SymEncryptedData => Packet::SymEncryptedData(SymEncryptedData::from_slice(&body)?),
        Tag::LiteralData => Packet::LiteralData(LiteralData::from_slice(&body)?),
        Tag::SymEncryptedProtectedData => {
            Packet::SymEncryptedProtectedData(SymEncryptedProtectedData::from_slice(&body)?)
        }
        Tag::Other(_) => Packet::Unknown { tag, body },
    };
    Ok(packet)
}
