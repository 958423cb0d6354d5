use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::{malformed, Result};

/// Packet tags, following the RFC 4880 numbering.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    /// Public-Key Encrypted Session Key Packet
    PublicKeyEncryptedSessionKey = 1,
    /// Signature Packet
    Signature = 2,
    /// One-Pass Signature Packet
    OnePassSignature = 4,
    /// Compressed Data Packet
    CompressedData = 8,
    /// Symmetrically Encrypted Data Packet
    SymEncryptedData = 9,
    /// Marker Packet
    Marker = 10,
    /// Literal Data Packet
    LiteralData = 11,
    /// Sym. Encrypted and Integrity Protected Data Packet
    SymEncryptedProtectedData = 18,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Tag {
    /// Packet Type ID encoded in the new OpenPGP format
    /// (bits 7 and 6 set, bits 5-0 carry the packet type ID).
    pub fn encode(self) -> u8 {
        0b1100_0000 | (u8::from(self) & 0b0011_1111)
    }
}

/// Decoded packet header: tag plus body length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub tag: Tag,
    pub len: usize,
}

/// Writes a packet header in new format with a fixed-size length.
pub fn write_packet_header<W: io::Write>(writer: &mut W, tag: Tag, len: usize) -> Result<()> {
    writer.write_u8(tag.encode())?;
    if len < 192 {
        writer.write_u8(len as u8)?;
    } else if len < 8384 {
        let val = len - 192;
        writer.write_u8((val >> 8) as u8 + 192)?;
        writer.write_u8((val & 0xFF) as u8)?;
    } else {
        writer.write_u8(0xFF)?;
        writer.write_u32::<BigEndian>(u32::try_from(len)?)?;
    }
    Ok(())
}

/// Number of octets `write_packet_header` emits for a body of `len` octets.
pub fn packet_header_len(len: usize) -> usize {
    if len < 192 {
        2
    } else if len < 8384 {
        3
    } else {
        6
    }
}

/// Reads a packet header from the start of `data`.
///
/// Returns the header and the number of octets it occupied. Partial body
/// lengths are not part of this framing and are rejected.
pub fn read_packet_header(data: &[u8]) -> Result<(PacketHeader, usize)> {
    let Some(&first) = data.first() else {
        malformed!("missing packet header");
    };
    if first & 0b1100_0000 != 0b1100_0000 {
        malformed!("invalid packet header octet {:#04x}", first);
    }
    let tag = Tag::from(first & 0b0011_1111);

    let Some(&olen) = data.get(1) else {
        malformed!("missing packet length");
    };
    let (len, consumed) = match olen {
        0..=191 => (olen as usize, 2),
        192..=223 => {
            let Some(&second) = data.get(2) else {
                malformed!("truncated two-octet packet length");
            };
            ((((olen as usize) - 192) << 8) + second as usize + 192, 3)
        }
        255 => {
            let Some(raw) = data.get(2..6) else {
                malformed!("truncated five-octet packet length");
            };
            let len = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
            (usize::try_from(len)?, 6)
        }
        _ => malformed!("partial packet lengths are not supported"),
    };

    Ok((PacketHeader { tag, len }, consumed))
}
