use std::io;

use crate::errors::{malformed, Result};
use crate::ser::Serialize;
use crate::types::Tag;

use super::PacketTrait;

const MARKER: &[u8; 3] = b"PGP";

/// Marker Packet. Carries the fixed contents `PGP` and is skipped on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker;

impl Marker {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        if input != MARKER {
            malformed!("invalid marker packet contents");
        }
        Ok(Marker)
    }
}

impl Serialize for Marker {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(MARKER)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        MARKER.len()
    }
}

impl PacketTrait for Marker {
    fn tag(&self) -> Tag {
        Tag::Marker
    }
}
