use std::io;

use bytes::Bytes;
use chrono::{SubsecRound, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::{malformed, Result};
use crate::ser::Serialize;
use crate::types::Tag;

use super::PacketTrait;

#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DataMode {
    Binary = b'b',
    Text = b't',
    Utf8 = b'u',

    #[num_enum(catch_all)]
    Other(u8),
}

/// Literal Data Packet: the innermost packet carrying the actual message
/// bytes plus file name and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralData {
    mode: DataMode,
    file_name: Bytes,
    /// Seconds since the epoch.
    created: u32,
    data: Bytes,
}

impl LiteralData {
    /// Creates a binary literal packet stamped with the current time.
    pub fn from_bytes(file_name: impl Into<Bytes>, data: impl Into<Bytes>) -> Self {
        let created = u32::try_from(Utc::now().trunc_subsecs(0).timestamp()).unwrap_or_default();
        LiteralData {
            mode: DataMode::Binary,
            file_name: file_name.into(),
            created,
            data: data.into(),
        }
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        if input.len() < 2 {
            malformed!("literal data packet is too short");
        }
        let mode = DataMode::from(input[0]);
        let name_len = input[1] as usize;
        if input.len() < 2 + name_len + 4 {
            malformed!("literal data packet is truncated");
        }
        let file_name = Bytes::copy_from_slice(&input[2..2 + name_len]);
        let ts = &input[2 + name_len..2 + name_len + 4];
        let created = u32::from_be_bytes([ts[0], ts[1], ts[2], ts[3]]);
        let data = Bytes::copy_from_slice(&input[2 + name_len + 4..]);

        Ok(LiteralData {
            mode,
            file_name,
            created,
            data,
        })
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn file_name(&self) -> String {
        String::from_utf8_lossy(&self.file_name).into_owned()
    }

    pub fn created(&self) -> u32 {
        self.created
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}

impl Serialize for LiteralData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[u8::from(self.mode), u8::try_from(self.file_name.len())?])?;
        writer.write_all(&self.file_name)?;
        writer.write_all(&self.created.to_be_bytes())?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        2 + self.file_name.len() + 4 + self.data.len()
    }
}

impl PacketTrait for LiteralData {
    fn tag(&self) -> Tag {
        Tag::LiteralData
    }
}
