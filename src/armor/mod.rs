//! ASCII Armor: a reversible, text-safe transport encoding for packet
//! streams (base64 body, CRC-24 checksum, `BEGIN`/`END` wrapper lines).

mod reader;
mod writer;

pub use self::reader::*;
pub use self::writer::*;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Message,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Message => write!(f, "PGP MESSAGE"),
        }
    }
}
