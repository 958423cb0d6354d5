//! # Packet module
//!
//! One struct per packet type, each with a `from_slice` parser and a
//! [`Serialize`] implementation, plus the [`Packet`] sum type and the
//! [`PacketParser`] that walks a raw byte stream.

use std::io;

use crate::errors::Result;
use crate::ser::Serialize;
use crate::types::{packet_header_len, write_packet_header, Tag};

mod compressed_data;
mod literal_data;
mod marker;
mod one_pass_signature;
mod packet_sum;
mod parser;
mod public_key_encrypted_session_key;
mod signature;
mod sym_encrypted_data;
mod sym_encrypted_protected_data;

pub use self::compressed_data::*;
pub use self::literal_data::*;
pub use self::marker::*;
pub use self::one_pass_signature::*;
pub use self::packet_sum::*;
pub use self::parser::*;
pub use self::public_key_encrypted_session_key::*;
pub use self::signature::*;
pub use self::sym_encrypted_data::*;
pub use self::sym_encrypted_protected_data::*;

pub trait PacketTrait: Serialize {
    fn tag(&self) -> Tag;

    fn to_writer_with_header<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet_header(writer, self.tag(), self.write_len())?;
        self.to_writer(writer)
    }

    fn write_len_with_header(&self) -> usize {
        packet_header_len(self.write_len()) + self.write_len()
    }
}
