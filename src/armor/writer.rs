use std::collections::BTreeMap;
use std::hash::Hasher;
use std::io::Write;

use base64::engine::{general_purpose, Engine as _};
use crc24::Crc24Hasher;

use crate::armor::BlockType;
use crate::errors::Result;

const LINE_LENGTH: usize = 64;

pub fn write(
    data: &[u8],
    typ: BlockType,
    writer: &mut impl Write,
    headers: Option<&BTreeMap<String, String>>,
    include_checksum: bool,
) -> Result<()> {
    // armor header
    writeln!(writer, "-----BEGIN {typ}-----")?;

    if let Some(headers) = headers {
        for (key, value) in headers.iter() {
            writeln!(writer, "{key}: {value}")?;
        }
    }
    writeln!(writer)?;

    // body
    let encoded = general_purpose::STANDARD.encode(data);
    for chunk in encoded.as_bytes().chunks(LINE_LENGTH) {
        writer.write_all(chunk)?;
        writeln!(writer)?;
    }

    // crc
    if include_checksum {
        let mut crc_hasher = Crc24Hasher::new();
        crc_hasher.write(data);
        let crc = crc_hasher.finish() as u32;
        let crc_buf = [(crc >> 16) as u8, (crc >> 8) as u8, crc as u8];
        writeln!(writer, "={}", general_purpose::STANDARD.encode(crc_buf))?;
    }

    // footer
    writeln!(writer, "-----END {typ}-----")?;

    Ok(())
}

/// Armors a message block with the standard `Version` header.
pub fn armor_message(data: &[u8]) -> Result<Vec<u8>> {
    let headers = BTreeMap::from([(
        "Version".to_string(),
        concat!("pgp-courier ", env!("CARGO_PKG_VERSION")).to_string(),
    )]);

    let mut out = Vec::new();
    write(data, BlockType::Message, &mut out, Some(&headers), true)?;
    Ok(out)
}
