use std::hash::Hasher;

use base64::engine::{general_purpose, Engine as _};
use crc24::Crc24Hasher;
use log::debug;

use crate::errors::{Error, Result};

const BEGIN_PREFIX: &[u8] = b"-----BEGIN PGP ";

/// Checks whether the input looks like an armored block.
pub fn is_armored(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input[start..].starts_with(BEGIN_PREFIX)
}

/// Strips the armor from a message block, verifying the CRC-24 checksum
/// when present. Header lines are tolerated and skipped.
pub fn dearmor(input: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(input)?;
    let mut lines = text.lines().map(str::trim_end);

    // wrapper start
    let begin = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line,
            None => return Err(Error::InvalidArmorWrappers),
        }
    };
    let Some(block_name) = begin
        .strip_prefix("-----BEGIN ")
        .and_then(|r| r.strip_suffix("-----"))
    else {
        return Err(Error::InvalidArmorWrappers);
    };
    let end_line = format!("-----END {block_name}-----");

    let mut in_headers = true;
    let mut body = String::new();
    let mut crc_line = None;
    let mut saw_end = false;

    for line in lines {
        if in_headers {
            if line.trim().is_empty() {
                in_headers = false;
                continue;
            }
            if line.contains(':') {
                debug!("skipping armor header {:?}", line);
                continue;
            }
            // data without a blank separator line
            in_headers = false;
        }

        if line == end_line {
            saw_end = true;
            break;
        }
        if let Some(crc) = line.strip_prefix('=') {
            crc_line = Some(crc.to_string());
            continue;
        }
        body.push_str(line.trim());
    }

    if !saw_end {
        return Err(Error::InvalidArmorWrappers);
    }

    let data = general_purpose::STANDARD.decode(body)?;

    if let Some(crc_line) = crc_line {
        let crc_bytes = general_purpose::STANDARD.decode(crc_line)?;
        if crc_bytes.len() != 3 {
            return Err(Error::InvalidChecksum);
        }
        let expected = (u32::from(crc_bytes[0]) << 16)
            | (u32::from(crc_bytes[1]) << 8)
            | u32::from(crc_bytes[2]);

        let mut crc_hasher = Crc24Hasher::new();
        crc_hasher.write(&data);
        if crc_hasher.finish() as u32 != expected {
            return Err(Error::InvalidChecksum);
        }
    }

    Ok(data)
}
