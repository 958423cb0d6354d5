use std::io::{self, Read, Write};

use bytes::Bytes;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;

use crate::errors::{ensure, malformed, unsupported_err, Result};
use crate::ser::Serialize;
use crate::types::{CompressionAlgorithm, Tag};

use super::PacketTrait;

/// Upper bound on a decompressed stream, to keep hostile input from
/// ballooning in memory.
const MAX_DECOMPRESSED_SIZE: u64 = 1024 * 1024 * 1024;

/// Compressed Data Packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    compression_algorithm: CompressionAlgorithm,
    compressed_data: Bytes,
}

impl CompressedData {
    pub fn from_compressed(alg: CompressionAlgorithm, data: impl Into<Bytes>) -> Self {
        CompressedData {
            compression_algorithm: alg,
            compressed_data: data.into(),
        }
    }

    /// Compresses `payload` into a new packet.
    pub fn compress(alg: CompressionAlgorithm, payload: &[u8]) -> Result<Self> {
        let data = match alg {
            CompressionAlgorithm::Uncompressed => payload.to_vec(),
            CompressionAlgorithm::ZIP => {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(payload)?;
                enc.finish()?
            }
            CompressionAlgorithm::ZLIB => {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(payload)?;
                enc.finish()?
            }
            CompressionAlgorithm::Other(code) => {
                unsupported_err!("compression algorithm {}", code)
            }
        };

        Ok(CompressedData::from_compressed(alg, data))
    }

    pub fn from_slice(input: &[u8]) -> Result<Self> {
        let Some((&alg, rest)) = input.split_first() else {
            malformed!("compressed data packet is empty");
        };
        Ok(CompressedData {
            compression_algorithm: CompressionAlgorithm::from(alg),
            compressed_data: Bytes::copy_from_slice(rest),
        })
    }

    pub fn compression_algorithm(&self) -> CompressionAlgorithm {
        self.compression_algorithm
    }

    /// Decompresses the packet body.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self.compression_algorithm {
            CompressionAlgorithm::Uncompressed => out.extend_from_slice(&self.compressed_data),
            CompressionAlgorithm::ZIP => {
                DeflateDecoder::new(&self.compressed_data[..])
                    .take(MAX_DECOMPRESSED_SIZE)
                    .read_to_end(&mut out)?;
            }
            CompressionAlgorithm::ZLIB => {
                ZlibDecoder::new(&self.compressed_data[..])
                    .take(MAX_DECOMPRESSED_SIZE)
                    .read_to_end(&mut out)?;
            }
            CompressionAlgorithm::Other(code) => {
                unsupported_err!("compression algorithm {}", code)
            }
        }
        ensure!(
            (out.len() as u64) < MAX_DECOMPRESSED_SIZE,
            "decompressed stream exceeds the size limit"
        );
        Ok(out)
    }
}

impl Serialize for CompressedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[u8::from(self.compression_algorithm)])?;
        writer.write_all(&self.compressed_data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + self.compressed_data.len()
    }
}

impl PacketTrait for CompressedData {
    fn tag(&self) -> Tag {
        Tag::CompressedData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_roundtrip() {
        let payload = b"hello hello hello hello hello".repeat(10);
        let packet = CompressedData::compress(CompressionAlgorithm::ZIP, &payload).unwrap();
        assert!(packet.write_len() < payload.len());
        assert_eq!(packet.decompress().unwrap(), payload);
    }

    #[test]
    fn zlib_roundtrip() {
        let payload = b"abcabcabc".repeat(100);
        let packet = CompressedData::compress(CompressionAlgorithm::ZLIB, &payload).unwrap();
        assert_eq!(packet.decompress().unwrap(), payload);
    }

    #[test]
    fn wire_roundtrip() {
        let packet = CompressedData::compress(CompressionAlgorithm::ZIP, b"payload").unwrap();
        let parsed = CompressedData::from_slice(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let packet = CompressedData::from_compressed(CompressionAlgorithm::Other(42), &b"x"[..]);
        assert!(packet.decompress().is_err());
    }
}
