use num_enum::{FromPrimitive, IntoPrimitive};

/// Available compression algorithms.
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum CompressionAlgorithm {
    Uncompressed = 0,
    /// DEFLATE
    ZIP = 1,
    ZLIB = 2,

    #[num_enum(catch_all)]
    Other(u8),
}
