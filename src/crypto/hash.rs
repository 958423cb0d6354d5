use num_enum::{FromPrimitive, IntoPrimitive};

/// Available hash algorithms.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HashAlgorithm {
    MD5 = 1,
    SHA1 = 2,
    RIPEMD160 = 3,
    SHA2_256 = 8,
    SHA2_384 = 9,
    SHA2_512 = 10,
    SHA2_224 = 11,

    #[num_enum(catch_all)]
    Other(u8),
}

impl HashAlgorithm {
    /// Digest size in bytes.
    pub fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::MD5 => 16,
            HashAlgorithm::SHA1 | HashAlgorithm::RIPEMD160 => 20,
            HashAlgorithm::SHA2_224 => 28,
            HashAlgorithm::SHA2_256 => 32,
            HashAlgorithm::SHA2_384 => 48,
            HashAlgorithm::SHA2_512 => 64,
            HashAlgorithm::Other(_) => 0,
        }
    }
}
