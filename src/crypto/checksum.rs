use crate::errors::{malformed, Result};

/// Simple 16-bit additive checksum over session key material.
pub fn calculate(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |acc, byte| acc.wrapping_add(u16::from(*byte)))
}

pub fn verify(data: &[u8], expected: u16) -> Result<()> {
    if calculate(data) != expected {
        malformed!("session key checksum mismatch");
    }
    Ok(())
}
