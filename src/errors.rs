use std::num::TryFromIntError;

use snafu::{Backtrace, Snafu};

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Error types
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The codec failed while framing a packet.
    #[snafu(display("could not construct packet: {message}"))]
    PacketConstruction { message: String },
    /// Wrong passphrase, or the secret key material is corrupt.
    #[snafu(display("could not unlock secret key"))]
    KeyUnlock,
    /// No key in the local keyring matches.
    #[snafu(display("no matching key in the local keyring"))]
    KeyNotFound,
    #[snafu(display("signing failed"))]
    Signing { source: rsa::errors::Error },
    #[snafu(display("encryption failed"))]
    Encryption { source: rsa::errors::Error },
    #[snafu(display("malformed message: {message}"))]
    MalformedMessage { message: String },
    /// The computed signature does not match the signature packet.
    /// Must never be downgraded to a warning.
    #[snafu(display("signature verification failed"))]
    SignatureVerification,
    /// The modification detection code does not match the decrypted data.
    #[snafu(display("integrity protection mismatch"))]
    IntegrityCheck,
    #[snafu(display("invalid armor wrappers"))]
    InvalidArmorWrappers,
    #[snafu(display("invalid crc24 checksum"))]
    InvalidChecksum,
    #[snafu(display("cfb: invalid key iv length"))]
    CfbInvalidKeyIvLength,
    /// Signals algorithms and parameters we don't support, but can safely reject.
    #[snafu(display("Unsupported: {message}"))]
    Unsupported { message: String },
    #[snafu(display("{message}"))]
    Message { message: String },
    #[snafu(transparent)]
    Base64Decode { source: base64::DecodeError },
    #[snafu(transparent)]
    RSAError { source: rsa::errors::Error },
    #[snafu(transparent)]
    IO {
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(transparent)]
    Utf8Error { source: std::str::Utf8Error },
    #[snafu(transparent)]
    TryFromInt { source: TryFromIntError },
}

impl From<cipher::InvalidLength> for Error {
    fn from(_: cipher::InvalidLength) -> Error {
        Error::CfbInvalidKeyIvLength
    }
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::Message { message: err }
    }
}

macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::Message { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Message { message: format!($fmt, $($arg)+) }
    };
}

macro_rules! malformed {
    ($e:expr) => {
        return Err($crate::errors::Error::MalformedMessage { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::MalformedMessage { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unsupported { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unsupported { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            $crate::errors::bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::errors::bail!($fmt, $($arg)+);
        }
    };
}

macro_rules! ensure_eq {
    ($left:expr, $right:expr, $($arg:tt)+) => {
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    $crate::errors::bail!(
                        "assertion failed: `(left == right)` left: `{:?}`, right: `{:?}`: {}",
                        left_val,
                        right_val,
                        format_args!($($arg)+)
                    );
                }
            }
        }
    };
}

pub(crate) use {bail, ensure, ensure_eq, format_err, malformed, unsupported_err};
