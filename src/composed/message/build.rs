use bytes::Bytes;
use log::debug;
use rand::{CryptoRng, Rng};
use smallvec::smallvec;

use crate::armor;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::provider::Provider;
use crate::crypto::rsa::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, Error, Result};
use crate::keyring::{PublicKey, SecretKey};
use crate::packet::{
    CompressedData, LiteralData, OnePassSignature, PacketTrait, PublicKeyEncryptedSessionKey,
    SignatureConfig, SignatureType, SymEncryptedProtectedData,
};
use crate::types::{CompressionAlgorithm, Password};

/// File name placeholder stored in literal packets.
const LITERAL_FILE_NAME: &str = "message";

fn framing(err: Error) -> Error {
    Error::PacketConstruction {
        message: err.to_string(),
    }
}

/// Re-frames the payload as a literal data packet.
pub(crate) fn wrap_literal(message: &[u8]) -> Result<Vec<u8>> {
    let literal = LiteralData::from_bytes(LITERAL_FILE_NAME, Bytes::copy_from_slice(message));

    let mut out = Vec::with_capacity(literal.write_len_with_header());
    literal.to_writer_with_header(&mut out).map_err(framing)?;
    Ok(out)
}

/// Brackets the payload between a one-pass signature header and the
/// signature trailer: `one-pass header || literal packet || signature`.
///
/// The literal wrap happens in here; callers must pass the raw payload.
/// The signature hash covers the raw payload, not the literal framing.
pub(crate) fn sign_bracket(
    message: &[u8],
    sender_secret_key: &SecretKey,
    passphrase: &Password,
) -> Result<Vec<u8>> {
    let unlocked = sender_secret_key.unlock(passphrase)?;

    let signer_user_id = sender_secret_key
        .public_key()
        .primary_user_id()
        .unwrap_or_default();

    let mut config = SignatureConfig::v4(
        SignatureType::Binary,
        PublicKeyAlgorithm::RSA,
        HashAlgorithm::SHA2_256,
    );
    config.key_id = *sender_secret_key.key_id();
    config.signer_user_id = Bytes::copy_from_slice(signer_user_id.as_bytes());
    config.preferred_hash_algorithms = smallvec![HashAlgorithm::SHA2_256];
    config.preferred_symmetric_algorithms =
        smallvec![SymmetricKeyAlgorithm::AES256, SymmetricKeyAlgorithm::AES128];
    config.preferred_compression_algorithms = smallvec![CompressionAlgorithm::ZIP];

    let ops = OnePassSignature::v3(
        SignatureType::Binary,
        HashAlgorithm::SHA2_256,
        PublicKeyAlgorithm::RSA,
        *sender_secret_key.key_id(),
    );

    let literal = wrap_literal(message)?;
    let signature = config.sign(unlocked.rsa(), message)?;

    let mut out = Vec::with_capacity(
        ops.write_len_with_header() + literal.len() + signature.write_len_with_header(),
    );
    ops.to_writer_with_header(&mut out).map_err(framing)?;
    out.extend_from_slice(&literal);
    signature.to_writer_with_header(&mut out).map_err(framing)?;

    Ok(out)
}

/// Wraps the payload in a single ZIP compressed data packet.
pub(crate) fn wrap_compressed(message: &[u8]) -> Result<Vec<u8>> {
    let packet = CompressedData::compress(CompressionAlgorithm::ZIP, message).map_err(framing)?;

    let mut out = Vec::with_capacity(packet.write_len_with_header());
    packet.to_writer_with_header(&mut out).map_err(framing)?;
    Ok(out)
}

/// Encrypts the payload to a single recipient: session key packet followed
/// by the integrity protected body. Integrity protection is always on.
pub(crate) fn wrap_encrypted<R: Rng + CryptoRng>(
    rng: &mut R,
    message: &[u8],
    receiver_public_key: &PublicKey,
    algorithm: SymmetricKeyAlgorithm,
) -> Result<Vec<u8>> {
    let session_key = algorithm.new_session_key(rng);

    let esk = PublicKeyEncryptedSessionKey::from_session_key(
        rng,
        &session_key,
        algorithm,
        *receiver_public_key.key_id(),
        receiver_public_key.rsa(),
    )?;
    let edata = SymEncryptedProtectedData::encrypt(rng, algorithm, &session_key, message)?;

    let mut out =
        Vec::with_capacity(esk.write_len_with_header() + edata.write_len_with_header());
    esk.to_writer_with_header(&mut out).map_err(framing)?;
    edata.to_writer_with_header(&mut out).map_err(framing)?;

    Ok(out)
}

/// Composes an outbound message from the fixed stage order: literal wrap or
/// signature bracket, then compression, then encryption, then armor.
///
/// The first failing stage aborts the whole composition; partial output is
/// never returned.
#[allow(clippy::too_many_arguments)]
pub fn compose<R: Rng + CryptoRng>(
    mut rng: R,
    message: &[u8],
    sender_secret_key: Option<&SecretKey>,
    receiver_public_key: Option<&PublicKey>,
    algorithm: SymmetricKeyAlgorithm,
    passphrase: &Password,
    add_signature: bool,
    add_compression: bool,
    add_armor: bool,
) -> Result<Vec<u8>> {
    Provider::global();

    // the literal wrap and the signature bracket are mutually exclusive;
    // the bracket wraps the literal packet itself
    let mut out = if add_signature {
        let Some(key) = sender_secret_key else {
            bail!("signing requested without a sender secret key");
        };
        debug!("signing with key {}", key.key_id());
        sign_bracket(message, key, passphrase)?
    } else {
        wrap_literal(message)?
    };

    if add_compression {
        debug!("compressing {} bytes", out.len());
        out = wrap_compressed(&out)?;
    }

    if algorithm != SymmetricKeyAlgorithm::Plaintext {
        let Some(key) = receiver_public_key else {
            bail!("encryption requested without a recipient public key");
        };
        debug!(
            "encrypting to key {} with {}",
            key.key_id(),
            algorithm.display_name()
        );
        out = wrap_encrypted(&mut rng, &out, key, algorithm)?;
    }

    if add_armor {
        out = armor::armor_message(&out)?;
    }

    Ok(out)
}
