use bytes::Bytes;
use log::{debug, warn};

use crate::armor;
use crate::crypto::provider::Provider;
use crate::errors::{malformed, Error, Result};
use crate::keyring::KeyStore;
use crate::packet::{Mdc, OnePassVerifier};
use crate::types::{KeyId, Password};

use super::{MessageEnvelope, Object, ObjectReader};

/// Working state for one decode run.
///
/// Owned by the run and dropped at its end; each stage hands it to the
/// next, forward only.
struct DecryptionState {
    objects: ObjectReader,
    current: Option<Object>,
    /// Detection code captured while decrypting, checked after the literal
    /// data has been extracted.
    mdc: Option<Mdc>,
    pending_verification: Option<PendingVerification>,
}

/// Set once a one-pass signature header has been seen.
struct PendingVerification {
    verifier: OnePassVerifier,
    signer_key_id: KeyId,
}

fn strip_armor(envelope: &mut MessageEnvelope) -> Result<Bytes> {
    if armor::is_armored(&envelope.encrypted_message) {
        debug!("removing transport encoding");
        envelope.is_armored = true;
        return Ok(armor::dearmor(&envelope.encrypted_message)?.into());
    }
    Ok(envelope.encrypted_message.clone())
}

/// Reads the first object, skipping at most one leading marker packet.
fn read_first_object(objects: &mut ObjectReader) -> Result<Object> {
    let Some(first) = objects.next_object().transpose()? else {
        malformed!("message contains no packets");
    };
    if let Object::Marker(_) = first {
        debug!("skipping marker packet");
        let Some(second) = objects.next_object().transpose()? else {
            malformed!("message contains only a marker packet");
        };
        return Ok(second);
    }
    Ok(first)
}

/// Probes the envelope without a passphrase.
///
/// Classifies transport encoding and encryption. For an encrypted message
/// this records which recipient key the local keyring can unlock, so the
/// caller knows which passphrase to ask for; decryption is never attempted.
/// Unencrypted messages are fully decoded instead, since they need no
/// passphrase.
pub fn inspect_envelope<S: KeyStore>(envelope: &mut MessageEnvelope, keys: &S) -> Result<()> {
    Provider::global();
    envelope.reset_decode_state();

    let data = strip_armor(envelope)?;
    let mut objects = ObjectReader::new(data);
    let first = read_first_object(&mut objects)?;

    match first {
        Object::Encrypted { esk, .. } => {
            envelope.is_encrypted = true;
            for pkesk in &esk {
                if keys.find_secret_key(pkesk.key_id()).is_some() {
                    envelope.receiver_key_id = *pkesk.key_id();
                    break;
                }
            }
            debug!(
                "encrypted for {} recipients, local key {}",
                esk.len(),
                envelope.receiver_key_id
            );
            Ok(())
        }
        first => decode_stream(envelope, keys, &Password::empty(), first, objects),
    }
}

/// Fully decodes the envelope, decrypting and verifying where the layers
/// call for it.
pub fn decrypt_and_verify<S: KeyStore>(
    envelope: &mut MessageEnvelope,
    keys: &S,
    passphrase: &Password,
) -> Result<()> {
    Provider::global();
    envelope.reset_decode_state();

    let data = strip_armor(envelope)?;
    let mut objects = ObjectReader::new(data);
    let first = read_first_object(&mut objects)?;

    decode_stream(envelope, keys, passphrase, first, objects)
}

fn decode_stream<S: KeyStore>(
    envelope: &mut MessageEnvelope,
    keys: &S,
    passphrase: &Password,
    first: Object,
    objects: ObjectReader,
) -> Result<()> {
    let mut state = DecryptionState {
        objects,
        current: Some(first),
        mdc: None,
        pending_verification: None,
    };

    decrypt_stage(envelope, keys, passphrase, &mut state)?;
    decompress_stage(envelope, &mut state)?;
    signature_header_stage(envelope, keys, &mut state)?;
    let literal = extract_literal(envelope, &mut state)?;
    verify_integrity(envelope, &state)?;
    verify_signature(envelope, &mut state, &literal)?;

    Ok(())
}

/// Step 1: strip the encryption layer, if present.
fn decrypt_stage<S: KeyStore>(
    envelope: &mut MessageEnvelope,
    keys: &S,
    passphrase: &Password,
    state: &mut DecryptionState,
) -> Result<()> {
    let (esk, edata) = match state.current.take() {
        Some(Object::Encrypted { esk, edata }) => (esk, edata),
        other => {
            state.current = other;
            return Ok(());
        }
    };
    envelope.is_encrypted = true;

    // first recipient entry the local keyring holds a secret key for
    let Some((pkesk, secret_key)) = esk
        .iter()
        .find_map(|p| keys.find_secret_key(p.key_id()).map(|key| (p, key)))
    else {
        return Err(Error::KeyNotFound);
    };
    envelope.receiver_key_id = *pkesk.key_id();

    let unlocked = secret_key.unlock(passphrase)?;
    let (sym_alg, session_key) = pkesk.decrypt(unlocked.rsa())?;
    envelope.symmetric_algorithm = Provider::global()
        .symmetric_name(sym_alg.into())
        .to_string();
    debug!("session algorithm {}", envelope.symmetric_algorithm);

    let (plaintext, mdc) = edata.decrypt(sym_alg, &session_key)?;
    state.mdc = mdc;
    state.objects = ObjectReader::new(plaintext);
    state.current = state.objects.next_object().transpose()?;

    Ok(())
}

/// Step 2: unwrap a single compression layer, if present.
fn decompress_stage(envelope: &mut MessageEnvelope, state: &mut DecryptionState) -> Result<()> {
    let compressed = match state.current.take() {
        Some(Object::Compressed(c)) => c,
        other => {
            state.current = other;
            return Ok(());
        }
    };
    envelope.is_compressed = true;
    debug!("decompressing {:?}", compressed.compression_algorithm());

    let inner = compressed.decompress()?;
    state.objects = ObjectReader::new(inner);
    state.current = state.objects.next_object().transpose()?;

    Ok(())
}

/// Step 3: capture a one-pass signature header and prepare the verifier.
fn signature_header_stage<S: KeyStore>(
    envelope: &mut MessageEnvelope,
    keys: &S,
    state: &mut DecryptionState,
) -> Result<()> {
    let ops = match state.current.take() {
        Some(Object::OnePassSignature(ops)) => ops,
        other => {
            state.current = other;
            return Ok(());
        }
    };
    envelope.is_signed = true;
    debug!("signed by key {}", ops.key_id());

    let Some(signer) = keys.find_public_key(ops.key_id()) else {
        return Err(Error::KeyNotFound);
    };
    state.pending_verification = Some(PendingVerification {
        verifier: OnePassVerifier::new(&ops, signer.rsa().clone())?,
        signer_key_id: *signer.key_id(),
    });
    state.current = state.objects.next_object().transpose()?;

    Ok(())
}

/// Step 4: the current object must now be the literal data.
fn extract_literal(envelope: &mut MessageEnvelope, state: &mut DecryptionState) -> Result<Bytes> {
    match state.current.take() {
        Some(Object::Literal(literal)) => {
            let data = literal.into_data();
            envelope.decrypted_message = Some(data.clone());
            Ok(data)
        }
        Some(other) => {
            malformed!("expected literal data, found {:?}", other.tag());
        }
        None => {
            malformed!("message ends before the literal data");
        }
    }
}

/// Step 5: check integrity protection of the encryption layer.
///
/// Absence of protection is an advisory property of the sender's chosen
/// parameters, not a fault; a present but wrong detection code is fatal.
fn verify_integrity(envelope: &mut MessageEnvelope, state: &DecryptionState) -> Result<()> {
    if !envelope.is_encrypted {
        return Ok(());
    }
    match &state.mdc {
        Some(mdc) => {
            mdc.verify()?;
            envelope.is_integrity_verified = true;
        }
        None => warn!("encrypted message carries no integrity protection"),
    }
    Ok(())
}

/// Step 6: check the signature trailer against the extracted literal data.
///
/// A stream that ends without the trailer is malformed; a signed message is
/// never reported as verified without the actual comparison.
fn verify_signature(
    envelope: &mut MessageEnvelope,
    state: &mut DecryptionState,
    literal: &[u8],
) -> Result<()> {
    let Some(pending) = state.pending_verification.take() else {
        return Ok(());
    };
    let PendingVerification {
        mut verifier,
        signer_key_id,
    } = pending;

    verifier.update(literal);

    let Some(trailer) = state.objects.next_object().transpose()? else {
        malformed!("signed message is missing its signature packet");
    };
    let Object::Signature(signature) = trailer else {
        malformed!("expected a signature packet, found {:?}", trailer.tag());
    };

    verifier.verify(&signature)?;
    envelope.is_signature_verified = true;
    envelope.sender_key_id = signer_key_id;
    debug!("signature by {} verified", signer_key_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::Error;
    use crate::keyring::Keyring;
    use crate::packet::{LiteralData, Marker, PacketTrait};
    use crate::types::{write_packet_header, Tag};

    #[test]
    fn one_leading_marker_is_skipped() {
        let mut wire = Vec::new();
        Marker.to_writer_with_header(&mut wire).unwrap();
        LiteralData::from_bytes("f", &b"after the marker"[..])
            .to_writer_with_header(&mut wire)
            .unwrap();

        let mut envelope = MessageEnvelope::from_bytes(wire);
        decrypt_and_verify(&mut envelope, &Keyring::new(), &Password::empty()).unwrap();
        assert_eq!(
            envelope.decrypted_message.as_deref(),
            Some(&b"after the marker"[..])
        );
    }

    #[test]
    fn a_second_marker_is_rejected() {
        let mut wire = Vec::new();
        Marker.to_writer_with_header(&mut wire).unwrap();
        Marker.to_writer_with_header(&mut wire).unwrap();
        LiteralData::from_bytes("f", &b"x"[..])
            .to_writer_with_header(&mut wire)
            .unwrap();

        let mut envelope = MessageEnvelope::from_bytes(wire);
        let err =
            decrypt_and_verify(&mut envelope, &Keyring::new(), &Password::empty()).unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_leading_packet_is_rejected() {
        let mut wire = Vec::new();
        write_packet_header(&mut wire, Tag::Other(33), 3).unwrap();
        wire.extend_from_slice(&[1, 2, 3]);

        let mut envelope = MessageEnvelope::from_bytes(wire);
        let err =
            decrypt_and_verify(&mut envelope, &Keyring::new(), &Password::empty()).unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }), "got {err:?}");
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut envelope = MessageEnvelope::from_bytes(&b""[..]);
        let err =
            decrypt_and_verify(&mut envelope, &Keyring::new(), &Password::empty()).unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }), "got {err:?}");
    }

    #[test]
    fn plain_literal_probe_and_decode_agree() {
        let mut wire = Vec::new();
        LiteralData::from_bytes("f", &b"plain"[..])
            .to_writer_with_header(&mut wire)
            .unwrap();

        let mut envelope = MessageEnvelope::from_bytes(wire);
        inspect_envelope(&mut envelope, &Keyring::new()).unwrap();

        assert!(!envelope.is_encrypted);
        assert!(!envelope.is_armored);
        assert_eq!(envelope.decrypted_message.as_deref(), Some(&b"plain"[..]));
    }
}
