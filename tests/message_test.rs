use std::sync::OnceLock;

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use pgp_courier::crypto::sym::SymmetricKeyAlgorithm;
use pgp_courier::errors::Error;
use pgp_courier::keyring::{Keyring, KeyStore, SecretKey};
use pgp_courier::packet::{LiteralData, OnePassSignature, PacketTrait, SignatureType};
use pgp_courier::types::{KeyId, Password};
use pgp_courier::{compose, decrypt_and_verify, inspect_envelope, MessageEnvelope};
use pgp_courier::crypto::hash::HashAlgorithm;
use pgp_courier::crypto::rsa::PublicKeyAlgorithm;

const ALICE_PASSPHRASE: &str = "alice and her secrets";
const BOB_PASSPHRASE: &str = "bob and his secrets";

struct Fixture {
    alice: SecretKey,
    bob: SecretKey,
    carol: SecretKey,
}

/// Key generation dominates test time, so the fixture is shared.
fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let mut rng = ChaCha20Rng::seed_from_u64(1000);
        Fixture {
            alice: SecretKey::generate(
                &mut rng,
                2048,
                "Alice <alice@example.com>",
                &ALICE_PASSPHRASE.into(),
            )
            .unwrap(),
            bob: SecretKey::generate(
                &mut rng,
                2048,
                "Bob <bob@example.com>",
                &BOB_PASSPHRASE.into(),
            )
            .unwrap(),
            carol: SecretKey::generate(&mut rng, 2048, "Carol <carol@example.com>", &"".into())
                .unwrap(),
        }
    })
}

/// Bob's keyring: his own secret key plus Alice's public key.
fn bobs_keyring() -> Keyring {
    let fixture = fixture();
    let mut keyring = Keyring::new();
    keyring.add_secret_key(fixture.bob.clone());
    keyring.add_public_key(fixture.alice.public_key().clone());
    keyring
}

fn compose_to_bob(
    message: &[u8],
    algorithm: SymmetricKeyAlgorithm,
    add_signature: bool,
    add_compression: bool,
    add_armor: bool,
) -> Vec<u8> {
    let fixture = fixture();
    let mut rng = ChaCha20Rng::seed_from_u64(2000);
    compose(
        &mut rng,
        message,
        Some(&fixture.alice),
        Some(fixture.bob.public_key()),
        algorithm,
        &ALICE_PASSPHRASE.into(),
        add_signature,
        add_compression,
        add_armor,
    )
    .unwrap()
}

#[test]
fn round_trip_matrix() {
    let _ = pretty_env_logger::try_init();

    let message = b"the quick brown fox jumps over the lazy dog";
    let keyring = bobs_keyring();

    for algorithm in [
        SymmetricKeyAlgorithm::Plaintext,
        SymmetricKeyAlgorithm::AES128,
        SymmetricKeyAlgorithm::AES256,
    ] {
        for add_signature in [false, true] {
            for add_compression in [false, true] {
                for add_armor in [false, true] {
                    let wire =
                        compose_to_bob(message, algorithm, add_signature, add_compression, add_armor);

                    let mut envelope = MessageEnvelope::from_bytes(wire);
                    decrypt_and_verify(&mut envelope, &keyring, &BOB_PASSPHRASE.into())
                        .unwrap_or_else(|err| {
                            panic!(
                                "decode failed for alg={algorithm:?} sig={add_signature} \
                                 zip={add_compression} armor={add_armor}: {err}"
                            )
                        });

                    let case = format!(
                        "alg={algorithm:?} sig={add_signature} zip={add_compression} armor={add_armor}"
                    );
                    assert_eq!(
                        envelope.decrypted_message.as_deref(),
                        Some(&message[..]),
                        "{case}"
                    );
                    assert_eq!(
                        envelope.is_encrypted,
                        algorithm != SymmetricKeyAlgorithm::Plaintext,
                        "{case}"
                    );
                    assert_eq!(envelope.is_signed, add_signature, "{case}");
                    assert_eq!(envelope.is_compressed, add_compression, "{case}");
                    assert_eq!(envelope.is_armored, add_armor, "{case}");
                    assert_eq!(envelope.is_signature_verified, add_signature, "{case}");
                    // integrity protection is always enabled when encrypting
                    assert_eq!(
                        envelope.is_integrity_verified,
                        algorithm != SymmetricKeyAlgorithm::Plaintext,
                        "{case}"
                    );

                    if envelope.is_encrypted {
                        assert_eq!(envelope.receiver_key_id, *fixture().bob.key_id(), "{case}");
                        assert!(!envelope.symmetric_algorithm.is_empty(), "{case}");
                    } else {
                        assert!(envelope.symmetric_algorithm.is_empty(), "{case}");
                    }
                    if envelope.is_signature_verified {
                        assert_eq!(envelope.sender_key_id, *fixture().alice.key_id(), "{case}");
                    } else {
                        assert!(envelope.sender_key_id.is_unknown(), "{case}");
                    }
                }
            }
        }
    }
}

#[test]
fn everything_on_hello() {
    let _ = pretty_env_logger::try_init();

    let wire = compose_to_bob(b"hello", SymmetricKeyAlgorithm::AES128, true, true, true);

    let mut envelope = MessageEnvelope::from_bytes(wire);
    decrypt_and_verify(&mut envelope, &bobs_keyring(), &BOB_PASSPHRASE.into()).unwrap();

    assert_eq!(envelope.decrypted_message.as_deref(), Some(&b"hello"[..]));
    assert!(envelope.is_encrypted);
    assert!(envelope.is_signed);
    assert!(envelope.is_compressed);
    assert!(envelope.is_armored);
    assert!(envelope.is_integrity_verified);
    assert!(envelope.is_signature_verified);
    assert_eq!(envelope.symmetric_algorithm, "AES128");
}

#[test]
fn everything_off_empty_message() {
    let _ = pretty_env_logger::try_init();

    let wire = compose_to_bob(b"", SymmetricKeyAlgorithm::Plaintext, false, false, false);

    let mut envelope = MessageEnvelope::from_bytes(wire);
    decrypt_and_verify(&mut envelope, &bobs_keyring(), &Password::empty()).unwrap();

    assert_eq!(envelope.decrypted_message.as_deref(), Some(&b""[..]));
    assert!(!envelope.is_encrypted);
    assert!(!envelope.is_signed);
    assert!(!envelope.is_compressed);
    assert!(!envelope.is_armored);
    assert!(!envelope.is_integrity_verified);
    assert!(!envelope.is_signature_verified);
    assert!(envelope.symmetric_algorithm.is_empty());
}

#[test]
fn probe_reports_recipient_without_passphrase() {
    let _ = pretty_env_logger::try_init();

    let wire = compose_to_bob(b"for bob", SymmetricKeyAlgorithm::AES256, false, false, true);

    let mut envelope = MessageEnvelope::from_bytes(wire);
    inspect_envelope(&mut envelope, &bobs_keyring()).unwrap();

    assert!(envelope.is_encrypted);
    assert!(envelope.is_armored);
    assert_eq!(envelope.receiver_key_id, *fixture().bob.key_id());
    // the probe never decrypts
    assert_eq!(envelope.decrypted_message, None);
    assert!(!envelope.is_integrity_verified);
}

#[test]
fn probe_leaves_recipient_unknown_without_a_matching_key() {
    let _ = pretty_env_logger::try_init();

    let wire = compose_to_bob(b"for bob", SymmetricKeyAlgorithm::AES256, false, false, false);

    // a keyring with no secret keys at all
    let mut keyring = Keyring::new();
    keyring.add_public_key(fixture().alice.public_key().clone());

    let mut envelope = MessageEnvelope::from_bytes(wire);
    inspect_envelope(&mut envelope, &keyring).unwrap();

    assert!(envelope.is_encrypted);
    assert_eq!(envelope.receiver_key_id, KeyId::UNKNOWN);
}

#[test]
fn probe_fully_decodes_unencrypted_messages() {
    let _ = pretty_env_logger::try_init();

    let wire = compose_to_bob(
        b"signed but not encrypted",
        SymmetricKeyAlgorithm::Plaintext,
        true,
        true,
        false,
    );

    let mut envelope = MessageEnvelope::from_bytes(wire);
    inspect_envelope(&mut envelope, &bobs_keyring()).unwrap();

    assert!(!envelope.is_encrypted);
    assert!(envelope.is_signed);
    assert!(envelope.is_compressed);
    assert!(envelope.is_signature_verified);
    assert_eq!(
        envelope.decrypted_message.as_deref(),
        Some(&b"signed but not encrypted"[..])
    );
}

#[test]
fn wrong_passphrase_is_a_key_unlock_error() {
    let _ = pretty_env_logger::try_init();

    let wire = compose_to_bob(b"secret", SymmetricKeyAlgorithm::AES128, false, false, false);

    let mut envelope = MessageEnvelope::from_bytes(wire);
    let err = decrypt_and_verify(&mut envelope, &bobs_keyring(), &"not bobs passphrase".into())
        .unwrap_err();

    assert!(matches!(err, Error::KeyUnlock), "got {err:?}");
    assert_eq!(envelope.decrypted_message, None);
}

#[test]
fn signing_with_the_wrong_passphrase_fails_composition() {
    let _ = pretty_env_logger::try_init();

    let fixture = fixture();
    let mut rng = ChaCha20Rng::seed_from_u64(2500);
    let err = compose(
        &mut rng,
        b"never leaves the house",
        Some(&fixture.alice),
        None,
        SymmetricKeyAlgorithm::Plaintext,
        &"not alices passphrase".into(),
        true,
        false,
        false,
    )
    .unwrap_err();

    assert!(matches!(err, Error::KeyUnlock), "got {err:?}");
}

#[test]
fn missing_recipient_key_is_fatal() {
    let _ = pretty_env_logger::try_init();

    let fixture = fixture();
    let mut rng = ChaCha20Rng::seed_from_u64(3000);
    let wire = compose(
        &mut rng,
        b"for carol",
        None,
        Some(fixture.carol.public_key()),
        SymmetricKeyAlgorithm::AES128,
        &Password::empty(),
        false,
        false,
        false,
    )
    .unwrap();

    // bob's keyring has no secret key for carol
    let mut envelope = MessageEnvelope::from_bytes(wire);
    let err = decrypt_and_verify(&mut envelope, &bobs_keyring(), &Password::empty()).unwrap_err();

    assert!(matches!(err, Error::KeyNotFound), "got {err:?}");
}

#[test]
fn tampered_ciphertext_never_passes_silently() {
    let _ = pretty_env_logger::try_init();

    let message = b"bytes that must not survive tampering";
    let wire = compose_to_bob(message, SymmetricKeyAlgorithm::AES256, false, false, false);
    let keyring = bobs_keyring();

    // flip one byte at a time across the tail of the ciphertext, which
    // covers the detection code region as well as the body
    for offset in [wire.len() - 1, wire.len() - 20, wire.len() / 2] {
        let mut tampered = wire.clone();
        tampered[offset] ^= 0x40;

        let mut envelope = MessageEnvelope::from_bytes(tampered);
        match decrypt_and_verify(&mut envelope, &keyring, &BOB_PASSPHRASE.into()) {
            Err(_) => {}
            Ok(()) => {
                assert!(
                    !envelope.is_integrity_verified,
                    "tamper at {offset} went unnoticed"
                );
                assert_ne!(
                    envelope.decrypted_message.as_deref(),
                    Some(&message[..]),
                    "tamper at {offset} recovered the original plaintext"
                );
            }
        }
    }
}

#[test]
fn tampered_literal_fails_signature_verification() {
    let _ = pretty_env_logger::try_init();

    let message = b"untampered payload content";
    let wire = compose_to_bob(message, SymmetricKeyAlgorithm::Plaintext, true, false, false);

    // the literal body is in the clear; locate and flip one byte of it
    let start = wire
        .windows(message.len())
        .position(|w| w == message)
        .expect("literal body must be present in the clear");
    let mut tampered = wire.clone();
    tampered[start + message.len() / 2] ^= 0x01;

    let mut envelope = MessageEnvelope::from_bytes(tampered);
    let err = decrypt_and_verify(&mut envelope, &bobs_keyring(), &Password::empty()).unwrap_err();

    assert!(matches!(err, Error::SignatureVerification), "got {err:?}");
    assert!(!envelope.is_signature_verified);
}

#[test]
fn unsigned_messages_never_report_a_verified_signature() {
    let _ = pretty_env_logger::try_init();

    for algorithm in [SymmetricKeyAlgorithm::Plaintext, SymmetricKeyAlgorithm::AES128] {
        let wire = compose_to_bob(b"unsigned", algorithm, false, true, false);

        let mut envelope = MessageEnvelope::from_bytes(wire);
        decrypt_and_verify(&mut envelope, &bobs_keyring(), &BOB_PASSPHRASE.into()).unwrap();

        assert!(!envelope.is_signed);
        assert!(!envelope.is_signature_verified);
        assert!(envelope.sender_key_id.is_unknown());
    }
}

#[test]
fn missing_signature_trailer_is_malformed() {
    let _ = pretty_env_logger::try_init();

    let fixture = fixture();

    // a one-pass header and literal data, but no trailing signature packet
    let mut wire = Vec::new();
    OnePassSignature::v3(
        SignatureType::Binary,
        HashAlgorithm::SHA2_256,
        PublicKeyAlgorithm::RSA,
        *fixture.alice.key_id(),
    )
    .to_writer_with_header(&mut wire)
    .unwrap();
    LiteralData::from_bytes("message", &b"headless"[..])
        .to_writer_with_header(&mut wire)
        .unwrap();

    let mut envelope = MessageEnvelope::from_bytes(wire);
    let err = decrypt_and_verify(&mut envelope, &bobs_keyring(), &Password::empty()).unwrap_err();

    assert!(matches!(err, Error::MalformedMessage { .. }), "got {err:?}");
    assert!(!envelope.is_signature_verified);
}

#[test]
fn unknown_signer_key_is_fatal() {
    let _ = pretty_env_logger::try_init();

    let wire = compose_to_bob(b"who signed this", SymmetricKeyAlgorithm::Plaintext, true, false, false);

    // a keyring that cannot resolve alice's public key
    let mut keyring = Keyring::new();
    keyring.add_secret_key(fixture().bob.clone());
    assert!(keyring.find_public_key(fixture().alice.key_id()).is_none());

    let mut envelope = MessageEnvelope::from_bytes(wire);
    let err = decrypt_and_verify(&mut envelope, &keyring, &Password::empty()).unwrap_err();

    assert!(matches!(err, Error::KeyNotFound), "got {err:?}");
}

#[test]
fn garbage_input_is_malformed() {
    let _ = pretty_env_logger::try_init();

    let mut envelope = MessageEnvelope::from_bytes(&b"\x00\x01\x02\x03 not a message"[..]);
    let err = decrypt_and_verify(&mut envelope, &bobs_keyring(), &Password::empty()).unwrap_err();
    assert!(matches!(err, Error::MalformedMessage { .. }), "got {err:?}");
}

#[test]
fn envelope_is_reusable_across_runs() {
    let _ = pretty_env_logger::try_init();

    // decode a signed message, then reuse the envelope for an unsigned one;
    // stale flags must not leak between runs
    let signed = compose_to_bob(b"first", SymmetricKeyAlgorithm::Plaintext, true, false, false);
    let keyring = bobs_keyring();

    let mut envelope = MessageEnvelope::from_bytes(signed);
    decrypt_and_verify(&mut envelope, &keyring, &Password::empty()).unwrap();
    assert!(envelope.is_signature_verified);

    envelope.encrypted_message =
        compose_to_bob(b"second", SymmetricKeyAlgorithm::Plaintext, false, false, false).into();
    decrypt_and_verify(&mut envelope, &keyring, &Password::empty()).unwrap();

    assert!(!envelope.is_signed);
    assert!(!envelope.is_signature_verified);
    assert!(envelope.sender_key_id.is_unknown());
    assert_eq!(envelope.decrypted_message.as_deref(), Some(&b"second"[..]));
}
