use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use pgp_courier::armor::{armor_message, dearmor, is_armored};
use pgp_courier::crypto::sym::SymmetricKeyAlgorithm;
use pgp_courier::keyring::SecretKey;
use pgp_courier::types::Password;
use pgp_courier::compose;

#[test]
fn armored_compose_output_is_well_formed() {
    let _ = pretty_env_logger::try_init();

    let mut rng = ChaCha20Rng::seed_from_u64(100);
    let key = SecretKey::generate(&mut rng, 2048, "t", &Password::empty()).unwrap();

    let wire = compose(
        &mut rng,
        b"armored payload",
        None,
        Some(key.public_key()),
        SymmetricKeyAlgorithm::AES128,
        &Password::empty(),
        false,
        false,
        true,
    )
    .unwrap();

    let text = std::str::from_utf8(&wire).expect("armored output must be ascii");
    assert!(text.starts_with("-----BEGIN PGP MESSAGE-----\n"));
    assert!(text.ends_with("-----END PGP MESSAGE-----\n"));
    assert!(text.contains("Version: pgp-courier"));
    assert!(text.lines().all(|line| line.len() <= 76));
    assert!(is_armored(&wire));
}

#[test]
fn dearmor_inverts_armor_message() {
    let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let armored = armor_message(&data).unwrap();
    assert_eq!(dearmor(&armored).unwrap(), data);
}

#[test]
fn dearmor_tolerates_leading_whitespace_and_extra_headers() {
    let armored = armor_message(b"payload").unwrap();
    let text = std::str::from_utf8(&armored).unwrap();
    let with_noise = format!(
        "\n\n  \n{}",
        text.replacen(
            "Version:",
            "Comment: forwarded by a gateway\nVersion:",
            1
        )
    );

    assert!(is_armored(with_noise.as_bytes()));
    assert_eq!(dearmor(with_noise.as_bytes()).unwrap(), b"payload");
}

#[test]
fn binary_packets_are_not_mistaken_for_armor() {
    let mut rng = ChaCha20Rng::seed_from_u64(101);
    let key = SecretKey::generate(&mut rng, 2048, "t", &Password::empty()).unwrap();

    let wire = compose(
        &mut rng,
        b"binary",
        None,
        Some(key.public_key()),
        SymmetricKeyAlgorithm::AES128,
        &Password::empty(),
        false,
        false,
        false,
    )
    .unwrap();

    assert!(!is_armored(&wire));
}
