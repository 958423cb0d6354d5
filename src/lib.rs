//! # pgp-courier
//!
//! Composes and reads layered, OpenPGP-style messages: an optional literal
//! wrap or one-pass signature bracket, optional ZIP compression, optional
//! single-recipient public-key encryption with integrity protection, and
//! optional ASCII armor for text-safe transport.
//!
//! The two entry points mirror the two sides of the pipeline:
//!
//! - [`compose`] builds the outbound packet layers in their fixed order.
//! - [`inspect_envelope`] and [`decrypt_and_verify`] walk an inbound byte
//!   stream through whatever subset of those layers it carries, filling in
//!   a [`MessageEnvelope`] with the recovered plaintext and the
//!   classification and verification flags.
//!
//! ```no_run
//! use pgp_courier::crypto::sym::SymmetricKeyAlgorithm;
//! use pgp_courier::keyring::{Keyring, SecretKey};
//! use pgp_courier::types::Password;
//! use pgp_courier::{compose, decrypt_and_verify, MessageEnvelope};
//!
//! # fn main() -> pgp_courier::errors::Result<()> {
//! let mut rng = rand::thread_rng();
//! let passphrase = Password::from("correct horse");
//! let alice = SecretKey::generate(&mut rng, 2048, "Alice <alice@example.com>", &passphrase)?;
//! let bob = SecretKey::generate(&mut rng, 2048, "Bob <bob@example.com>", &passphrase)?;
//!
//! let wire = compose(
//!     &mut rng,
//!     b"hello",
//!     Some(&alice),
//!     Some(bob.public_key()),
//!     SymmetricKeyAlgorithm::AES256,
//!     &passphrase,
//!     true,
//!     true,
//!     true,
//! )?;
//!
//! let mut keyring = Keyring::new();
//! keyring.add_secret_key(bob);
//! keyring.add_public_key(alice.public_key().clone());
//!
//! let mut envelope = MessageEnvelope::from_bytes(wire);
//! decrypt_and_verify(&mut envelope, &keyring, &passphrase)?;
//! assert!(envelope.is_signature_verified);
//! # Ok(())
//! # }
//! ```

pub mod armor;
pub mod composed;
pub mod crypto;
pub mod errors;
pub mod keyring;
pub mod packet;
mod ser;
pub mod types;

pub use crate::composed::message::{
    compose, decrypt_and_verify, inspect_envelope, Edata, MessageEnvelope, Object, ObjectReader,
};
pub use crate::ser::Serialize;
