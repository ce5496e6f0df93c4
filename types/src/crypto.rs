//! Asymmetric key types and operations on them.
//!
//! Two algorithms are supported, tagged with a one-byte prefix in the
//! hex string form: Ed25519 (`01`) and secp256k1 (`02`). Secp256k1
//! signatures carry a trailing recovery id so the signing public key
//! can be recovered from a message prehash.

use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use ed25519_dalek::{
    Signature as Ed25519Signature, Signer, SigningKey as Ed25519SecretKey, Verifier,
    VerifyingKey as Ed25519PublicKey,
};
use hex_fmt::HexFmt;
use k256::ecdsa::{
    RecoveryId, Signature as Secp256k1Signature, SigningKey as Secp256k1SecretKey,
    VerifyingKey as Secp256k1PublicKey,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Tag for the Ed25519 variant.
pub const ED25519_TAG: u8 = 1;
/// Tag for the secp256k1 variant.
pub const SECP256K1_TAG: u8 = 2;

/// Length of an Ed25519 public key in bytes.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;
/// Length of a compressed secp256k1 public key in bytes.
pub const SECP256K1_PUBLIC_KEY_LENGTH: usize = 33;
/// Length of an Ed25519 signature in bytes.
pub const ED25519_SIGNATURE_LENGTH: usize = 64;
/// Length of a secp256k1 signature in bytes, excluding the recovery id.
pub const SECP256K1_SIGNATURE_LENGTH: usize = 64;

const SECRET_KEY_LENGTH: usize = 32;

/// Cryptographic errors.
// No `Eq`: `hex::FromHexError` only implements `PartialEq`.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum Error {
    /// Unknown algorithm tag while parsing a key or signature.
    #[error("invalid algorithm tag: {0}")]
    InvalidTag(u8),
    /// Hex decoding failure.
    #[error("hex decoding error: {0}")]
    FromHex(#[from] hex::FromHexError),
    /// Wrong number of bytes for the tagged algorithm.
    #[error("wrong length: expected {expected} bytes, found {found}")]
    Length {
        /// Expected byte length, excluding the tag.
        expected: usize,
        /// Actual byte length, excluding the tag.
        found: usize,
    },
    /// Malformed key material.
    #[error("asymmetric key error: {0}")]
    AsymmetricKey(String),
    /// The signature did not verify against the given key and message.
    #[error("signature verification failed")]
    VerificationFailed,
    /// Public key recovery from a signature failed.
    #[error("key recovery failed: {0}")]
    Recovery(String),
}

/// Computes the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A public key, stored in validated raw form.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PublicKey {
    /// Ed25519 public key.
    Ed25519([u8; ED25519_PUBLIC_KEY_LENGTH]),
    /// Compressed (SEC1) secp256k1 public key.
    Secp256k1([u8; SECP256K1_PUBLIC_KEY_LENGTH]),
}

impl PublicKey {
    /// Constructs an Ed25519 public key, validating the curve point.
    pub fn ed25519_from_bytes(bytes: [u8; ED25519_PUBLIC_KEY_LENGTH]) -> Result<Self, Error> {
        Ed25519PublicKey::from_bytes(&bytes)
            .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
        Ok(PublicKey::Ed25519(bytes))
    }

    /// Constructs a secp256k1 public key from compressed SEC1 bytes.
    pub fn secp256k1_from_bytes(
        bytes: [u8; SECP256K1_PUBLIC_KEY_LENGTH],
    ) -> Result<Self, Error> {
        Secp256k1PublicKey::from_sec1_bytes(&bytes)
            .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
        Ok(PublicKey::Secp256k1(bytes))
    }

    fn tag(&self) -> u8 {
        match self {
            PublicKey::Ed25519(_) => ED25519_TAG,
            PublicKey::Secp256k1(_) => SECP256K1_TAG,
        }
    }

    fn raw_bytes(&self) -> &[u8] {
        match self {
            PublicKey::Ed25519(bytes) => bytes,
            PublicKey::Secp256k1(bytes) => bytes,
        }
    }

    /// Returns the tag byte followed by the raw key bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(1 + self.raw_bytes().len());
        result.push(self.tag());
        result.extend_from_slice(self.raw_bytes());
        result
    }
}

impl Display for PublicKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{:02x}{}", self.tag(), HexFmt(self.raw_bytes()))
    }
}

impl Debug for PublicKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(input)?;
        let (tag, rest) = match bytes.split_first() {
            Some(split) => split,
            None => {
                return Err(Error::Length {
                    expected: ED25519_PUBLIC_KEY_LENGTH,
                    found: 0,
                })
            }
        };
        match *tag {
            ED25519_TAG => {
                let raw: [u8; ED25519_PUBLIC_KEY_LENGTH] =
                    rest.try_into().map_err(|_| Error::Length {
                        expected: ED25519_PUBLIC_KEY_LENGTH,
                        found: rest.len(),
                    })?;
                PublicKey::ed25519_from_bytes(raw)
            }
            SECP256K1_TAG => {
                let raw: [u8; SECP256K1_PUBLIC_KEY_LENGTH] =
                    rest.try_into().map_err(|_| Error::Length {
                        expected: SECP256K1_PUBLIC_KEY_LENGTH,
                        found: rest.len(),
                    })?;
                PublicKey::secp256k1_from_bytes(raw)
            }
            other => Err(Error::InvalidTag(other)),
        }
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let as_string = String::deserialize(deserializer)?;
        as_string.parse().map_err(de::Error::custom)
    }
}

/// A signature, tagged with the signing algorithm.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Signature {
    /// Ed25519 signature.
    Ed25519([u8; ED25519_SIGNATURE_LENGTH]),
    /// Secp256k1 signature bytes plus the recovery id.
    Secp256k1 {
        /// Fixed-width `r || s` signature bytes.
        bytes: [u8; SECP256K1_SIGNATURE_LENGTH],
        /// Recovery id in `0..=3`.
        recovery_id: u8,
    },
}

impl Signature {
    fn tag(&self) -> u8 {
        match self {
            Signature::Ed25519(_) => ED25519_TAG,
            Signature::Secp256k1 { .. } => SECP256K1_TAG,
        }
    }

    /// Returns the tag byte followed by the raw signature bytes (and,
    /// for secp256k1, the recovery id).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Signature::Ed25519(bytes) => {
                let mut result = Vec::with_capacity(1 + bytes.len());
                result.push(ED25519_TAG);
                result.extend_from_slice(bytes);
                result
            }
            Signature::Secp256k1 { bytes, recovery_id } => {
                let mut result = Vec::with_capacity(2 + bytes.len());
                result.push(SECP256K1_TAG);
                result.extend_from_slice(bytes);
                result.push(*recovery_id);
                result
            }
        }
    }
}

impl Display for Signature {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            Signature::Ed25519(bytes) => {
                write!(formatter, "{:02x}{}", ED25519_TAG, HexFmt(bytes))
            }
            Signature::Secp256k1 { bytes, recovery_id } => write!(
                formatter,
                "{:02x}{}{:02x}",
                SECP256K1_TAG,
                HexFmt(bytes),
                recovery_id
            ),
        }
    }
}

impl Debug for Signature {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Signature({:02x}..)", self.tag())
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(input)?;
        let (tag, rest) = match bytes.split_first() {
            Some(split) => split,
            None => {
                return Err(Error::Length {
                    expected: ED25519_SIGNATURE_LENGTH,
                    found: 0,
                })
            }
        };
        match *tag {
            ED25519_TAG => {
                let raw: [u8; ED25519_SIGNATURE_LENGTH] =
                    rest.try_into().map_err(|_| Error::Length {
                        expected: ED25519_SIGNATURE_LENGTH,
                        found: rest.len(),
                    })?;
                Ok(Signature::Ed25519(raw))
            }
            SECP256K1_TAG => {
                if rest.len() != SECP256K1_SIGNATURE_LENGTH + 1 {
                    return Err(Error::Length {
                        expected: SECP256K1_SIGNATURE_LENGTH + 1,
                        found: rest.len(),
                    });
                }
                let mut raw = [0; SECP256K1_SIGNATURE_LENGTH];
                raw.copy_from_slice(&rest[..SECP256K1_SIGNATURE_LENGTH]);
                Ok(Signature::Secp256k1 {
                    bytes: raw,
                    recovery_id: rest[SECP256K1_SIGNATURE_LENGTH],
                })
            }
            other => Err(Error::InvalidTag(other)),
        }
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let as_string = String::deserialize(deserializer)?;
        as_string.parse().map_err(de::Error::custom)
    }
}

/// A secret key.
///
/// Deliberately not serializable; the `Debug` impl does not reveal key
/// material.
#[derive(Clone)]
pub enum SecretKey {
    /// Ed25519 secret key.
    Ed25519([u8; SECRET_KEY_LENGTH]),
    /// Secp256k1 secret key.
    Secp256k1([u8; SECRET_KEY_LENGTH]),
}

impl SecretKey {
    /// Constructs an Ed25519 secret key from raw bytes.
    pub fn ed25519_from_bytes(bytes: [u8; SECRET_KEY_LENGTH]) -> Self {
        SecretKey::Ed25519(bytes)
    }

    /// Constructs a secp256k1 secret key from raw bytes, validating the
    /// scalar.
    pub fn secp256k1_from_bytes(bytes: [u8; SECRET_KEY_LENGTH]) -> Result<Self, Error> {
        Secp256k1SecretKey::from_slice(&bytes)
            .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
        Ok(SecretKey::Secp256k1(bytes))
    }

    /// Generates a random Ed25519 secret key.
    #[cfg(any(feature = "testing", test))]
    pub fn random_ed25519<R: rand::Rng>(rng: &mut R) -> Self {
        SecretKey::Ed25519(rng.gen())
    }

    /// Generates a random secp256k1 secret key.
    #[cfg(any(feature = "testing", test))]
    pub fn random_secp256k1<R: rand::Rng>(rng: &mut R) -> Self {
        loop {
            // Rejection-samples until the bytes form a valid scalar.
            if let Ok(key) = SecretKey::secp256k1_from_bytes(rng.gen()) {
                return key;
            }
        }
    }

    /// Returns the public key corresponding to this secret key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            SecretKey::Ed25519(bytes) => {
                let signing_key = Ed25519SecretKey::from_bytes(bytes);
                PublicKey::Ed25519(signing_key.verifying_key().to_bytes())
            }
            SecretKey::Secp256k1(bytes) => {
                // Validated at construction.
                let signing_key = Secp256k1SecretKey::from_slice(bytes)
                    .expect("secp256k1 scalar validated at construction");
                let point = signing_key.verifying_key().to_encoded_point(true);
                let mut raw = [0; SECP256K1_PUBLIC_KEY_LENGTH];
                raw.copy_from_slice(point.as_bytes());
                PublicKey::Secp256k1(raw)
            }
        }
    }

    /// Signs `message`, producing an algorithm-tagged signature.
    ///
    /// Secp256k1 signing hashes the message with SHA-256 and produces a
    /// recoverable signature.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, Error> {
        match self {
            SecretKey::Ed25519(bytes) => {
                let signing_key = Ed25519SecretKey::from_bytes(bytes);
                let signature: Ed25519Signature = signing_key.sign(message);
                Ok(Signature::Ed25519(signature.to_bytes()))
            }
            SecretKey::Secp256k1(bytes) => {
                let signing_key = Secp256k1SecretKey::from_slice(bytes)
                    .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
                let prehash = sha256(message);
                let (signature, recovery_id) = signing_key
                    .sign_prehash_recoverable(&prehash)
                    .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
                let mut raw = [0; SECP256K1_SIGNATURE_LENGTH];
                raw.copy_from_slice(&signature.to_bytes());
                Ok(Signature::Secp256k1 {
                    bytes: raw,
                    recovery_id: recovery_id.to_byte(),
                })
            }
        }
    }
}

impl Debug for SecretKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        let algorithm = match self {
            SecretKey::Ed25519(_) => "Ed25519",
            SecretKey::Secp256k1(_) => "Secp256k1",
        };
        write!(formatter, "SecretKey({})", algorithm)
    }
}

impl From<&SecretKey> for PublicKey {
    fn from(secret_key: &SecretKey) -> Self {
        secret_key.public_key()
    }
}

/// Verifies `signature` over `message` with `public_key`.
pub fn verify(message: &[u8], signature: &Signature, public_key: &PublicKey) -> Result<(), Error> {
    match (signature, public_key) {
        (Signature::Ed25519(signature_bytes), PublicKey::Ed25519(key_bytes)) => {
            let verifying_key = Ed25519PublicKey::from_bytes(key_bytes)
                .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
            let signature = Ed25519Signature::from_bytes(signature_bytes);
            verifying_key
                .verify(message, &signature)
                .map_err(|_| Error::VerificationFailed)
        }
        (Signature::Secp256k1 { bytes, .. }, PublicKey::Secp256k1(key_bytes)) => {
            let verifying_key = Secp256k1PublicKey::from_sec1_bytes(key_bytes)
                .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
            let signature = Secp256k1Signature::from_slice(bytes)
                .map_err(|error| Error::AsymmetricKey(error.to_string()))?;
            verifying_key
                .verify(message, &signature)
                .map_err(|_| Error::VerificationFailed)
        }
        _ => Err(Error::VerificationFailed),
    }
}

/// Recovers the secp256k1 public key that produced `signature` over the
/// 32-byte `prehash`.
pub fn recover_secp256k1(prehash: &[u8; 32], signature: &Signature) -> Result<PublicKey, Error> {
    let (signature_bytes, recovery_id) = match signature {
        Signature::Secp256k1 { bytes, recovery_id } => (bytes, *recovery_id),
        Signature::Ed25519(_) => {
            return Err(Error::Recovery("not a recoverable signature".to_string()))
        }
    };
    let signature = Secp256k1Signature::from_slice(signature_bytes)
        .map_err(|error| Error::Recovery(error.to_string()))?;
    let recovery_id = RecoveryId::from_byte(recovery_id)
        .ok_or_else(|| Error::Recovery(format!("invalid recovery id {}", recovery_id)))?;
    let verifying_key = Secp256k1PublicKey::recover_from_prehash(prehash, &signature, recovery_id)
        .map_err(|error| Error::Recovery(error.to_string()))?;
    let point = verifying_key.to_encoded_point(true);
    let mut raw = [0; SECP256K1_PUBLIC_KEY_LENGTH];
    raw.copy_from_slice(point.as_bytes());
    Ok(PublicKey::Secp256k1(raw))
}
