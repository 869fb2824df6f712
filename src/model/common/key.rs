use std::fmt::{Display, Formatter};
use std::str::FromStr;

use data_encoding::HEXLOWER;
use mongodb::bson::Bson;
use rand::{CryptoRng, RngCore};
use rocket::form::{self, prelude::ErrorKind, FromFormField, ValueField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of random bytes in a ballot key.
pub const KEY_BYTES: usize = 16;

/// Rendered width of a ballot key in hex characters.
pub const KEY_WIDTH: usize = KEY_BYTES * 2;

/// A voter capability key: 128 random bits as fixed-width lowercase hex.
///
/// Each voter holds two of these, one granting ballot retrieval (`key_a`)
/// and one granting ballot submission (`key_b`).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotKey(String);

impl BallotKey {
    /// Draw a fresh key from the given randomness source.
    pub fn generate(rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let mut bytes = [0_u8; KEY_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(HEXLOWER.encode(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BallotKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The given string is not a well-formed ballot key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("ballot keys are {KEY_WIDTH} lowercase hex characters")]
pub struct InvalidKey;

impl FromStr for BallotKey {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == KEY_WIDTH && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidKey)
        }
    }
}

impl From<&BallotKey> for Bson {
    fn from(key: &BallotKey) -> Self {
        Bson::String(key.0.clone())
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for BallotKey {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        field.value.parse::<BallotKey>().map_err(|err| {
            let error = ErrorKind::Custom(Box::new(err));
            error.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn generated_keys_are_fixed_width_hex() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let key = BallotKey::generate(&mut rng);
            assert_eq!(key.as_str().len(), KEY_WIDTH);
            assert!(key
                .as_str()
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
            // Round-trips through the validating parser.
            assert_eq!(key.as_str().parse::<BallotKey>(), Ok(key));
        }
    }

    #[test]
    fn generation_is_deterministic_for_a_fixed_seed() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        assert_eq!(BallotKey::generate(&mut rng1), BallotKey::generate(&mut rng2));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        let short = "abc123";
        let upper = "ABCDEF0123456789ABCDEF0123456789";
        let non_hex = "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz";
        for bad in [short, upper, non_hex, ""] {
            assert_eq!(bad.parse::<BallotKey>(), Err(InvalidKey));
        }
    }
}
