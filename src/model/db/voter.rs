use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::model::{common::BallotKey, mongodb::Id};

/// Maximum number of voters created by a single key generation request.
pub const MAX_KEY_BATCH: usize = 500;

/// Core voter data, as stored in the database.
///
/// A voter is anonymous: the record carries no identity, only the two
/// capability keys handed out to whoever will cast this ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// The election this voter belongs to.
    pub election_id: Id,
    /// Ballot-retrieval (read) key.
    pub key_a: BallotKey,
    /// Ballot-submission (write) key, also the public identifier once the
    /// election closes.
    pub key_b: BallotKey,
    /// Submitted ballot content; empty until voted.
    pub ballot: String,
    pub voted: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified: DateTime<Utc>,
}

impl VoterCore {
    /// Create a voter with two independently drawn keys.
    pub fn new(election_id: Id, rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let now = Utc::now();
        Self {
            election_id,
            key_a: BallotKey::generate(rng),
            key_b: BallotKey::generate(rng),
            ballot: String::new(),
            voted: false,
            created: now,
            modified: now,
        }
    }

    /// Overwrite the ballot content.
    ///
    /// Submitting empty content un-casts the vote; resubmission simply
    /// replaces whatever was there before.
    pub fn submit_ballot(&mut self, ballot: String) {
        self.voted = !ballot.is_empty();
        self.ballot = ballot;
        self.modified = Utc::now();
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Generate a batch of voters for an election, clamped to [`MAX_KEY_BATCH`].
///
/// The caller distributes the `key_a` values; `key_b` values stay inside the
/// stored records. Persistence of the batch is the caller's responsibility
/// and is not transactional.
pub fn generate_batch(
    election_id: Id,
    n: usize,
    rng: &mut (impl RngCore + CryptoRng),
) -> Vec<NewVoter> {
    let n = n.min(MAX_KEY_BATCH);
    (0..n).map(|_| VoterCore::new(election_id, rng)).collect()
}
