use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{BallotKey, ElectionState},
    db::election::Election,
    mongodb::Id,
};

/// The user-supplied parts of an election, for creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub form: Option<String>,
}

/// An election as presented to its owner.
#[derive(Debug, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: Id,
    pub title: String,
    pub subtitle: String,
    pub info: String,
    pub form: Option<String>,
    pub state: ElectionState,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.election.title,
            subtitle: election.election.subtitle,
            info: election.election.info,
            form: election.election.form,
            state: election.election.state,
            created: election.election.created,
            modified: election.election.modified,
        }
    }
}

/// A requested state change, as the raw string so that unknown values can be
/// rejected explicitly rather than by the JSON deserializer.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateChange {
    pub state: String,
}

/// A key generation request.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyRequest {
    pub n: u32,
}

/// The result of key generation: the ballot-retrieval keys to distribute.
///
/// Submission keys are deliberately absent; voters discover their own
/// `key_b` when they fetch their ballot.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyBatch {
    /// Base URL voters append their key to.
    pub vote_url: String,
    pub keys: Vec<BallotKey>,
}
