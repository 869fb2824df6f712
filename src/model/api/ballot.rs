use serde::{Deserialize, Serialize};

use crate::model::{common::BallotKey, db::election::Election, db::voter::Voter};

/// A ballot paper, as returned to a voter who presented a valid key.
#[derive(Debug, Serialize, Deserialize)]
pub struct BallotPaper {
    pub title: String,
    pub subtitle: String,
    pub info: String,
    pub form: Option<String>,
    pub ballot: String,
    pub voted: bool,
    /// The submission key, echoed back only when the voter looked their
    /// ballot up with it. A retrieval-key view never reveals it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<BallotKey>,
}

impl BallotPaper {
    pub fn new(election: Election, voter: Voter, reveal_submission_key: bool) -> Self {
        Self {
            title: election.election.title,
            subtitle: election.election.subtitle,
            info: election.election.info,
            form: election.election.form,
            ballot: voter.voter.ballot,
            voted: voter.voter.voted,
            b: reveal_submission_key.then_some(voter.voter.key_b),
        }
    }
}

/// A ballot submission: the write key plus the new content.
#[derive(Debug, Serialize, Deserialize)]
pub struct BallotSubmission {
    pub b: BallotKey,
    pub ballot: String,
}

/// Confirmation returned after a submission is persisted.
#[derive(Debug, Serialize, Deserialize)]
pub struct BallotReceipt {
    pub voted: bool,
    pub ballot: String,
}

/// One entry in the closed-election ballots listing.
///
/// Only the submission key and content are exposed; `key_a` and the record
/// ID stay private so the listing cannot be correlated with anything else.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmittedBallot {
    pub key_b: BallotKey,
    pub ballot: String,
}

impl From<Voter> for SubmittedBallot {
    fn from(voter: Voter) -> Self {
        Self {
            key_b: voter.voter.key_b,
            ballot: voter.voter.ballot,
        }
    }
}
