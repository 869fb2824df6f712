use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::ballot::{BallotPaper, BallotReceipt, BallotSubmission, SubmittedBallot},
        common::BallotKey,
        db::{election::Election, voter::Voter},
        mongodb::{Coll, Id},
    },
};

use super::common::{assert_closed, election_by_id};

pub fn routes() -> Vec<Route> {
    routes![get_ballot, submit_ballot, get_ballots]
}

/// Fetch a ballot paper by either key.
///
/// The retrieval key grants read-only access: the response then omits the
/// submission key. No login is involved; holding a key is the capability.
#[get("/vote?<a>&<b>")]
async fn get_ballot(
    a: Option<BallotKey>,
    b: Option<BallotKey>,
    voters: Coll<Voter>,
    elections: Coll<Election>,
) -> Result<Json<BallotPaper>> {
    let (filter, by_submission_key) = match (&a, &b) {
        (Some(key_a), _) => (doc! { "key_a": key_a }, false),
        (None, Some(key_b)) => (doc! { "key_b": key_b }, true),
        (None, None) => {
            return Err(Error::Status(
                Status::NotFound,
                "No voter key provided".to_string(),
            ))
        }
    };

    let voter = voters
        .find_one(filter, None)
        .await?
        .ok_or_else(|| Error::not_found("Ballot for the given key"))?;
    let election = election_by_id(voter.election_id, &elections).await?;

    Ok(Json(BallotPaper::new(election, voter, by_submission_key)))
}

/// Submit (or overwrite) a ballot using the submission key.
///
/// Resubmission is allowed and replaces the previous content; submitting
/// empty content withdraws the vote. Last write wins.
#[post("/vote", data = "<submission>", format = "json")]
async fn submit_ballot(
    submission: Json<BallotSubmission>,
    voters: Coll<Voter>,
) -> Result<Json<BallotReceipt>> {
    let submission = submission.0;
    let filter = doc! { "key_b": &submission.b };
    let mut voter = voters
        .find_one(filter.clone(), None)
        .await?
        .ok_or_else(|| Error::not_found("Ballot for the given key"))?;

    voter.submit_ballot(submission.ballot);
    voters.replace_one(filter, &voter, None).await?;

    Ok(Json(BallotReceipt {
        voted: voter.voted,
        ballot: voter.voter.ballot,
    }))
}

/// List the cast ballots of a closed election, ordered by submission key.
///
/// Each entry exposes only `key_b` and the content, so the listing cannot be
/// correlated with the distributed retrieval keys or any voter identity.
#[get("/elections/<election_id>/ballots")]
async fn get_ballots(
    election_id: Id,
    elections: Coll<Election>,
    voters: Coll<Voter>,
) -> Result<Json<Vec<SubmittedBallot>>> {
    let election = election_by_id(election_id, &elections).await?;
    assert_closed(&election)?;

    let filter = doc! {
        "election_id": election.id,
        "voted": true,
    };
    let options = FindOptions::builder().sort(doc! { "key_b": 1 }).build();
    let cast: Vec<Voter> = voters.find(filter, options).await?.try_collect().await?;

    Ok(Json(cast.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use rocket::serde::json::serde_json;

    use crate::model::{
        api::election::KeyBatch,
        common::ElectionState,
        db::{election::ElectionCore, voter::generate_batch},
    };

    use super::*;

    /// The whole lifecycle at the model layer: keys are generated during
    /// setup, a voter discovers their submission key and casts a ballot once
    /// the election opens, and closing the election makes exactly the cast
    /// ballots listable without exposing any retrieval key.
    #[test]
    fn lifecycle_from_key_generation_to_public_listing() {
        let mut rng = StdRng::seed_from_u64(2024);
        let owner = Id::new();
        let mut election = Election {
            id: Id::new(),
            election: ElectionCore::example(owner),
        };
        assert_eq!(election.state, ElectionState::Setup);

        // Key generation: the admin's response carries every `key_a` and
        // no `key_b`.
        let batch = generate_batch(election.id, 3, &mut rng);
        let key_batch = KeyBatch {
            vote_url: "https://example.com/vote".to_string(),
            keys: batch.iter().map(|v| v.key_a.clone()).collect(),
        };
        let response = serde_json::to_string(&key_batch).unwrap();
        for voter in &batch {
            assert!(response.contains(voter.key_a.as_str()));
            assert!(!response.contains(voter.key_b.as_str()));
        }

        let mut voters: Vec<Voter> = batch
            .into_iter()
            .map(|voter| Voter {
                id: Id::new(),
                voter,
            })
            .collect();

        election.set_state(ElectionState::Open);

        // Looking the ballot up by `key_a` never reveals the submission key.
        let key_a = voters[1].key_a.clone();
        let found = voters.iter().find(|v| v.key_a == key_a).unwrap();
        let paper = BallotPaper::new(
            Election {
                id: election.id,
                election: election.election.clone(),
            },
            Voter {
                id: found.id,
                voter: found.voter.clone(),
            },
            false,
        );
        assert!(!paper.voted);
        assert!(paper.b.is_none());
        let paper_json = serde_json::to_string(&paper).unwrap();
        assert!(!paper_json.contains("\"b\""));

        // Looking it up by `key_b` echoes the key back; that is how the
        // voter learns it in the first place.
        let key_b = voters[1].key_b.clone();
        let paper = BallotPaper::new(
            Election {
                id: election.id,
                election: election.election.clone(),
            },
            Voter {
                id: found.id,
                voter: found.voter.clone(),
            },
            true,
        );
        assert_eq!(paper.b, Some(key_b.clone()));

        // Cast a ballot with the submission key.
        let voter = voters.iter_mut().find(|v| v.key_b == key_b).unwrap();
        voter.submit_ballot("Alice for chair".to_string());

        // The listing is denied until the election closes.
        assert!(assert_closed(&election).is_err());
        election.set_state(ElectionState::Closed);
        assert!(assert_closed(&election).is_ok());

        // Only the cast ballot appears, keyed by `key_b`, ordered, and with
        // no retrieval key anywhere in the output.
        let key_a_values: Vec<String> = voters.iter().map(|v| v.key_a.to_string()).collect();
        let mut cast: Vec<Voter> = voters.into_iter().filter(|v| v.voted).collect();
        cast.sort_by(|x, y| x.key_b.cmp(&y.key_b));
        let listing: Vec<SubmittedBallot> = cast.into_iter().map(Into::into).collect();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].key_b, key_b);
        assert_eq!(listing[0].ballot, "Alice for chair");
        let listing_json = serde_json::to_string(&listing).unwrap();
        for key_a in key_a_values {
            assert!(!listing_json.contains(&key_a));
        }
    }
}
