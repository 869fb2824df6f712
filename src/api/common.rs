//! Authorization predicates shared between handlers.
//!
//! Each guard checks exactly one thing and either allows the request to
//! proceed or denies it with an explicit status and reason. Being logged in
//! at all is checked separately by the [`AdminToken`] request guard.

use crate::error::{Error, Result};
use crate::model::{
    api::auth::AdminToken,
    common::ElectionState,
    db::election::Election,
    mongodb::{Coll, Id},
};

/// Look up an election, or deny with 404.
pub async fn election_by_id(election_id: Id, elections: &Coll<Election>) -> Result<Election> {
    elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {}", election_id)))
}

/// Allow only the election's owner, or deny with 403.
pub fn assert_is_owner(election: &Election, token: &AdminToken) -> Result<()> {
    if election.owner == token.id() {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "Election {} does not belong to you",
            election.id
        )))
    }
}

/// Allow only once the election is closed, or deny with 403.
pub fn assert_closed(election: &Election) -> Result<()> {
    if election.state == ElectionState::Closed {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "Election {} is not closed; ballots are not yet visible",
            election.id
        )))
    }
}

/// Look up an election and check ownership in one step.
pub async fn owned_election_by_id(
    election_id: Id,
    token: &AdminToken,
    elections: &Coll<Election>,
) -> Result<Election> {
    let election = election_by_id(election_id, elections).await?;
    assert_is_owner(&election, token)?;
    Ok(election)
}
