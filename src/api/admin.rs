use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::OfficialDescription,
            auth::AdminToken,
            election::{ElectionDescription, ElectionSpec, KeyBatch, KeyRequest, StateChange},
        },
        common::ElectionState,
        db::{
            election::{Election, NewElection},
            official::Official,
            voter::{self, NewVoter, Voter},
        },
        mongodb::{Coll, Id},
    },
    Config,
};

use super::common::{assert_is_owner, election_by_id, owned_election_by_id};

pub fn routes() -> Vec<Route> {
    routes![
        get_elections,
        create_election,
        get_election,
        delete_elections,
        generate_keys,
        set_state,
        get_officials,
        purge_voters,
    ]
}

/// List the calling admin's elections.
#[get("/elections")]
async fn get_elections(
    token: AdminToken,
    elections: Coll<Election>,
) -> Result<Json<Vec<ElectionDescription>>> {
    let filter = doc! {
        "owner": token.id(),
    };
    let owned: Vec<Election> = elections.find(filter, None).await?.try_collect().await?;
    Ok(Json(owned.into_iter().map(Into::into).collect()))
}

/// Create a new election in the `SETUP` state, owned by the caller.
#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    token: AdminToken,
    spec: Json<ElectionSpec>,
    new_elections: Coll<NewElection>,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let spec = spec.0;
    let election = NewElection::new(spec.title, spec.subtitle, spec.info, spec.form, token.id());
    let new_id: Id = new_elections
        .insert_one(&election, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    // Retrieve the full election information including ID.
    let election = elections
        .find_one(new_id.as_doc(), None)
        .await?
        .unwrap(); // Valid because we just inserted it
    Ok(Json(election.into()))
}

/// View a single election.
///
/// While an election is running only its owner may see it; once it is
/// closed the description is public, like the ballots listing.
#[get("/elections/<election_id>")]
async fn get_election(
    token: Option<AdminToken>,
    election_id: Id,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let election = election_by_id(election_id, &elections).await?;
    if election.state != ElectionState::Closed {
        let token = token.ok_or_else(|| {
            Error::Status(Status::Unauthorized, "Not logged in".to_string())
        })?;
        assert_is_owner(&election, &token)?;
    }
    Ok(Json(election.into()))
}

/// Delete the listed elections, skipping any the caller does not own.
///
/// Only the election documents are removed here; the orphaned voter records
/// are swept up asynchronously by [`purge_voters`].
#[delete("/elections", data = "<ids>", format = "json")]
async fn delete_elections(
    token: AdminToken,
    ids: Json<Vec<Id>>,
    elections: Coll<Election>,
) -> Result<Json<u64>> {
    info!("Deleting elections {:?}", ids.0);
    let mut deleted = 0;
    for election_id in ids.0 {
        let election = match elections.find_one(election_id.as_doc(), None).await? {
            Some(election) => election,
            None => continue,
        };
        if election.owner != token.id() {
            continue;
        }
        deleted += elections
            .delete_one(election_id.as_doc(), None)
            .await?
            .deleted_count;
    }
    Ok(Json(deleted))
}

/// Generate a batch of voter key pairs for an owned election.
///
/// The batch size is clamped to 500. Insertion is a single non-transactional
/// batch write: if it fails part-way, the voters already written stay
/// written. Only the retrieval keys are returned.
#[post("/elections/<election_id>/keys", data = "<request>", format = "json")]
async fn generate_keys(
    token: AdminToken,
    election_id: Id,
    request: Json<KeyRequest>,
    elections: Coll<Election>,
    new_voters: Coll<NewVoter>,
    config: &State<Config>,
) -> Result<Json<KeyBatch>> {
    let election = owned_election_by_id(election_id, &token, &elections).await?;

    // The scoped block forces `rng` to be dropped before the next `await`.
    let batch = {
        let mut rng = rand::thread_rng();
        voter::generate_batch(election.id, request.n as usize, &mut rng)
    };

    let keys = batch.iter().map(|v| v.key_a.clone()).collect();
    new_voters.insert_many(&batch, None).await?;
    info!(
        "Generated {} voter key pairs for election {}",
        batch.len(),
        election.id
    );

    Ok(Json(KeyBatch {
        vote_url: format!("https://{}/vote", config.hostname()),
        keys,
    }))
}

/// Set the election state.
///
/// Any of the four state names is accepted regardless of the current state;
/// repeating the current state is a no-op apart from the modified timestamp.
/// Anything else is rejected before touching the database.
#[post("/elections/<election_id>/state", data = "<change>", format = "json")]
async fn set_state(
    token: AdminToken,
    election_id: Id,
    change: Json<StateChange>,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let state: ElectionState = change
        .state
        .parse()
        .map_err(|err| Error::Status(Status::BadRequest, format!("{err}")))?;

    let mut election = owned_election_by_id(election_id, &token, &elections).await?;
    election.set_state(state);
    elections
        .replace_one(election_id.as_doc(), &election, None)
        .await?;

    Ok(Json(election.into()))
}

/// The officials directory. Read-only reference data for admins.
#[get("/officials")]
async fn get_officials(
    _token: AdminToken,
    officials: Coll<Official>,
) -> Result<Json<Vec<OfficialDescription>>> {
    let directory: Vec<Official> = officials.find(None, None).await?.try_collect().await?;
    Ok(Json(directory.into_iter().map(Into::into).collect()))
}

/// Internal task: delete voter records whose election no longer exists.
///
/// This is the asynchronous half of election deletion, intended to be
/// invoked by a scheduler rather than interactively.
#[post("/tasks/purge-voters")]
async fn purge_voters(
    _token: AdminToken,
    elections: Coll<Election>,
    voters: Coll<Voter>,
) -> Result<Json<u64>> {
    let live_ids = elections.distinct("_id", None, None).await?;
    let filter = doc! {
        "election_id": {
            "$nin": live_ids,
        }
    };
    let purged = voters.delete_many(filter, None).await?.deleted_count;
    if purged > 0 {
        info!("Purged {purged} voter records from deleted elections");
    }
    Ok(Json(purged))
}
