use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{common::ElectionState, mongodb::Id};

/// Core election data, as stored in the database.
///
/// A new election always starts in `SETUP`, owned by the admin who created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    pub title: String,
    pub subtitle: String,
    pub info: String,
    /// The ballot form definition, once the owner has written one.
    pub form: Option<String>,
    pub state: ElectionState,
    /// The admin who created this election; the only identity allowed to
    /// manage it.
    pub owner: Id,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified: DateTime<Utc>,
}

impl ElectionCore {
    /// Create a new election in the `SETUP` state.
    pub fn new(
        title: String,
        subtitle: String,
        info: String,
        form: Option<String>,
        owner: Id,
    ) -> Self {
        let now = Utc::now();
        Self {
            title,
            subtitle,
            info,
            form,
            state: ElectionState::Setup,
            owner,
            created: now,
            modified: now,
        }
    }

    /// Move to the given state. Always allowed; see
    /// [`ElectionState::may_transition_to`].
    pub fn set_state(&mut self, state: ElectionState) {
        debug_assert!(self.state.may_transition_to(state));
        self.state = state;
        self.modified = Utc::now();
    }
}

/// An election without an ID.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ElectionCore {
        pub fn example(owner: Id) -> Self {
            Self::new(
                "Committee Election".to_string(),
                "Annual general meeting".to_string(),
                "Vote for the new committee.".to_string(),
                None,
                owner,
            )
        }
    }

    #[test]
    fn new_elections_start_in_setup() {
        let election = ElectionCore::example(Id::new());
        assert_eq!(election.state, ElectionState::Setup);
        assert_eq!(election.created, election.modified);
    }

    #[test]
    fn set_state_touches_modified() {
        let mut election = ElectionCore::example(Id::new());
        let created = election.created;
        election.set_state(ElectionState::Open);
        assert_eq!(election.state, ElectionState::Open);
        assert!(election.modified >= created);

        // Re-applying the same state is permitted.
        election.set_state(ElectionState::Open);
        assert_eq!(election.state, ElectionState::Open);

        // As is jumping backwards.
        election.set_state(ElectionState::Setup);
        assert_eq!(election.state, ElectionState::Setup);
    }
}
