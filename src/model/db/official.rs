use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A directory record identifying an election official.
///
/// Officials are reference data for administrators; nothing in the voting
/// flow mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialCore {
    pub name: String,
    pub email: String,
    pub election_id: Id,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified: DateTime<Utc>,
}

/// An official from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Official {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub official: OfficialCore,
}

impl Deref for Official {
    type Target = OfficialCore;

    fn deref(&self) -> &Self::Target {
        &self.official
    }
}
