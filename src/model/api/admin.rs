use serde::{Deserialize, Serialize};

/// Login credentials for an admin account.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// A directory listing entry for an election official.
#[derive(Debug, Serialize, Deserialize)]
pub struct OfficialDescription {
    pub name: String,
    pub email: String,
}

impl From<crate::model::db::official::Official> for OfficialDescription {
    fn from(official: crate::model::db::official::Official) -> Self {
        Self {
            name: official.official.name,
            email: official.official.email,
        }
    }
}
