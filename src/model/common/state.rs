use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// States in the Election lifecycle.
///
/// The intended progression is `SETUP -> PREVIEW -> OPEN -> CLOSED`, but the
/// owner may set any state at any time; see [`ElectionState::may_transition_to`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElectionState {
    /// Under construction, only visible to the owning admin.
    Setup,
    /// Voters can view the ballot form but not vote.
    Preview,
    /// Voters can fetch and submit ballots.
    Open,
    /// Voting over; submitted ballots become publicly listable.
    Closed,
}

impl ElectionState {
    /// Every state of the lifecycle, in the intended order.
    pub const ALL: [ElectionState; 4] = [Self::Setup, Self::Preview, Self::Open, Self::Closed];

    /// The explicit transition table.
    ///
    /// Every jump is permitted, including re-opening a closed election and
    /// setting the current state again (state changes are idempotent). The
    /// owner is trusted to drive the lifecycle; nothing transitions
    /// automatically.
    pub fn may_transition_to(self, next: ElectionState) -> bool {
        match (self, next) {
            (_, Self::Setup) => true,
            (_, Self::Preview) => true,
            (_, Self::Open) => true,
            (_, Self::Closed) => true,
        }
    }
}

/// The given string is not one of the four state names.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid election state {0:?}")]
pub struct InvalidState(pub String);

impl FromStr for ElectionState {
    type Err = InvalidState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SETUP" => Ok(Self::Setup),
            "PREVIEW" => Ok(Self::Preview),
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            other => Err(InvalidState(other.to_string())),
        }
    }
}

impl Display for ElectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Setup => "SETUP",
            Self::Preview => "PREVIEW",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        };
        write!(f, "{name}")
    }
}

impl From<ElectionState> for Bson {
    fn from(state: ElectionState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_states() {
        for state in ElectionState::ALL {
            assert_eq!(state.to_string().parse::<ElectionState>(), Ok(state));
        }
    }

    #[test]
    fn reject_unknown_states() {
        for bad in ["", "setup", "Open", "FINISHED", "CLOSED "] {
            assert_eq!(
                bad.parse::<ElectionState>(),
                Err(InvalidState(bad.to_string()))
            );
        }
    }

    #[test]
    fn any_jump_is_permitted() {
        for from in ElectionState::ALL {
            for to in ElectionState::ALL {
                assert!(from.may_transition_to(to));
            }
        }
    }

    #[test]
    fn serde_uses_uppercase_names() {
        let json = rocket::serde::json::serde_json::to_string(&ElectionState::Setup).unwrap();
        assert_eq!(json, "\"SETUP\"");
        let state: ElectionState =
            rocket::serde::json::serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(state, ElectionState::Closed);
    }
}
