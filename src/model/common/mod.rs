pub mod key;
pub mod state;

pub use key::BallotKey;
pub use state::ElectionState;
