pub mod admin;
pub mod election;
pub mod official;
pub mod voter;
