pub mod domain;
pub mod dto;
pub mod error;
pub mod merge;
pub mod repository;
pub mod rules;

pub use domain::*;
pub use dto::*;
pub use error::CoreError;
pub use merge::{merge_candidates, MergeOutcome, MergeStats};
pub use repository::{ContactRepository, ContactUpsert, UpsertOutcome};
pub use rules::*;
