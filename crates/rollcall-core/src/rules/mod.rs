pub mod sources;
pub mod tier;

pub use sources::{
    validate_source_tag, SenderFilter, DEFAULT_BACKUP_SOURCE, DEFAULT_MIN_SENDER_LENGTH,
    DEFAULT_SYSTEM_SENDERS, DEFAULT_TABULAR_SOURCE,
};
pub use tier::{color_tag_for_activity, initial_notes, tier_for_activity, ColorTag, Tier};
