pub mod candidate;
pub mod communication;
pub mod contact;
pub mod ids;
pub mod name;
pub mod phone;

pub use candidate::{ContactCandidate, MergedContact};
pub use communication::{CommunicationRecord, Direction};
pub use contact::ContactRecord;
pub use ids::{CommunicationId, ContactId};
pub use name::{
    choose_name, is_placeholder_name, sanitize_name, synthesized_name, NamePick, UNKNOWN_CONTACT,
};
pub use phone::{normalize_phone, CanonicalPhone, PhoneRules};
