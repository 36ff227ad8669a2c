use crate::domain::phone::CanonicalPhone;
use serde::{Deserialize, Serialize};

/// One source's view of a contact, before cross-source merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCandidate {
    pub phone: CanonicalPhone,
    pub display_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub source: String,
    pub message_count: u32,
    /// Epoch milliseconds of the earliest message seen for this phone.
    pub first_seen_at: Option<i64>,
    /// Epoch milliseconds of the latest message seen for this phone.
    pub last_seen_at: Option<i64>,
}

/// The deduplicated result of every candidate sharing a canonical phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedContact {
    pub phone: CanonicalPhone,
    pub display_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Contributing source tags, in first-seen order without repeats.
    pub sources: Vec<String>,
    pub message_count: u32,
    pub first_seen_at: Option<i64>,
    pub last_seen_at: Option<i64>,
}

impl MergedContact {
    pub fn from_candidate(candidate: &ContactCandidate) -> Self {
        Self {
            phone: candidate.phone.clone(),
            display_name: candidate.display_name.clone(),
            email: candidate.email.clone(),
            address: candidate.address.clone(),
            sources: vec![candidate.source.clone()],
            message_count: candidate.message_count,
            first_seen_at: candidate.first_seen_at,
            last_seen_at: candidate.last_seen_at,
        }
    }
}
