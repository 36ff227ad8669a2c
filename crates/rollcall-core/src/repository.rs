use crate::domain::{CanonicalPhone, CommunicationRecord, ContactId, ContactRecord, MergedContact};
use crate::rules::{color_tag_for_activity, initial_notes, tier_for_activity, ColorTag, Tier};

/// Write model for [`ContactRepository::upsert_contact`].
///
/// Everything except the display name and email is only written when the
/// phone is new; an existing record keeps its classification and activity
/// fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUpsert {
    pub phone: CanonicalPhone,
    pub display_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub sources: String,
    pub notes: String,
    pub tier: Tier,
    pub color_tag: ColorTag,
    pub message_count: u32,
    pub first_seen_at: Option<i64>,
    pub last_seen_at: Option<i64>,
}

impl ContactUpsert {
    pub fn from_merged(contact: &MergedContact) -> Self {
        Self {
            phone: contact.phone.clone(),
            display_name: contact.display_name.clone(),
            email: contact.email.clone(),
            address: contact.address.clone(),
            sources: contact.sources.join(", "),
            notes: initial_notes(contact),
            tier: tier_for_activity(contact.message_count),
            color_tag: color_tag_for_activity(contact.message_count),
            message_count: contact.message_count,
            first_seen_at: contact.first_seen_at,
            last_seen_at: contact.last_seen_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(ContactRecord),
    Updated(ContactRecord),
}

impl UpsertOutcome {
    pub fn record(&self) -> &ContactRecord {
        match self {
            UpsertOutcome::Inserted(record) | UpsertOutcome::Updated(record) => record,
        }
    }

    pub fn into_record(self) -> ContactRecord {
        match self {
            UpsertOutcome::Inserted(record) | UpsertOutcome::Updated(record) => record,
        }
    }
}

/// Destination of an import run: a store with a unique key on canonical phone
/// and on (contact, message, timestamp) for communications.
pub trait ContactRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    fn find_by_phone(&self, phone: &CanonicalPhone) -> Result<Option<ContactRecord>, Self::Error>;

    /// Inserts or updates the contact keyed by phone as one atomic step.
    ///
    /// On update only the display name (never replaced by a placeholder),
    /// email (only when one is supplied) and `updated_at` change; no other
    /// stored field is touched.
    fn upsert_contact(
        &self,
        now_utc: i64,
        contact: &ContactUpsert,
    ) -> Result<UpsertOutcome, Self::Error>;

    fn find_communication(
        &self,
        contact_id: &ContactId,
        message: &str,
        occurred_at: i64,
    ) -> Result<bool, Self::Error>;

    /// Conditional insert; returns `false` when the record already exists.
    fn insert_communication(
        &self,
        now_utc: i64,
        contact_id: &ContactId,
        record: &CommunicationRecord,
    ) -> Result<bool, Self::Error>;
}
