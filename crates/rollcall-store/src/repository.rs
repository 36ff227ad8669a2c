use crate::error::StoreError;
use crate::Store;
use rollcall_core::domain::{CanonicalPhone, CommunicationRecord, ContactId, ContactRecord};
use rollcall_core::{ContactRepository, ContactUpsert, UpsertOutcome};

impl ContactRepository for Store {
    type Error = StoreError;

    fn find_by_phone(&self, phone: &CanonicalPhone) -> Result<Option<ContactRecord>, StoreError> {
        self.contacts().get_by_phone(phone)
    }

    fn upsert_contact(
        &self,
        now_utc: i64,
        contact: &ContactUpsert,
    ) -> Result<UpsertOutcome, StoreError> {
        self.contacts().upsert(now_utc, contact)
    }

    fn find_communication(
        &self,
        contact_id: &ContactId,
        message: &str,
        occurred_at: i64,
    ) -> Result<bool, StoreError> {
        self.communications().exists(contact_id, message, occurred_at)
    }

    fn insert_communication(
        &self,
        now_utc: i64,
        contact_id: &ContactId,
        record: &CommunicationRecord,
    ) -> Result<bool, StoreError> {
        self.communications()
            .insert_if_absent(now_utc, contact_id, record)
    }
}
