use crate::domain::ids::ContactId;
use crate::domain::phone::CanonicalPhone;
use crate::error::CoreError;
use crate::rules::tier::{ColorTag, Tier};
use serde::{Deserialize, Serialize};

/// A contact as persisted in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: ContactId,
    pub phone: CanonicalPhone,
    pub display_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub sources: String,
    pub notes: String,
    pub tier: Tier,
    pub color_tag: ColorTag,
    pub is_active: bool,
    pub message_count: u32,
    pub first_seen_at: Option<i64>,
    pub last_seen_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ContactRecord {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.display_name.trim().is_empty() {
            return Err(CoreError::EmptyDisplayName);
        }
        Ok(())
    }
}
