use crate::domain::{ContactId, ContactRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactListItemDto {
    pub id: ContactId,
    pub phone: String,
    pub display_name: String,
    pub email: Option<String>,
    pub tier: String,
    pub color_tag: String,
    pub message_count: u32,
    pub sources: String,
}

impl From<&ContactRecord> for ContactListItemDto {
    fn from(record: &ContactRecord) -> Self {
        Self {
            id: record.id,
            phone: record.phone.to_string(),
            display_name: record.display_name.clone(),
            email: record.email.clone(),
            tier: record.tier.as_str().to_string(),
            color_tag: record.color_tag.as_str().to_string(),
            message_count: record.message_count,
            sources: record.sources.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationDto {
    pub occurred_at: i64,
    pub direction: String,
    pub message: String,
    pub readable_date: Option<String>,
}
