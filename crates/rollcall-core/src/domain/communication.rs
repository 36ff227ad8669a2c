use crate::domain::phone::CanonicalPhone;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    /// Backup direction codes: `1` is an inbox message, every other box
    /// (sent, outbox, draft, failed, queued) originates locally.
    pub fn from_backup_code(code: &str) -> Self {
        match code.trim() {
            "1" => Direction::Received,
            _ => Direction::Sent,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Received => "received",
            Direction::Sent => "sent",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "received" => Ok(Direction::Received),
            "sent" => Ok(Direction::Sent),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}

/// One historical message recovered from a message backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationRecord {
    pub phone: CanonicalPhone,
    pub message: String,
    pub direction: Direction,
    /// Epoch milliseconds.
    pub occurred_at: i64,
    pub contact_name: Option<String>,
    pub readable_date: Option<String>,
}
