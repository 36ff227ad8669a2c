use crate::domain::MergedContact;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

pub const PLATINUM_MIN_ACTIVITY: u32 = 50;
pub const GOLD_MIN_ACTIVITY: u32 = 20;
pub const SILVER_MIN_ACTIVITY: u32 = 10;
/// Contacts with more messages than this are tagged as customers.
pub const PURCHASED_ACTIVITY_THRESHOLD: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            "platinum" => Ok(Tier::Platinum),
            other => Err(CoreError::InvalidTier(other.to_string())),
        }
    }
}

/// Sales stage recorded on first import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    New,
    Purchased,
}

impl ColorTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            ColorTag::New => "new",
            ColorTag::Purchased => "purchased",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "new" => Ok(ColorTag::New),
            "purchased" => Ok(ColorTag::Purchased),
            other => Err(CoreError::InvalidColorTag(other.to_string())),
        }
    }
}

pub fn color_tag_for_activity(message_count: u32) -> ColorTag {
    if message_count > PURCHASED_ACTIVITY_THRESHOLD {
        ColorTag::Purchased
    } else {
        ColorTag::New
    }
}

pub fn tier_for_activity(message_count: u32) -> Tier {
    if message_count >= PLATINUM_MIN_ACTIVITY {
        Tier::Platinum
    } else if message_count >= GOLD_MIN_ACTIVITY {
        Tier::Gold
    } else if message_count >= SILVER_MIN_ACTIVITY {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// Freeform notes recorded on first import.
pub fn initial_notes(contact: &MergedContact) -> String {
    let mut notes = Vec::new();
    if !contact.sources.is_empty() {
        notes.push(format!("Imported from: {}", contact.sources.join(", ")));
    }
    if contact.message_count > 0 {
        notes.push(format!("SMS messages: {}", contact.message_count));
    }
    notes.join(". ")
}
