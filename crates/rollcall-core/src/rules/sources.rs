use crate::error::CoreError;

pub const DEFAULT_BACKUP_SOURCE: &str = "SMS Backup";
pub const DEFAULT_TABULAR_SOURCE: &str = "CSV Import";
pub const DEFAULT_MIN_SENDER_LENGTH: usize = 7;
pub const MAX_MIN_SENDER_LENGTH: usize = 15;

pub const DEFAULT_SYSTEM_SENDERS: &[&str] = &[
    "TIGOPESA",
    "Tigo Packs",
    "CRDB BANK",
    "JIHUDUMIE",
    "15670",
    "SILENTOCEAN",
    "B2B DATA",
    "MIXX BY YAS",
];

pub fn validate_source_tag(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidSourceTag);
    }
    Ok(trimmed.to_string())
}

/// Recognizes service senders (banks, mobile money, carrier short codes)
/// whose messages say nothing about a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderFilter {
    denylist: Vec<String>,
    min_length: usize,
}

impl Default for SenderFilter {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_SYSTEM_SENDERS
                .iter()
                .map(|sender| denylist_key(sender))
                .collect(),
            min_length: DEFAULT_MIN_SENDER_LENGTH,
        }
    }
}

impl SenderFilter {
    pub fn new<I, S>(denylist: I, min_length: usize) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if min_length == 0 || min_length > MAX_MIN_SENDER_LENGTH {
            return Err(CoreError::InvalidSenderLength(min_length));
        }

        let mut keys: Vec<String> = Vec::new();
        for sender in denylist {
            let key = denylist_key(sender.as_ref());
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }

        Ok(Self {
            denylist: keys,
            min_length,
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Denylisted names match case-insensitively; numeric-only addresses
    /// shorter than `min_length` digits are short codes.
    pub fn is_system_sender(&self, address: &str) -> bool {
        let key = denylist_key(address);
        if key.is_empty() {
            return true;
        }
        if self.denylist.iter().any(|entry| entry == &key) {
            return true;
        }

        let compact: String = address
            .chars()
            .filter(|ch| !ch.is_whitespace() && !matches!(ch, '+' | '-'))
            .collect();
        !compact.is_empty()
            && compact.bytes().all(|b| b.is_ascii_digit())
            && compact.len() < self.min_length
    }
}

fn denylist_key(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_denylist_matches_case_insensitively() {
        let filter = SenderFilter::default();
        assert!(filter.is_system_sender("TIGOPESA"));
        assert!(filter.is_system_sender("Tigopesa"));
        assert!(filter.is_system_sender(" crdb  bank "));
        assert!(!filter.is_system_sender("0755111111"));
    }

    #[test]
    fn short_numeric_addresses_are_short_codes() {
        let filter = SenderFilter::default();
        assert!(filter.is_system_sender("15300"));
        assert!(filter.is_system_sender("100"));
        assert!(!filter.is_system_sender("712345678"));
        assert!(!filter.is_system_sender("+255 755 111 111"));
        assert!(filter.is_system_sender(""));
    }

    #[test]
    fn custom_filter_validates_length() {
        assert!(SenderFilter::new(["BANK"], 0).is_err());
        let filter = SenderFilter::new(["My Bank", "my bank"], 4).expect("filter");
        assert!(filter.is_system_sender("MY BANK"));
        assert!(!filter.is_system_sender("15300"));
        assert!(filter.is_system_sender("153"));
    }

    #[test]
    fn source_tags_must_not_be_blank() {
        assert_eq!(validate_source_tag("  Referral "), Ok("Referral".to_string()));
        assert!(validate_source_tag("   ").is_err());
    }
}
