use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_COUNTRY_CODE: &str = "255";
pub const DEFAULT_TRUNK_PREFIX: &str = "0";
pub const DEFAULT_NATIONAL_LENGTH: usize = 9;

const MAX_COUNTRY_CODE_LEN: usize = 3;
const MIN_NATIONAL_LENGTH: usize = 4;
const MAX_NATIONAL_LENGTH: usize = 14;

/// A phone number in `+<country code><national number>` form.
///
/// Only [`PhoneRules::normalize`] and [`CanonicalPhone::parse`] construct one,
/// so the inner string is always a `+` followed by ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalPhone(String);

impl CanonicalPhone {
    /// Accepts a value that is already canonical (as stored in the repository).
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let trimmed = value.trim();
        let Some(digits) = trimmed.strip_prefix('+') else {
            return Err(CoreError::InvalidPhone(value.to_string()));
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidPhone(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digits(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for CanonicalPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CanonicalPhone {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CanonicalPhone> for String {
    fn from(value: CanonicalPhone) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRules {
    country_code: String,
    trunk_prefix: String,
    national_length: usize,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            trunk_prefix: DEFAULT_TRUNK_PREFIX.to_string(),
            national_length: DEFAULT_NATIONAL_LENGTH,
        }
    }
}

impl PhoneRules {
    pub fn new(
        country_code: &str,
        trunk_prefix: &str,
        national_length: usize,
    ) -> Result<Self, CoreError> {
        let country_code = country_code.trim().trim_start_matches('+');
        if country_code.is_empty()
            || country_code.len() > MAX_COUNTRY_CODE_LEN
            || !country_code.bytes().all(|b| b.is_ascii_digit())
            || country_code.starts_with('0')
        {
            return Err(CoreError::InvalidCountryCode(country_code.to_string()));
        }

        // Canonical digits start with the country code, so a prefix
        // overlapping it would be stripped on a second pass.
        let trunk_prefix = trunk_prefix.trim();
        if trunk_prefix.is_empty()
            || !trunk_prefix.bytes().all(|b| b.is_ascii_digit())
            || country_code.starts_with(trunk_prefix)
            || trunk_prefix.starts_with(country_code)
        {
            return Err(CoreError::InvalidTrunkPrefix(trunk_prefix.to_string()));
        }

        if !(MIN_NATIONAL_LENGTH..=MAX_NATIONAL_LENGTH).contains(&national_length) {
            return Err(CoreError::InvalidNationalLength(national_length));
        }

        Ok(Self {
            country_code: country_code.to_string(),
            trunk_prefix: trunk_prefix.to_string(),
            national_length,
        })
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn trunk_prefix(&self) -> &str {
        &self.trunk_prefix
    }

    pub fn national_length(&self) -> usize {
        self.national_length
    }

    /// Rewrites `raw` into canonical form, or `None` when no rule applies.
    ///
    /// Rules are tried in order: trunk prefix, bare national number, country
    /// code already present. Whatever the rule, the result must carry the
    /// country code and exactly `national_length` national digits.
    pub fn normalize(&self, raw: &str) -> Option<CanonicalPhone> {
        let digits: String = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }

        let rewritten = if let Some(rest) = digits.strip_prefix(self.trunk_prefix.as_str()) {
            format!("{}{}", self.country_code, rest)
        } else if digits.len() == self.national_length {
            format!("{}{}", self.country_code, digits)
        } else if digits.starts_with(self.country_code.as_str()) {
            digits
        } else {
            return None;
        };

        if rewritten.len() != self.expected_len() || !rewritten.starts_with(&self.country_code) {
            return None;
        }

        Some(CanonicalPhone(format!("+{rewritten}")))
    }

    pub fn is_domestic(&self, phone: &CanonicalPhone) -> bool {
        let digits = phone.digits();
        digits.len() == self.expected_len() && digits.starts_with(&self.country_code)
    }

    /// `+255 712 345 678` style grouping of the national number.
    pub fn format_for_display(&self, phone: &CanonicalPhone) -> String {
        if !self.is_domestic(phone) {
            return phone.to_string();
        }
        let national = &phone.digits()[self.country_code.len()..];
        let mut out = format!("+{}", self.country_code);
        for chunk in national.as_bytes().chunks(3) {
            out.push(' ');
            out.push_str(&String::from_utf8_lossy(chunk));
        }
        out
    }

    fn expected_len(&self) -> usize {
        self.country_code.len() + self.national_length
    }
}

pub fn normalize_phone(raw: &str) -> Option<CanonicalPhone> {
    PhoneRules::default().normalize(raw)
}
