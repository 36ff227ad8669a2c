use crate::error::invalid_input;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use rollcall_core::domain::{CanonicalPhone, PhoneRules};

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

/// Message timestamps are epoch milliseconds.
pub fn format_millis_datetime(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn parse_phone(raw: &str, rules: &PhoneRules) -> Result<CanonicalPhone> {
    rules
        .normalize(raw)
        .filter(|phone| rules.is_domestic(phone))
        .ok_or_else(|| invalid_input(format!("invalid phone number: {}", raw.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_phone_accepts_local_formats() {
        let rules = PhoneRules::default();
        let phone = parse_phone("0755 111 111", &rules).expect("phone");
        assert_eq!(phone.as_str(), "+255755111111");
        assert!(parse_phone("12345", &rules).is_err());
    }

    #[test]
    fn millis_out_of_range_render_as_dash() {
        assert_eq!(format_millis_datetime(i64::MAX), "-");
    }
}
