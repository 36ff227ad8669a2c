use crate::domain::phone::{CanonicalPhone, PhoneRules};

pub const UNKNOWN_CONTACT: &str = "Unknown Contact";

const PLACEHOLDER_NAMES: &[&str] = &["unknown contact", "unknown", "(unknown)"];
const SYNTHESIZED_PREFIX: &str = "Contact ";
const SYNTHESIZED_SUFFIX: &str = "***";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePick {
    Held,
    Incoming,
}

/// True for names that carry no identity: blank, the unknown markers used by
/// phone exports, and names synthesized from a phone number.
pub fn is_placeholder_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return true;
    }
    if PLACEHOLDER_NAMES
        .iter()
        .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
    {
        return true;
    }
    is_synthesized_name(trimmed)
}

/// Placeholder derived from the first national digits, e.g. `Contact 712***`.
pub fn synthesized_name(phone: &CanonicalPhone, rules: &PhoneRules) -> String {
    let national = phone
        .digits()
        .get(rules.country_code().len()..)
        .unwrap_or_default();
    let head: String = national.chars().take(3).collect();
    if head.is_empty() {
        return UNKNOWN_CONTACT.to_string();
    }
    format!("{SYNTHESIZED_PREFIX}{head}{SYNTHESIZED_SUFFIX}")
}

/// Keeps letters, digits, spaces, `-` and `.`; falls back to
/// [`UNKNOWN_CONTACT`] when nothing survives.
pub fn sanitize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("unknown") {
        return UNKNOWN_CONTACT.to_string();
    }

    let kept: String = trimmed
        .chars()
        .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
        .filter(|ch| ch.is_alphanumeric() || matches!(ch, ' ' | '-' | '.'))
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        UNKNOWN_CONTACT.to_string()
    } else {
        collapsed
    }
}

/// Name preference used when two views of a contact meet.
///
/// A real name beats a placeholder. Between two real names the longer one
/// wins; on equal length the held name stays, so whichever source was
/// processed first has priority. This is a heuristic and is not commutative
/// once three or more sources disagree with equal-length names.
pub fn choose_name(held: &str, incoming: &str) -> NamePick {
    match (is_placeholder_name(held), is_placeholder_name(incoming)) {
        (true, false) => NamePick::Incoming,
        (_, true) => NamePick::Held,
        (false, false) => {
            if incoming.trim().chars().count() > held.trim().chars().count() {
                NamePick::Incoming
            } else {
                NamePick::Held
            }
        }
    }
}

fn is_synthesized_name(name: &str) -> bool {
    name.strip_prefix(SYNTHESIZED_PREFIX)
        .and_then(|rest| rest.strip_suffix(SYNTHESIZED_SUFFIX))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::phone::normalize_phone;

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder_name(""));
        assert!(is_placeholder_name("   "));
        assert!(is_placeholder_name("Unknown Contact"));
        assert!(is_placeholder_name("(Unknown)"));
        assert!(is_placeholder_name("Contact 755***"));
        assert!(!is_placeholder_name("Amani"));
        assert!(!is_placeholder_name("Contact Centre"));
    }

    #[test]
    fn synthesized_name_uses_national_digits() {
        let phone = normalize_phone("0755111111").unwrap();
        let name = synthesized_name(&phone, &PhoneRules::default());
        assert_eq!(name, "Contact 755***");
        assert!(is_placeholder_name(&name));
    }

    #[test]
    fn sanitize_name_strips_disallowed_characters() {
        assert_eq!(sanitize_name("  Mama Neema 🌸 "), "Mama Neema");
        assert_eq!(sanitize_name("J.-P. O'Neil"), "J.-P. ONeil");
        assert_eq!(sanitize_name("Shop|Kariakoo"), "ShopKariakoo");
    }

    #[test]
    fn sanitize_name_falls_back_to_placeholder() {
        assert_eq!(sanitize_name(""), UNKNOWN_CONTACT);
        assert_eq!(sanitize_name("😀😀"), UNKNOWN_CONTACT);
        assert_eq!(sanitize_name("unknown"), UNKNOWN_CONTACT);
    }

    #[test]
    fn choose_name_prefers_real_names() {
        assert_eq!(choose_name("Unknown Contact", "Amani"), NamePick::Incoming);
        assert_eq!(choose_name("Amani", "Unknown Contact"), NamePick::Held);
        assert_eq!(choose_name("Amani", ""), NamePick::Held);
        assert_eq!(choose_name("Contact 755***", "Unknown"), NamePick::Held);
    }

    #[test]
    fn choose_name_prefers_longer_and_keeps_held_on_ties() {
        assert_eq!(choose_name("Amani", "Amani Juma"), NamePick::Incoming);
        assert_eq!(choose_name("Amani Juma", "Amani"), NamePick::Held);
        assert_eq!(choose_name("Baraka", "Zawadi"), NamePick::Held);
    }
}
