//! Extraction from "SMS Backup & Restore" style XML exports.
//!
//! The document is a single `<smses>` root holding one `<sms>` element per
//! message, with everything of interest carried in attributes.

use crate::error::{Result, SourceKind, SyncError};
use crate::source::read_document;
use quick_xml::escape::unescape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rollcall_core::domain::{
    is_placeholder_name, synthesized_name, CanonicalPhone, CommunicationRecord, ContactCandidate,
    Direction, PhoneRules,
};
use rollcall_core::rules::{SenderFilter, DEFAULT_BACKUP_SOURCE};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::debug;

const ROOT_ELEMENT: &[u8] = b"smses";
const MESSAGE_ELEMENT: &[u8] = b"sms";

const SURROGATES: RangeInclusive<u32> = 0xD800..=0xDFFF;
const HIGH_SURROGATES: RangeInclusive<u32> = 0xD800..=0xDBFF;
const LOW_SURROGATES: RangeInclusive<u32> = 0xDC00..=0xDFFF;

#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub rules: PhoneRules,
    pub senders: SenderFilter,
    pub source_tag: String,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            rules: PhoneRules::default(),
            senders: SenderFilter::default(),
            source_tag: DEFAULT_BACKUP_SOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub total_messages: usize,
    pub system_messages: usize,
    pub rejected_phones: usize,
    pub malformed_records: usize,
    /// Repeats of a message already read (same phone, body and date).
    pub duplicate_messages: usize,
}

#[derive(Debug, Clone)]
pub struct BackupExtract {
    /// One candidate per distinct phone, in order of first appearance.
    pub candidates: Vec<ContactCandidate>,
    pub communications: Vec<CommunicationRecord>,
    pub stats: ExtractStats,
}

pub fn read_backup(path: &Path, options: &BackupOptions) -> Result<BackupExtract> {
    let data = read_document(path, SourceKind::Backup)?;
    let extract = parse_backup(&data, options)?;
    debug!(
        path = %path.display(),
        contacts = extract.candidates.len(),
        messages = extract.communications.len(),
        "parsed message backup"
    );
    Ok(extract)
}

pub fn parse_backup(data: &str, options: &BackupOptions) -> Result<BackupExtract> {
    let mut reader = Reader::from_str(data);
    let mut aggregator = Aggregator::new(options);
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref element)) => {
                if depth == 0 {
                    open_root(element, &mut saw_root)?;
                } else if depth == 1 && is_message(element) {
                    aggregator.push(RawMessage::from_element(element)?);
                }
                depth += 1;
            }
            Ok(Event::Empty(ref element)) => {
                if depth == 0 {
                    open_root(element, &mut saw_root)?;
                } else if depth == 1 && is_message(element) {
                    aggregator.push(RawMessage::from_element(element)?);
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(malformed(err.to_string())),
        }
    }

    if !saw_root {
        return Err(malformed("missing <smses> root element"));
    }
    if depth != 0 {
        return Err(malformed("document ended inside an open element"));
    }

    Ok(aggregator.finish())
}

fn open_root(element: &BytesStart<'_>, saw_root: &mut bool) -> Result<()> {
    if *saw_root {
        return Err(malformed("more than one root element"));
    }
    if !element.local_name().as_ref().eq_ignore_ascii_case(ROOT_ELEMENT) {
        return Err(malformed(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(element.name().as_ref())
        )));
    }
    *saw_root = true;
    Ok(())
}

fn is_message(element: &BytesStart<'_>) -> bool {
    element
        .local_name()
        .as_ref()
        .eq_ignore_ascii_case(MESSAGE_ELEMENT)
}

fn malformed(reason: impl Into<String>) -> SyncError {
    SyncError::malformed(SourceKind::Backup, reason)
}

#[derive(Debug, Default)]
struct RawMessage {
    address: Option<String>,
    body: Option<String>,
    date: Option<String>,
    kind: Option<String>,
    contact_name: Option<String>,
    readable_date: Option<String>,
}

impl RawMessage {
    fn from_element(element: &BytesStart<'_>) -> Result<Self> {
        let mut raw = RawMessage::default();
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|err| malformed(err.to_string()))?;
            let slot = match attribute.key.local_name().as_ref() {
                b"address" => &mut raw.address,
                b"body" => &mut raw.body,
                b"date" => &mut raw.date,
                b"type" => &mut raw.kind,
                b"contact_name" => &mut raw.contact_name,
                b"readable_date" => &mut raw.readable_date,
                _ => continue,
            };
            *slot = Some(attribute_value(&attribute));
        }
        Ok(raw)
    }
}

/// Android exports encode emoji as pairs of UTF-16 surrogate references
/// (`&#55357;&#56832;`), which are not valid XML characters. Pairs are joined
/// into the character they encode; a lone surrogate is kept as written.
fn attribute_value(attribute: &Attribute<'_>) -> String {
    let raw = String::from_utf8_lossy(&attribute.value);
    let joined = join_surrogate_references(&raw);
    match unescape(&joined) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn join_surrogate_references(raw: &str) -> Cow<'_, str> {
    if !raw.contains("&#") {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("&#") {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let Some((high, high_len)) = char_reference(rest) else {
            out.push_str("&#");
            rest = &rest[2..];
            continue;
        };
        if !SURROGATES.contains(&high) {
            out.push_str(&rest[..high_len]);
            rest = &rest[high_len..];
            continue;
        }

        let pair = char_reference(&rest[high_len..])
            .filter(|(low, _)| HIGH_SURROGATES.contains(&high) && LOW_SURROGATES.contains(low))
            .and_then(|(low, low_len)| {
                let scalar = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(scalar).map(|ch| (ch, low_len))
            });
        match pair {
            Some((ch, low_len)) => {
                out.push(ch);
                rest = &rest[high_len + low_len..];
            }
            None => {
                out.push_str("&amp;");
                out.push_str(&rest[1..high_len]);
                rest = &rest[high_len..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Parses a leading `&#NNN;` or `&#xHHH;`, returning the code and its length.
fn char_reference(text: &str) -> Option<(u32, usize)> {
    let body = text.strip_prefix("&#")?;
    let end = body.find(';')?;
    let digits = &body[..end];
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().ok()?
        }
        _ => return None,
    };
    Some((code, end + 3))
}

struct Aggregator<'a> {
    options: &'a BackupOptions,
    positions: HashMap<CanonicalPhone, usize>,
    seen: HashSet<(CanonicalPhone, String, i64)>,
    candidates: Vec<ContactCandidate>,
    communications: Vec<CommunicationRecord>,
    stats: ExtractStats,
}

impl<'a> Aggregator<'a> {
    fn new(options: &'a BackupOptions) -> Self {
        Self {
            options,
            positions: HashMap::new(),
            seen: HashSet::new(),
            candidates: Vec::new(),
            communications: Vec::new(),
            stats: ExtractStats::default(),
        }
    }

    fn push(&mut self, raw: RawMessage) {
        self.stats.total_messages += 1;

        let address = raw.address.as_deref().unwrap_or_default();
        if self.options.senders.is_system_sender(address) {
            self.stats.system_messages += 1;
            return;
        }

        let rules = &self.options.rules;
        let Some(phone) = rules
            .normalize(address)
            .filter(|phone| rules.is_domestic(phone))
        else {
            self.stats.rejected_phones += 1;
            return;
        };

        let Some(occurred_at) = raw
            .date
            .as_deref()
            .and_then(|date| date.trim().parse::<i64>().ok())
        else {
            self.stats.malformed_records += 1;
            return;
        };

        let contact_name = raw
            .contact_name
            .map(|name| name.trim().to_string())
            .filter(|name| !is_placeholder_name(name));

        let message = raw.body.unwrap_or_default();
        if !self.seen.insert((phone.clone(), message.clone(), occurred_at)) {
            self.stats.duplicate_messages += 1;
            return;
        }

        self.observe(&phone, contact_name.as_deref(), occurred_at);
        self.communications.push(CommunicationRecord {
            phone,
            message,
            direction: Direction::from_backup_code(raw.kind.as_deref().unwrap_or_default()),
            occurred_at,
            contact_name,
            readable_date: raw.readable_date.filter(|value| !value.trim().is_empty()),
        });
    }

    fn observe(&mut self, phone: &CanonicalPhone, contact_name: Option<&str>, occurred_at: i64) {
        let position = match self.positions.get(phone) {
            Some(&position) => position,
            None => {
                self.positions.insert(phone.clone(), self.candidates.len());
                self.candidates.push(ContactCandidate {
                    phone: phone.clone(),
                    display_name: synthesized_name(phone, &self.options.rules),
                    email: None,
                    address: None,
                    source: self.options.source_tag.clone(),
                    message_count: 0,
                    first_seen_at: None,
                    last_seen_at: None,
                });
                self.candidates.len() - 1
            }
        };

        let candidate = &mut self.candidates[position];
        candidate.message_count = candidate.message_count.saturating_add(1);
        candidate.first_seen_at = Some(
            candidate
                .first_seen_at
                .map_or(occurred_at, |seen| seen.min(occurred_at)),
        );
        candidate.last_seen_at = Some(
            candidate
                .last_seen_at
                .map_or(occurred_at, |seen| seen.max(occurred_at)),
        );
        if let Some(name) = contact_name {
            if is_placeholder_name(&candidate.display_name) {
                candidate.display_name = name.to_string();
            }
        }
    }

    fn finish(self) -> BackupExtract {
        BackupExtract {
            candidates: self.candidates,
            communications: self.communications,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> BackupExtract {
        parse_backup(xml, &BackupOptions::default()).expect("parse backup")
    }

    #[test]
    fn keeps_people_and_drops_service_senders() {
        let extract = parse(
            r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<smses count="4">
  <sms protocol="0" address="0755111111" date="1700000000000" type="1" body="Habari" contact_name="Amani" readable_date="Nov 14, 2023 10:13:20 PM" />
  <sms protocol="0" address="TIGOPESA" date="1700000001000" type="1" body="Umepokea" contact_name="(Unknown)" />
  <sms protocol="0" address="+255 755 111 111" date="1700000002000" type="2" body="Poa" contact_name="Amani" />
  <sms protocol="0" address="15300" date="1700000003000" type="1" body="Bundle" />
</smses>"#,
        );

        assert_eq!(extract.candidates.len(), 1);
        let amani = &extract.candidates[0];
        assert_eq!(amani.phone.as_str(), "+255755111111");
        assert_eq!(amani.display_name, "Amani");
        assert_eq!(amani.source, "SMS Backup");
        assert_eq!(amani.message_count, 2);
        assert_eq!(amani.first_seen_at, Some(1_700_000_000_000));
        assert_eq!(amani.last_seen_at, Some(1_700_000_002_000));

        assert_eq!(extract.communications.len(), 2);
        assert_eq!(extract.communications[0].direction, Direction::Received);
        assert_eq!(extract.communications[1].direction, Direction::Sent);
        assert_eq!(
            extract.communications[0].readable_date.as_deref(),
            Some("Nov 14, 2023 10:13:20 PM")
        );
        assert_eq!(
            extract.stats,
            ExtractStats {
                total_messages: 4,
                system_messages: 2,
                rejected_phones: 0,
                malformed_records: 0,
                duplicate_messages: 0,
            }
        );
    }

    #[test]
    fn unnamed_sender_gets_synthesized_name_until_named() {
        let extract = parse(
            r#"<smses>
  <sms address="0712345678" date="20" type="1" body="a" contact_name="(Unknown)" />
  <sms address="0712345678" date="10" type="1" body="b" contact_name="Juma Hamisi" />
  <sms address="0788000000" date="30" type="2" body="c" />
</smses>"#,
        );

        assert_eq!(extract.candidates[0].display_name, "Juma Hamisi");
        assert_eq!(extract.candidates[0].first_seen_at, Some(10));
        assert_eq!(extract.candidates[0].last_seen_at, Some(20));
        assert_eq!(extract.candidates[1].display_name, "Contact 788***");
        assert_eq!(extract.communications[0].contact_name, None);
    }

    #[test]
    fn foreign_and_undated_messages_are_counted_not_kept() {
        let extract = parse(
            r#"<smses>
  <sms address="+1 415 555 0100" date="1" type="1" body="hi" />
  <sms address="0755111111" type="1" body="no date" />
  <sms address="0755111111" date="yesterday" type="1" body="bad date" />
</smses>"#,
        );

        assert!(extract.candidates.is_empty());
        assert!(extract.communications.is_empty());
        assert_eq!(extract.stats.total_messages, 3);
        assert_eq!(extract.stats.rejected_phones, 1);
        assert_eq!(extract.stats.malformed_records, 2);
    }

    #[test]
    fn surrogate_pairs_decode_alongside_other_escapes() {
        let message = |body: &str| {
            let xml = format!(
                r#"<smses><sms address="0755111111" date="1" type="1" body="{body}" /></smses>"#
            );
            parse(&xml).communications[0].message.clone()
        };

        assert_eq!(message("Asante &#55357;&#56832;"), "Asante \u{1F600}");
        assert_eq!(
            message("Tom &amp; Jerry &#55357;&#56832;"),
            "Tom & Jerry \u{1F600}"
        );
        assert_eq!(message("&#xD83D;&#xDE00;&#33;"), "\u{1F600}!");
        assert_eq!(message("&#55357; &lt;3"), "&#55357; <3");
        assert_eq!(message("&#56832;&#55357;"), "&#56832;&#55357;");
    }

    #[test]
    fn repeated_messages_are_counted_once() {
        let extract = parse(
            r#"<smses>
  <sms address="0755111111" date="1" type="1" body="Habari" />
  <sms address="+255755111111" date="1" type="1" body="Habari" />
  <sms address="0755111111" date="2" type="1" body="Habari" />
</smses>"#,
        );

        assert_eq!(extract.candidates[0].message_count, 2);
        assert_eq!(extract.communications.len(), 2);
        assert_eq!(extract.stats.total_messages, 3);
        assert_eq!(extract.stats.duplicate_messages, 1);
    }

    #[test]
    fn empty_root_yields_nothing() {
        let extract = parse("<smses count=\"0\" />");
        assert!(extract.candidates.is_empty());
        assert_eq!(extract.stats, ExtractStats::default());
    }

    #[test]
    fn rejects_malformed_documents() {
        for xml in [
            "",
            "not xml at all",
            "<calls><call number=\"0755111111\" /></calls>",
            "<smses><sms address=\"0755111111\" date=\"1\"></smses>",
            "<smses><sms address=\"0755111111\" date=\"1\" />",
            "<smses /><smses />",
        ] {
            let err = parse_backup(xml, &BackupOptions::default()).expect_err(xml);
            assert!(
                matches!(
                    err,
                    SyncError::MalformedSource {
                        document: SourceKind::Backup,
                        ..
                    }
                ),
                "{xml}: {err}"
            );
        }
    }

    #[test]
    fn custom_source_tag_and_rules() {
        let options = BackupOptions {
            rules: PhoneRules::new("254", "0", 9).expect("rules"),
            senders: SenderFilter::new(["SAFARICOM"], 5).expect("filter"),
            source_tag: "Phone".to_string(),
        };
        let extract = parse_backup(
            r#"<smses>
  <sms address="0722000111" date="5" type="1" body="x" />
  <sms address="Safaricom" date="6" type="1" body="y" />
  <sms address="0755111111" date="7" type="1" body="z" />
</smses>"#,
            &options,
        )
        .expect("parse");

        assert_eq!(extract.candidates.len(), 2);
        assert_eq!(extract.candidates[0].phone.as_str(), "+254722000111");
        assert_eq!(extract.candidates[0].source, "Phone");
        assert_eq!(extract.stats.system_messages, 1);
    }
}
