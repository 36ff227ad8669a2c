use crate::error::{Result, SourceKind, SyncError};
use crate::source::read_document;
use csv::StringRecord;
use rollcall_core::domain::{sanitize_name, ContactCandidate, PhoneRules};
use rollcall_core::rules::DEFAULT_TABULAR_SOURCE;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

const NAME_HEADERS: &[&str] = &["name", "full name", "display name"];
const PHONE_HEADERS: &[&str] = &["phone", "phone number", "mobile"];
const EMAIL_HEADERS: &[&str] = &["email", "e-mail"];
const ADDRESS_HEADERS: &[&str] = &["address", "city"];
const SOURCE_HEADERS: &[&str] = &["source"];

const DELIMITER_CANDIDATES: &[u8] = &[b',', b';', b'\t'];
const SNIFF_LINES: usize = 10;

#[derive(Debug, Clone)]
pub struct TabularOptions {
    pub rules: PhoneRules,
    /// Source tag for rows without a `source` cell.
    pub default_source: String,
    /// Field delimiter; sniffed from the first lines when unset.
    pub delimiter: Option<u8>,
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            rules: PhoneRules::default(),
            default_source: DEFAULT_TABULAR_SOURCE.to_string(),
            delimiter: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TabularStats {
    pub rows: usize,
    pub missing_phone: usize,
    pub rejected_phones: usize,
}

#[derive(Debug, Clone)]
pub struct TabularExtract {
    pub candidates: Vec<ContactCandidate>,
    pub stats: TabularStats,
}

pub fn read_tabular(path: &Path, options: &TabularOptions) -> Result<TabularExtract> {
    let data = read_document(path, SourceKind::Tabular)?;
    let extract = parse_tabular(&data, options)?;
    debug!(
        path = %path.display(),
        contacts = extract.candidates.len(),
        rows = extract.stats.rows,
        "parsed tabular contacts"
    );
    Ok(extract)
}

pub fn parse_tabular(data: &str, options: &TabularOptions) -> Result<TabularExtract> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(data));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| malformed(err.to_string()))?
        .clone();
    let columns = Columns::resolve(&headers)?;

    let mut candidates = Vec::new();
    let mut stats = TabularStats::default();
    for result in reader.records() {
        let record = result.map_err(|err| malformed(err.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        stats.rows += 1;

        let Some(raw_phone) = cell(&record, Some(columns.phone)) else {
            stats.missing_phone += 1;
            continue;
        };
        let Some(phone) = options
            .rules
            .normalize(raw_phone)
            .filter(|phone| options.rules.is_domestic(phone))
        else {
            stats.rejected_phones += 1;
            continue;
        };

        candidates.push(ContactCandidate {
            phone,
            display_name: sanitize_name(cell(&record, columns.name).unwrap_or_default()),
            email: cell(&record, columns.email).map(str::to_string),
            address: cell(&record, columns.address).map(str::to_string),
            source: cell(&record, columns.source)
                .map(str::to_string)
                .unwrap_or_else(|| options.default_source.clone()),
            message_count: 0,
            first_seen_at: None,
            last_seen_at: None,
        });
    }

    Ok(TabularExtract { candidates, stats })
}

struct Columns {
    name: Option<usize>,
    phone: usize,
    email: Option<usize>,
    address: Option<usize>,
    source: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |aliases: &[&str]| {
            headers.iter().position(|header| {
                let header = header.trim();
                aliases.iter().any(|alias| header.eq_ignore_ascii_case(alias))
            })
        };

        let phone = find(PHONE_HEADERS).ok_or_else(|| {
            malformed(format!(
                "no phone column (expected one of: {})",
                PHONE_HEADERS.join(", ")
            ))
        })?;

        Ok(Self {
            name: find(NAME_HEADERS),
            phone,
            email: find(EMAIL_HEADERS),
            address: find(ADDRESS_HEADERS),
            source: find(SOURCE_HEADERS),
        })
    }
}

fn cell(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Picks the candidate whose field count is most consistent across the first
/// lines, preferring more columns; falls back to a comma.
fn sniff_delimiter(data: &str) -> u8 {
    let sample: Vec<&str> = data
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = b',';
    let mut best_score = 0usize;
    for &delimiter in DELIMITER_CANDIDATES {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|record| record.ok())
                    .map_or(1, |record| record.len())
            })
            .collect();

        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }
        let consistent = counts.iter().filter(|&&count| count == target).count();
        let score = consistent * target;
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }
    best
}

fn malformed(reason: impl Into<String>) -> SyncError {
    SyncError::malformed(SourceKind::Tabular, reason)
}
