use rollcall_core::domain::{CanonicalPhone, CommunicationRecord, ContactId, MergedContact};
use rollcall_core::{ContactRepository, ContactUpsert, UpsertOutcome};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Only read from the repository and report what would be written.
    pub dry_run: bool,
    /// When set, only these phones are imported; everything else is skipped.
    pub selected: Option<HashSet<CanonicalPhone>>,
}

impl ImportOptions {
    fn is_selected(&self, phone: &CanonicalPhone) -> bool {
        self.selected
            .as_ref()
            .is_none_or(|selected| selected.contains(phone))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errored: usize,
    pub communications_imported: usize,
    pub communications_skipped: usize,
    pub communications_errored: usize,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

/// Writes merged contacts and their message history into a repository.
///
/// Every write is keyed (contacts by phone, messages by contact, text and
/// timestamp), so running the same input twice only produces updates and
/// skips. Failures are per record: they are logged, counted and the run
/// moves on.
pub struct Importer<'a, R> {
    repo: &'a R,
    options: ImportOptions,
}

impl<'a, R: ContactRepository> Importer<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self::with_options(repo, ImportOptions::default())
    }

    pub fn with_options(repo: &'a R, options: ImportOptions) -> Self {
        Self { repo, options }
    }

    pub fn import_all(
        &self,
        now_utc: i64,
        contacts: &[MergedContact],
        history: &[CommunicationRecord],
    ) -> ImportStats {
        let mut stats = ImportStats {
            dry_run: self.options.dry_run,
            ..ImportStats::default()
        };

        let mut owners: HashMap<CanonicalPhone, Owner> = HashMap::new();
        for contact in contacts {
            if !self.options.is_selected(&contact.phone) {
                stats.skipped += 1;
                continue;
            }
            let owner = self.import_contact(now_utc, contact, &mut stats);
            owners.insert(contact.phone.clone(), owner);
        }

        // Messages a dry run has already counted as new.
        let mut planned: HashSet<MessageKey<'_>> = HashSet::new();
        for record in history {
            if !self.options.is_selected(&record.phone) {
                continue;
            }
            let owner = match owners.get(&record.phone) {
                Some(owner) => *owner,
                None => {
                    let owner = self.lookup(&record.phone, &mut stats);
                    owners.insert(record.phone.clone(), owner);
                    owner
                }
            };
            match owner {
                Owner::Stored(contact_id) => self.import_communication(
                    now_utc,
                    &contact_id,
                    record,
                    &mut planned,
                    &mut stats,
                ),
                Owner::Pending => {
                    if planned.insert(message_key(record)) {
                        stats.communications_imported += 1;
                    } else {
                        stats.communications_skipped += 1;
                    }
                }
                Owner::Absent => stats.communications_skipped += 1,
                Owner::Failed => stats.communications_errored += 1,
            }
        }

        info!(
            inserted = stats.inserted,
            updated = stats.updated,
            skipped = stats.skipped,
            errored = stats.errored,
            communications = stats.communications_imported,
            dry_run = stats.dry_run,
            "import finished"
        );
        stats
    }

    fn import_contact(
        &self,
        now_utc: i64,
        contact: &MergedContact,
        stats: &mut ImportStats,
    ) -> Owner {
        if self.options.dry_run {
            return match self.repo.find_by_phone(&contact.phone) {
                Ok(Some(existing)) => {
                    stats.updated += 1;
                    Owner::Stored(existing.id)
                }
                Ok(None) => {
                    stats.inserted += 1;
                    Owner::Pending
                }
                Err(err) => {
                    self.record_failure(stats, &contact.phone, &err);
                    stats.errored += 1;
                    Owner::Absent
                }
            };
        }

        let upsert = ContactUpsert::from_merged(contact);
        match self.repo.upsert_contact(now_utc, &upsert) {
            Ok(UpsertOutcome::Inserted(record)) => {
                stats.inserted += 1;
                Owner::Stored(record.id)
            }
            Ok(UpsertOutcome::Updated(record)) => {
                stats.updated += 1;
                Owner::Stored(record.id)
            }
            Err(err) => {
                self.record_failure(stats, &contact.phone, &err);
                stats.errored += 1;
                Owner::Absent
            }
        }
    }

    fn import_communication<'r>(
        &self,
        now_utc: i64,
        contact_id: &ContactId,
        record: &'r CommunicationRecord,
        planned: &mut HashSet<MessageKey<'r>>,
        stats: &mut ImportStats,
    ) {
        let written = if self.options.dry_run {
            self.repo
                .find_communication(contact_id, &record.message, record.occurred_at)
                .map(|exists| !exists && planned.insert(message_key(record)))
        } else {
            self.repo.insert_communication(now_utc, contact_id, record)
        };

        match written {
            Ok(true) => stats.communications_imported += 1,
            Ok(false) => stats.communications_skipped += 1,
            Err(err) => {
                self.record_failure(stats, &record.phone, &err);
                stats.communications_errored += 1;
            }
        }
    }

    /// Owner of a message whose phone was not part of the contact batch.
    fn lookup(&self, phone: &CanonicalPhone, stats: &mut ImportStats) -> Owner {
        match self.repo.find_by_phone(phone) {
            Ok(Some(record)) => Owner::Stored(record.id),
            Ok(None) => Owner::Absent,
            Err(err) => {
                self.record_failure(stats, phone, &err);
                Owner::Failed
            }
        }
    }

    fn record_failure(&self, stats: &mut ImportStats, phone: &CanonicalPhone, err: &R::Error) {
        warn!(phone = %phone, error = %err, "import failed for record");
        stats.warnings.push(format!("{phone}: {err}"));
    }
}

type MessageKey<'r> = (&'r CanonicalPhone, &'r str, i64);

fn message_key(record: &CommunicationRecord) -> MessageKey<'_> {
    (&record.phone, record.message.as_str(), record.occurred_at)
}

/// Who a message in the history belongs to.
#[derive(Debug, Clone, Copy)]
enum Owner {
    Stored(ContactId),
    /// Would be inserted by this run; only seen in dry runs.
    Pending,
    /// Not stored, or its upsert failed.
    Absent,
    /// The owner lookup itself failed.
    Failed,
}
