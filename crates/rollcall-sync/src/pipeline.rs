use crate::error::{Result, SourceKind, SyncError};
use crate::import::{ImportOptions, ImportStats, Importer};
use crate::sms_backup::{read_backup, BackupExtract, BackupOptions, ExtractStats};
use crate::tabular::{read_tabular, TabularExtract, TabularOptions, TabularStats};
use rollcall_core::domain::{CanonicalPhone, ContactCandidate};
use rollcall_core::{merge_candidates, ContactRepository};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info, warn};

const BACKUP_LIST: usize = 0;
const TABULAR_LIST: usize = 1;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub backup: BackupOptions,
    pub tabular: TabularOptions,
    /// Continue with whichever source parsed when the other is malformed.
    pub allow_partial: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub backup_path: PathBuf,
    pub tabular_path: PathBuf,
    pub selected_phones: Option<HashSet<CanonicalPhone>>,
    pub now_utc: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub backup_only: usize,
    pub tabular_only: usize,
    pub merged: usize,
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errored: usize,
    pub communication_imported: usize,
    pub communication_skipped: usize,
    pub communication_errored: usize,
    pub backup: Option<ExtractStats>,
    pub tabular: Option<TabularStats>,
    /// Sources dropped under partial processing, with the reason.
    pub failed_sources: Vec<FailedSource>,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedSource {
    pub source: SourceKind,
    pub reason: String,
}

/// One synchronous reconciliation run against a repository.
pub struct Pipeline<'a, R> {
    repo: &'a R,
    options: PipelineOptions,
}

impl<'a, R: ContactRepository> Pipeline<'a, R> {
    pub fn new(repo: &'a R, options: PipelineOptions) -> Self {
        Self { repo, options }
    }

    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineReport> {
        let backup_options = &self.options.backup;
        let backup_path = &request.backup_path;
        let (backup, tabular) = thread::scope(|scope| {
            let backup = scope.spawn(move || read_backup(backup_path, backup_options));
            let tabular = read_tabular(&request.tabular_path, &self.options.tabular);
            let backup = backup
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (backup, tabular)
        });

        let mut report = PipelineReport {
            dry_run: self.options.dry_run,
            ..PipelineReport::default()
        };
        let backup = self.settle(backup, &mut report)?;
        let tabular = self.settle(tabular, &mut report)?;
        if backup.is_none() && tabular.is_none() {
            if let Some(failed) = report.failed_sources.first() {
                return Err(SyncError::malformed(failed.source, failed.reason.clone()));
            }
        }

        let mut lists: Vec<Vec<ContactCandidate>> = vec![Vec::new(), Vec::new()];
        let mut history = Vec::new();
        if let Some(BackupExtract {
            candidates,
            communications,
            stats,
        }) = backup
        {
            lists[BACKUP_LIST] = candidates;
            history = communications;
            report.backup = Some(stats);
        }
        if let Some(TabularExtract { candidates, stats }) = tabular {
            lists[TABULAR_LIST] = candidates;
            report.tabular = Some(stats);
        }

        let merged = merge_candidates(&lists);
        debug!(
            contacts = merged.stats.total,
            shared = merged.stats.merged,
            messages = history.len(),
            "merged sources"
        );

        let importer = Importer::with_options(
            self.repo,
            ImportOptions {
                dry_run: self.options.dry_run,
                selected: request.selected_phones.clone(),
            },
        );
        let stats = importer.import_all(request.now_utc, &merged.contacts, &history);

        report.backup_only = merged.stats.exclusive_to(BACKUP_LIST);
        report.tabular_only = merged.stats.exclusive_to(TABULAR_LIST);
        report.merged = merged.stats.merged;
        report.total = merged.stats.total;
        apply_import(&mut report, stats);

        info!(
            total = report.total,
            inserted = report.inserted,
            updated = report.updated,
            "pipeline finished"
        );
        Ok(report)
    }

    /// Malformed sources are dropped under partial processing; every other
    /// failure ends the run.
    fn settle<T>(&self, outcome: Result<T>, report: &mut PipelineReport) -> Result<Option<T>> {
        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(SyncError::MalformedSource { document, reason }) if self.options.allow_partial => {
                warn!(source = %document, reason = %reason, "skipping malformed source");
                report.failed_sources.push(FailedSource {
                    source: document,
                    reason,
                });
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn apply_import(report: &mut PipelineReport, stats: ImportStats) {
    report.inserted = stats.inserted;
    report.updated = stats.updated;
    report.skipped = stats.skipped;
    report.errored = stats.errored;
    report.communication_imported = stats.communications_imported;
    report.communication_skipped = stats.communications_skipped;
    report.communication_errored = stats.communications_errored;
    report.warnings = stats.warnings;
}
