use crate::commands::{print_json, Context};
use crate::util::{now_utc, parse_phone};
use anyhow::{Context as _, Result};
use clap::Args;
use rollcall_sync::{
    BackupOptions, Pipeline, PipelineOptions, PipelineReport, PipelineRequest, TabularOptions,
};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// SMS backup XML export
    #[arg(long, value_name = "XML")]
    pub backup: PathBuf,
    /// Contacts spreadsheet (comma, semicolon or tab separated)
    #[arg(long, value_name = "CSV")]
    pub contacts: PathBuf,
    /// Only import these phone numbers
    #[arg(long = "select", value_name = "PHONE")]
    pub select: Vec<String>,
    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
    /// Keep going with the other source when one is malformed
    #[arg(long)]
    pub partial: bool,
}

pub fn import(ctx: &Context<'_>, args: ImportArgs) -> Result<()> {
    let config = ctx.config;
    let selected_phones = if args.select.is_empty() {
        None
    } else {
        let mut phones = HashSet::new();
        for raw in &args.select {
            phones.insert(parse_phone(raw, &config.phone)?);
        }
        Some(phones)
    };

    let options = PipelineOptions {
        backup: BackupOptions {
            rules: config.phone.clone(),
            senders: config.backup.senders.clone(),
            source_tag: config.backup.source_tag.clone(),
        },
        tabular: TabularOptions {
            rules: config.phone.clone(),
            default_source: config.tabular.default_source.clone(),
            delimiter: config.tabular.delimiter,
        },
        allow_partial: args.partial || config.import.allow_partial,
        dry_run: args.dry_run,
    };
    let request = PipelineRequest {
        backup_path: args.backup,
        tabular_path: args.contacts,
        selected_phones,
        now_utc: now_utc(),
    };

    let report = Pipeline::new(ctx.store, options)
        .run(&request)
        .with_context(|| "import contacts")?;

    if ctx.json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &PipelineReport) {
    let prefix = if report.dry_run { "Dry run: " } else { "" };
    println!(
        "{}contacts: {} total ({} backup only, {} spreadsheet only, {} in both)",
        prefix, report.total, report.backup_only, report.tabular_only, report.merged
    );
    println!(
        "{}inserted {}, updated {}, skipped {}, errors {}",
        prefix, report.inserted, report.updated, report.skipped, report.errored
    );
    println!(
        "{}messages: imported {}, skipped {}, errors {}",
        prefix,
        report.communication_imported,
        report.communication_skipped,
        report.communication_errored
    );
    if let Some(backup) = &report.backup {
        println!(
            "backup: {} messages read, {} from service senders, {} unusable numbers, {} malformed, {} repeated",
            backup.total_messages,
            backup.system_messages,
            backup.rejected_phones,
            backup.malformed_records,
            backup.duplicate_messages
        );
    }
    if let Some(tabular) = &report.tabular {
        println!(
            "spreadsheet: {} rows, {} without phone, {} unusable numbers",
            tabular.rows, tabular.missing_phone, tabular.rejected_phones
        );
    }
    for failed in &report.failed_sources {
        println!("skipped {}: {}", failed.source, failed.reason);
    }
    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("- {}", warning);
        }
    }
}
