use rollcall_core::domain::CanonicalPhone;
use rollcall_core::rules::{ColorTag, Tier};
use rollcall_store::Store;
use rollcall_sync::{Pipeline, PipelineOptions, PipelineRequest, SourceKind, SyncError};
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

const BACKUP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<smses count="5">
  <sms address="0755111111" date="1700000000000" type="1" body="Habari yako" contact_name="(Unknown)" readable_date="Nov 14, 2023" />
  <sms address="TIGOPESA" date="1700000001000" type="1" body="Umepokea Tsh 5,000" contact_name="(Unknown)" />
  <sms address="+255755111111" date="1700000002000" type="2" body="Nzuri sana" contact_name="(Unknown)" />
  <sms address="0712345678" date="1700000003000" type="1" body="Karibu" contact_name="Neema" />
  <sms address="15670" date="1700000004000" type="1" body="Salio lako" />
</smses>
"#;

const CONTACTS: &str = "Name,Phone,Email,City\n\
Amani,0755111111,amani@example.com,Dodoma\n\
Baraka Mushi,0788000000,,Arusha\n";

fn write_inputs(dir: &Path, backup: &str, contacts: &str) -> PipelineRequest {
    let backup_path = dir.join("sms.xml");
    let tabular_path = dir.join("contacts.csv");
    std::fs::write(&backup_path, backup).expect("write backup");
    std::fs::write(&tabular_path, contacts).expect("write contacts");
    PipelineRequest {
        backup_path,
        tabular_path,
        selected_phones: None,
        now_utc: 1_700_000_100,
    }
}

fn store() -> Store {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");
    store
}

fn phone(raw: &str) -> CanonicalPhone {
    CanonicalPhone::parse(raw).expect("phone")
}

#[test]
fn reconciles_both_sources_into_one_contact_per_phone() {
    let temp = TempDir::new().expect("temp dir");
    let request = write_inputs(temp.path(), BACKUP, CONTACTS);
    let store = store();

    let report = Pipeline::new(&store, PipelineOptions::default())
        .run(&request)
        .expect("run pipeline");

    assert_eq!(report.total, 3);
    assert_eq!(report.merged, 1);
    assert_eq!(report.backup_only, 1);
    assert_eq!(report.tabular_only, 1);
    assert_eq!(report.inserted, 3);
    assert_eq!(report.communication_imported, 3);
    let backup_stats = report.backup.expect("backup stats");
    assert_eq!(backup_stats.total_messages, 5);
    assert_eq!(backup_stats.system_messages, 2);

    let amani = store
        .contacts()
        .get_by_phone(&phone("+255755111111"))
        .expect("lookup")
        .expect("amani stored");
    assert_eq!(amani.display_name, "Amani");
    assert_eq!(amani.email.as_deref(), Some("amani@example.com"));
    assert_eq!(amani.address.as_deref(), Some("Dodoma"));
    assert_eq!(amani.sources, "SMS Backup, CSV Import");
    assert_eq!(amani.message_count, 2);
    assert_eq!(amani.tier, Tier::Bronze);
    assert_eq!(amani.color_tag, ColorTag::New);
    assert_eq!(amani.notes, "Imported from: SMS Backup, CSV Import. SMS messages: 2");
    assert_eq!(
        store
            .communications()
            .count_for_contact(&amani.id)
            .expect("count"),
        2
    );

    let baraka = store
        .contacts()
        .get_by_phone(&phone("+255788000000"))
        .expect("lookup")
        .expect("baraka stored");
    assert_eq!(baraka.sources, "CSV Import");
    assert_eq!(baraka.message_count, 0);
    assert!(baraka.notes.starts_with("Imported from: CSV Import"));
}

#[test]
fn second_run_updates_without_duplicates() {
    let temp = TempDir::new().expect("temp dir");
    let request = write_inputs(temp.path(), BACKUP, CONTACTS);
    let store = store();
    let pipeline = Pipeline::new(&store, PipelineOptions::default());

    pipeline.run(&request).expect("first run");
    let second = pipeline.run(&request).expect("second run");

    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 3);
    assert_eq!(second.communication_imported, 0);
    assert_eq!(second.communication_skipped, 3);
    assert_eq!(store.contacts().count().expect("count"), 3);
}

#[test]
fn unnamed_tabular_row_never_overwrites_a_name() {
    let temp = TempDir::new().expect("temp dir");
    let store = store();
    let first = write_inputs(temp.path(), "<smses />", "name,phone\nZawadi,0711222333\n");
    Pipeline::new(&store, PipelineOptions::default())
        .run(&first)
        .expect("first run");

    let second = write_inputs(temp.path(), "<smses />", "name,phone\n,0711222333\n");
    let report = Pipeline::new(&store, PipelineOptions::default())
        .run(&second)
        .expect("second run");
    assert_eq!(report.updated, 1);

    let stored = store
        .contacts()
        .get_by_phone(&phone("+255711222333"))
        .expect("lookup")
        .expect("stored");
    assert_eq!(stored.display_name, "Zawadi");
}

#[test]
fn malformed_source_aborts_by_default() {
    let temp = TempDir::new().expect("temp dir");
    let request = write_inputs(temp.path(), BACKUP, "name,email\nAmani,a@example.com\n");
    let store = store();

    let err = Pipeline::new(&store, PipelineOptions::default())
        .run(&request)
        .expect_err("missing phone column");
    assert!(matches!(
        err,
        SyncError::MalformedSource {
            document: SourceKind::Tabular,
            ..
        }
    ));
    assert_eq!(store.contacts().count().expect("count"), 0);
}

#[test]
fn partial_mode_keeps_the_source_that_parsed() {
    let temp = TempDir::new().expect("temp dir");
    let request = write_inputs(temp.path(), "<smses><sms", CONTACTS);
    let store = store();
    let options = PipelineOptions {
        allow_partial: true,
        ..PipelineOptions::default()
    };

    let report = Pipeline::new(&store, options)
        .run(&request)
        .expect("partial run");
    assert_eq!(report.failed_sources.len(), 1);
    assert_eq!(report.failed_sources[0].source, SourceKind::Backup);
    assert!(report.backup.is_none());
    assert_eq!(report.inserted, 2);
    assert_eq!(report.tabular_only, 2);
}

#[test]
fn missing_file_is_fatal_even_in_partial_mode() {
    let temp = TempDir::new().expect("temp dir");
    let mut request = write_inputs(temp.path(), BACKUP, CONTACTS);
    request.backup_path = temp.path().join("absent.xml");
    let store = store();
    let options = PipelineOptions {
        allow_partial: true,
        ..PipelineOptions::default()
    };

    let err = Pipeline::new(&store, options)
        .run(&request)
        .expect_err("unreadable");
    assert!(matches!(err, SyncError::SourceUnreadable { .. }));
}

#[test]
fn dry_run_and_selection_leave_the_store_untouched() {
    let temp = TempDir::new().expect("temp dir");
    let mut request = write_inputs(temp.path(), BACKUP, CONTACTS);
    request.selected_phones = Some(HashSet::from([phone("+255755111111")]));
    let store = store();
    let options = PipelineOptions {
        dry_run: true,
        ..PipelineOptions::default()
    };

    let report = Pipeline::new(&store, options)
        .run(&request)
        .expect("dry run");
    assert!(report.dry_run);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(store.contacts().count().expect("count"), 0);
}
