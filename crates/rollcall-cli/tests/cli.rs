use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;

const BACKUP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<smses count="3">
  <sms address="0755111111" date="1700000000000" type="1" body="Habari" contact_name="(Unknown)" />
  <sms address="TIGOPESA" date="1700000001000" type="1" body="Umepokea" contact_name="(Unknown)" />
  <sms address="0755111111" date="1700000002000" type="2" body="Poa" contact_name="(Unknown)" />
</smses>
"#;

const CONTACTS: &str = "name,phone,email\nAmani,0755111111,amani@example.com\nBaraka,0788000000,\n";

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        std::fs::write(temp.path().join("sms.xml"), BACKUP).expect("write backup");
        std::fs::write(temp.path().join("contacts.csv"), CONTACTS).expect("write contacts");
        Self { temp }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn db_path(&self) -> PathBuf {
        self.path("rollcall.sqlite3")
    }

    fn output(&self, args: &[&str]) -> Output {
        cargo_bin_cmd!("rollcall")
            .env("XDG_CONFIG_HOME", self.path("config"))
            .args(["--db-path", path_str(&self.db_path())])
            .args(args)
            .output()
            .expect("run command")
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.output(&full);
        assert!(output.status.success(), "command failed: {:?}", output);
        serde_json::from_slice(&output.stdout).expect("parse json")
    }

    fn import_args(&self) -> Vec<String> {
        vec![
            "import".to_string(),
            "--backup".to_string(),
            path_str(&self.path("sms.xml")).to_string(),
            "--contacts".to_string(),
            path_str(&self.path("contacts.csv")).to_string(),
        ]
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

#[test]
fn cli_import_twice_then_list_and_history() {
    let ws = Workspace::new();
    let args = ws.import_args();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let first = ws.run_json(&args);
    assert_eq!(first["inserted"], 2);
    assert_eq!(first["updated"], 0);
    assert_eq!(first["merged"], 1);
    assert_eq!(first["communication_imported"], 2);

    let second = ws.run_json(&args);
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["updated"], 2);
    assert_eq!(second["communication_imported"], 0);
    assert_eq!(second["communication_skipped"], 2);

    let list = ws.run_json(&["list"]);
    let items = list.as_array().expect("array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["display_name"], "Amani");
    assert_eq!(items[0]["phone"], "+255755111111");
    assert_eq!(items[0]["email"], "amani@example.com");
    assert_eq!(items[0]["sources"], "SMS Backup, CSV Import");

    let history = ws.run_json(&["history", "0755 111 111"]);
    let messages = history.as_array().expect("array");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["message"], "Poa");
    assert_eq!(messages[0]["direction"], "sent");
}

#[test]
fn cli_dry_run_writes_nothing() {
    let ws = Workspace::new();
    let mut args = ws.import_args();
    args.push("--dry-run".to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let report = ws.run_json(&args);
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["inserted"], 2);
    assert_eq!(report["communication_imported"], 2);

    let list = ws.run_json(&["list"]);
    assert!(list.as_array().expect("array").is_empty());
}

#[test]
fn cli_exit_codes() {
    let ws = Workspace::new();

    let missing = ws.output(&["history", "0712345678"]);
    assert_eq!(missing.status.code(), Some(2));

    let bad_phone = ws.output(&["history", "123"]);
    assert_eq!(bad_phone.status.code(), Some(3));

    std::fs::write(ws.path("bad.csv"), "name,email\nAmani,a@example.com\n").expect("write");
    let malformed = ws.output(&[
        "import",
        "--backup",
        path_str(&ws.path("sms.xml")),
        "--contacts",
        path_str(&ws.path("bad.csv")),
    ]);
    assert_eq!(malformed.status.code(), Some(3));

    let partial = ws.output(&[
        "--json",
        "import",
        "--backup",
        path_str(&ws.path("sms.xml")),
        "--contacts",
        path_str(&ws.path("bad.csv")),
        "--partial",
    ]);
    assert!(partial.status.success(), "partial failed: {:?}", partial);
    let report: Value = serde_json::from_slice(&partial.stdout).expect("parse json");
    assert_eq!(report["failed_sources"][0]["source"], "tabular");
    assert_eq!(report["inserted"], 1);

    let unreadable = ws.output(&[
        "import",
        "--backup",
        path_str(&ws.path("absent.xml")),
        "--contacts",
        path_str(&ws.path("contacts.csv")),
    ]);
    assert_eq!(unreadable.status.code(), Some(1));
}

#[test]
fn cli_help_describes_every_command() {
    let ws = Workspace::new();
    let output = ws.output(&["--help"]);
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    assert!(help.contains("Reconcile a message backup"));
    assert!(help.contains("List stored contacts"));
    assert!(help.contains("Show stored messages"));
}
