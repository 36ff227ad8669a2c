use rollcall_core::domain::{CanonicalPhone, CommunicationRecord, ContactId, Direction};
use rollcall_core::rules::{ColorTag, Tier};
use rollcall_core::{ContactRepository, ContactUpsert};
use rollcall_store::Store;

fn store_with_contact() -> (Store, ContactId) {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");
    let record = store
        .contacts()
        .upsert(
            100,
            &ContactUpsert {
                phone: CanonicalPhone::parse("+255755111111").expect("phone"),
                display_name: "Amani".to_string(),
                email: None,
                address: None,
                sources: "SMS Backup".to_string(),
                notes: String::new(),
                tier: Tier::Bronze,
                color_tag: ColorTag::New,
                message_count: 2,
                first_seen_at: None,
                last_seen_at: None,
            },
        )
        .expect("insert contact")
        .into_record();
    (store, record.id)
}

fn message(text: &str, occurred_at: i64, direction: Direction) -> CommunicationRecord {
    CommunicationRecord {
        phone: CanonicalPhone::parse("+255755111111").expect("phone"),
        message: text.to_string(),
        direction,
        occurred_at,
        contact_name: Some("Amani".to_string()),
        readable_date: None,
    }
}

#[test]
fn insert_is_conditional_on_identity() {
    let (store, contact_id) = store_with_contact();
    let record = message("Habari", 1_700_000_000_000, Direction::Received);

    assert!(!store
        .find_communication(&contact_id, "Habari", 1_700_000_000_000)
        .expect("exists"));
    assert!(store
        .insert_communication(200, &contact_id, &record)
        .expect("insert"));
    assert!(!store
        .insert_communication(300, &contact_id, &record)
        .expect("second insert"));
    assert!(store
        .find_communication(&contact_id, "Habari", 1_700_000_000_000)
        .expect("exists"));

    let same_text_later = message("Habari", 1_700_000_000_001, Direction::Received);
    assert!(store
        .insert_communication(300, &contact_id, &same_text_later)
        .expect("insert later"));
    assert_eq!(
        store
            .communications()
            .count_for_contact(&contact_id)
            .expect("count"),
        2
    );
}

#[test]
fn history_is_newest_first() {
    let (store, contact_id) = store_with_contact();
    let repo = store.communications();
    repo.insert_if_absent(200, &contact_id, &message("first", 10, Direction::Received))
        .expect("insert");
    repo.insert_if_absent(200, &contact_id, &message("second", 30, Direction::Sent))
        .expect("insert");
    repo.insert_if_absent(200, &contact_id, &message("third", 20, Direction::Received))
        .expect("insert");

    let history = repo.list_for_contact(&contact_id, 2).expect("list");
    let texts: Vec<&str> = history.iter().map(|item| item.message.as_str()).collect();
    assert_eq!(texts, vec!["second", "third"]);
    assert_eq!(history[0].direction, Direction::Sent);
    assert_eq!(history[0].kind, "sms");
    assert_eq!(history[0].contact_id, contact_id);
}

#[test]
fn unknown_contact_is_rejected() {
    let (store, _) = store_with_contact();
    let err = store
        .communications()
        .insert_if_absent(200, &ContactId::new(), &message("orphan", 1, Direction::Sent));
    assert!(err.is_err());
}
