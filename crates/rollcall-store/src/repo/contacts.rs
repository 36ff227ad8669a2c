use crate::error::{Result, StoreError};
use rollcall_core::domain::{is_placeholder_name, CanonicalPhone, ContactId, ContactRecord};
use rollcall_core::rules::{ColorTag, Tier};
use rollcall_core::{ContactUpsert, CoreError, UpsertOutcome};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::str::FromStr;

const CONTACT_COLUMNS: &str = "id, phone, display_name, email, address, sources, notes, tier, color_tag, is_active, message_count, first_seen_at, last_seen_at, created_at, updated_at";

pub struct ContactsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ContactsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert-or-update keyed by phone.
    ///
    /// Runs inside an immediate transaction so the insert attempt and the
    /// follow-up update see the same row, even with other writers present.
    pub fn upsert(&self, now_utc: i64, input: &ContactUpsert) -> Result<UpsertOutcome> {
        if input.display_name.trim().is_empty() {
            return Err(StoreError::Core(CoreError::EmptyDisplayName));
        }

        if self.conn.is_autocommit() {
            let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
            let outcome = upsert_inner(&tx, now_utc, input)?;
            tx.commit()?;
            Ok(outcome)
        } else {
            upsert_inner(self.conn, now_utc, input)
        }
    }

    pub fn get(&self, id: ContactId) -> Result<Option<ContactRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1;"),
                [id.to_string()],
                raw_contact_from_row,
            )
            .optional()?;
        row.map(RawContact::into_record).transpose()
    }

    pub fn get_by_phone(&self, phone: &CanonicalPhone) -> Result<Option<ContactRecord>> {
        get_by_phone_inner(self.conn, phone)
    }

    pub fn list_all(&self) -> Result<Vec<ContactRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             ORDER BY display_name COLLATE NOCASE ASC, phone ASC;"
        ))?;
        let rows = stmt.query_map([], raw_contact_from_row)?;
        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?.into_record()?);
        }
        Ok(contacts)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn upsert_inner(conn: &Connection, now_utc: i64, input: &ContactUpsert) -> Result<UpsertOutcome> {
    let id = ContactId::new();
    let inserted = conn.execute(
        "INSERT INTO contacts
         (id, phone, display_name, email, address, sources, notes, tier, color_tag,
          is_active, message_count, first_seen_at, last_seen_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?11, ?12, ?13, ?13)
         ON CONFLICT(phone) DO NOTHING;",
        params![
            id.to_string(),
            input.phone.as_str(),
            input.display_name.trim(),
            non_blank(input.email.as_deref()),
            non_blank(input.address.as_deref()),
            input.sources,
            input.notes,
            input.tier.as_str(),
            input.color_tag.as_str(),
            input.message_count,
            input.first_seen_at,
            input.last_seen_at,
            now_utc
        ],
    )?;

    if inserted == 0 {
        let keep_name = is_placeholder_name(&input.display_name);
        conn.execute(
            "UPDATE contacts
             SET display_name = CASE WHEN ?2 THEN display_name ELSE ?3 END,
                 email = COALESCE(?4, email),
                 updated_at = ?5
             WHERE phone = ?1;",
            params![
                input.phone.as_str(),
                keep_name,
                input.display_name.trim(),
                non_blank(input.email.as_deref()),
                now_utc
            ],
        )?;
    }

    let record = get_by_phone_inner(conn, &input.phone)?
        .ok_or_else(|| StoreError::NotFound(format!("contact {}", input.phone)))?;
    if inserted == 0 {
        Ok(UpsertOutcome::Updated(record))
    } else {
        Ok(UpsertOutcome::Inserted(record))
    }
}

fn get_by_phone_inner(conn: &Connection, phone: &CanonicalPhone) -> Result<Option<ContactRecord>> {
    let row = conn
        .query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE phone = ?1;"),
            [phone.as_str()],
            raw_contact_from_row,
        )
        .optional()?;
    row.map(RawContact::into_record).transpose()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

struct RawContact {
    id: String,
    phone: String,
    display_name: String,
    email: Option<String>,
    address: Option<String>,
    sources: String,
    notes: String,
    tier: String,
    color_tag: String,
    is_active: bool,
    message_count: u32,
    first_seen_at: Option<i64>,
    last_seen_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl RawContact {
    fn into_record(self) -> Result<ContactRecord> {
        let id = ContactId::from_str(&self.id).map_err(|_| StoreError::InvalidId(self.id.clone()))?;
        let record = ContactRecord {
            id,
            phone: CanonicalPhone::parse(&self.phone)?,
            display_name: self.display_name,
            email: self.email,
            address: self.address,
            sources: self.sources,
            notes: self.notes,
            tier: Tier::parse(&self.tier)?,
            color_tag: ColorTag::parse(&self.color_tag)?,
            is_active: self.is_active,
            message_count: self.message_count,
            first_seen_at: self.first_seen_at,
            last_seen_at: self.last_seen_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        record.validate()?;
        Ok(record)
    }
}

fn raw_contact_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawContact> {
    Ok(RawContact {
        id: row.get(0)?,
        phone: row.get(1)?,
        display_name: row.get(2)?,
        email: row.get(3)?,
        address: row.get(4)?,
        sources: row.get(5)?,
        notes: row.get(6)?,
        tier: row.get(7)?,
        color_tag: row.get(8)?,
        is_active: row.get(9)?,
        message_count: row.get(10)?,
        first_seen_at: row.get(11)?,
        last_seen_at: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
