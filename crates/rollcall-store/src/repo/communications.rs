use crate::error::{Result, StoreError};
use rollcall_core::domain::{
    CanonicalPhone, CommunicationId, CommunicationRecord, ContactId, Direction,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

const SMS_KIND: &str = "sms";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCommunication {
    pub id: CommunicationId,
    pub contact_id: ContactId,
    pub phone: CanonicalPhone,
    pub kind: String,
    pub direction: Direction,
    pub message: String,
    pub occurred_at: i64,
    pub contact_name: Option<String>,
    pub readable_date: Option<String>,
    pub created_at: i64,
}

type CommunicationRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    Option<String>,
    Option<String>,
    i64,
);

pub struct CommunicationsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CommunicationsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns `false` when a row with the same contact, message and
    /// timestamp already exists; the check and the write are one statement.
    pub fn insert_if_absent(
        &self,
        now_utc: i64,
        contact_id: &ContactId,
        record: &CommunicationRecord,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO communications
             (id, contact_id, phone, kind, direction, message, occurred_at, contact_name, readable_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(contact_id, message, occurred_at) DO NOTHING;",
            params![
                CommunicationId::new().to_string(),
                contact_id.to_string(),
                record.phone.as_str(),
                SMS_KIND,
                record.direction.as_str(),
                record.message,
                record.occurred_at,
                record.contact_name,
                record.readable_date,
                now_utc
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn exists(&self, contact_id: &ContactId, message: &str, occurred_at: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM communications
                 WHERE contact_id = ?1 AND message = ?2 AND occurred_at = ?3
                 LIMIT 1;",
                params![contact_id.to_string(), message, occurred_at],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn list_for_contact(
        &self,
        contact_id: &ContactId,
        limit: i64,
    ) -> Result<Vec<StoredCommunication>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, phone, kind, direction, message, occurred_at, contact_name, readable_date, created_at
             FROM communications
             WHERE contact_id = ?1
             ORDER BY occurred_at DESC, id ASC
             LIMIT ?2;",
        )?;
        let rows = stmt.query_map(
            params![contact_id.to_string(), limit],
            |row| -> rusqlite::Result<CommunicationRow> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            },
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(communication_from_row(row?)?);
        }
        Ok(items)
    }

    pub fn count_for_contact(&self, contact_id: &ContactId) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM communications WHERE contact_id = ?1;",
            [contact_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn communication_from_row(row: CommunicationRow) -> Result<StoredCommunication> {
    let (
        id,
        contact_id,
        phone,
        kind,
        direction,
        message,
        occurred_at,
        contact_name,
        readable_date,
        created_at,
    ) = row;
    Ok(StoredCommunication {
        id: CommunicationId::from_str(&id).map_err(|_| StoreError::InvalidId(id.clone()))?,
        contact_id: ContactId::from_str(&contact_id)
            .map_err(|_| StoreError::InvalidId(contact_id.clone()))?,
        phone: CanonicalPhone::parse(&phone)?,
        kind,
        direction: Direction::parse(&direction)?,
        message,
        occurred_at,
        contact_name,
        readable_date,
        created_at,
    })
}
