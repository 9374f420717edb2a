//! Database row types. These map directly to SQLite rows and stay distinct
//! from the fhiro-types records so the storage layer owns its own shape.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use fhiro_types::models::{ContactEntry, WaitlistEntry};

pub struct WaitlistRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub location: String,
    pub source: String,
    pub created_at: String,
}

pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

/// Parse a stored timestamp. Rows written by this crate are RFC 3339; plain
/// `datetime('now')` values are accepted as naive UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}

fn parse_id(raw: &str, table: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", table, raw, e);
        Uuid::nil()
    })
}

fn created_at(raw: &str, id: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!("Corrupt created_at '{}' on '{}'", raw, id);
    }
    parsed
}

impl From<WaitlistRow> for WaitlistEntry {
    fn from(row: WaitlistRow) -> Self {
        WaitlistEntry {
            id: parse_id(&row.id, "waitlist"),
            created_at: created_at(&row.created_at, &row.id),
            name: row.name,
            email: row.email,
            specialty: row.specialty,
            location: row.location,
            source: row.source,
        }
    }
}

impl From<ContactRow> for ContactEntry {
    fn from(row: ContactRow) -> Self {
        ContactEntry {
            id: parse_id(&row.id, "contacts"),
            created_at: created_at(&row.created_at, &row.id),
            name: row.name,
            email: row.email,
            message: row.message,
            read: row.read,
        }
    }
}
