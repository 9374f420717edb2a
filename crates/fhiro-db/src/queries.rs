use crate::models::{ContactRow, UserRow, WaitlistRow};
use crate::Database;
use anyhow::Result;
use rusqlite::Connection;

use fhiro_types::models::{Collection, NewContactEntry, NewWaitlistEntry, Snapshot};

impl Database {
    // -- Waitlist --

    /// Append one signup. Returns the server-assigned `created_at`.
    pub fn insert_waitlist(&self, id: &str, entry: &NewWaitlistEntry) -> Result<String> {
        self.with_conn(|conn| {
            let created_at = conn.query_row(
                "INSERT INTO waitlist (id, name, email, specialty, location, source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING created_at",
                rusqlite::params![
                    id,
                    &entry.name,
                    &entry.email,
                    &entry.specialty,
                    &entry.location,
                    &entry.source,
                ],
                |row| row.get(0),
            )?;
            Ok(created_at)
        })
    }

    /// All signups, newest first.
    pub fn list_waitlist(&self) -> Result<Vec<WaitlistRow>> {
        self.with_conn(query_waitlist)
    }

    // -- Contacts --

    /// Append one contact message, unread. Returns the server-assigned `created_at`.
    pub fn insert_contact(&self, id: &str, entry: &NewContactEntry) -> Result<String> {
        self.with_conn(|conn| {
            let created_at = conn.query_row(
                "INSERT INTO contacts (id, name, email, message, read)
                 VALUES (?1, ?2, ?3, ?4, 0)
                 RETURNING created_at",
                rusqlite::params![id, &entry.name, &entry.email, &entry.message],
                |row| row.get(0),
            )?;
            Ok(created_at)
        })
    }

    /// All contact messages, newest first.
    pub fn list_contacts(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(query_contacts)
    }

    /// Read one collection in full, converted to shared records.
    pub fn load_snapshot(&self, collection: Collection) -> Result<Snapshot> {
        Ok(match collection {
            Collection::Waitlist => {
                Snapshot::Waitlist(self.list_waitlist()?.into_iter().map(Into::into).collect())
            }
            Collection::Contacts => {
                Snapshot::Contacts(self.list_contacts()?.into_iter().map(Into::into).collect())
            }
        })
    }

    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )?;
            Ok(())
        })
    }

    /// Create an account together with its first session, atomically.
    /// Returns false, writing nothing, if the email is already registered.
    pub fn register_account(
        &self,
        user_id: &str,
        email: &str,
        password_hash: &str,
        session_id: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let inserted = tx.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO NOTHING",
                (user_id, email, password_hash),
            )?;
            if inserted == 0 {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO sessions (id, user_id) VALUES (?1, ?2)",
                (session_id, user_id),
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id) VALUES (?1, ?2)",
                (id, user_id),
            )?;
            Ok(())
        })
    }

    pub fn session_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM sessions WHERE id = ?1", [id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Revoke a session. Returns false if it was already gone.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_waitlist(conn: &Connection) -> Result<Vec<WaitlistRow>> {
    // rowid breaks ties between writes landing in the same millisecond
    let mut stmt = conn.prepare(
        "SELECT id, name, email, specialty, location, source, created_at
         FROM waitlist
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(WaitlistRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                specialty: row.get(3)?,
                location: row.get(4)?,
                source: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_contacts(conn: &Connection) -> Result<Vec<ContactRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, message, read, created_at
         FROM contacts
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ContactRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                message: row.get(3)?,
                read: row.get::<_, i64>(4)? != 0,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, password, created_at FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
