use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored in place of an omitted specialty or location.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Stored in place of a blank contact name.
pub const ANONYMOUS: &str = "Anonymous";

/// Source tag for signups that don't name one.
pub const DEFAULT_SOURCE: &str = "landing_page";

/// Specialties offered by the waitlist form.
pub const SPECIALTIES: &[&str] = &[
    "Cardiology",
    "Dermatology",
    "Endocrinology",
    "Gastroenterology",
    "General Practice",
    "Geriatric Medicine",
    "Neurology",
    "Obstetrics & Gynaecology",
    "Oncology",
    "Ophthalmology",
    "Orthopaedics",
    "Paediatrics",
    "Psychiatry",
    "Radiology",
    "Respiratory Medicine",
    "Rheumatology",
    "Urology",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub location: String,
    pub source: String,
    /// `None` when the stored timestamp could not be read back.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// A normalized waitlist signup, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWaitlistEntry {
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub location: String,
    pub source: String,
}

/// A normalized contact message, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactEntry {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// The two append-only collections. Each one is also a dashboard tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Waitlist,
    Contacts,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Waitlist, Collection::Contacts];

    pub fn name(self) -> &'static str {
        match self {
            Self::Waitlist => "waitlist",
            Self::Contacts => "contacts",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waitlist" => Ok(Self::Waitlist),
            "contacts" => Ok(Self::Contacts),
            other => Err(anyhow::anyhow!("unknown collection '{}'", other)),
        }
    }
}

/// Full contents of one collection, newest first. Each snapshot replaces
/// whatever the receiver held before.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Waitlist(Vec<WaitlistEntry>),
    Contacts(Vec<ContactEntry>),
}

impl Snapshot {
    pub fn collection(&self) -> Collection {
        match self {
            Self::Waitlist(_) => Collection::Waitlist,
            Self::Contacts(_) => Collection::Contacts,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Waitlist(entries) => entries.len(),
            Self::Contacts(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
