use serde::{Deserialize, Serialize};

use crate::api::WaitlistStats;
use crate::models::{Collection, ContactEntry, WaitlistEntry};

/// Admin view access state.
///
/// `Unauthenticated -> Authenticating -> {Authorized, Unauthorized}`, and back
/// to `Unauthenticated` on sign-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    Unauthenticated,
    Authenticating,
    Authorized,
    Unauthorized,
}

/// Rows of the active tab after filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "lowercase")]
pub enum DashboardRows {
    Waitlist(Vec<WaitlistEntry>),
    Contacts(Vec<ContactEntry>),
}

impl DashboardRows {
    pub fn len(&self) -> usize {
        match self {
            Self::Waitlist(rows) => rows.len(),
            Self::Contacts(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One render of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub tab: Collection,
    pub search: String,
    /// True until the first waitlist snapshot has arrived.
    pub loading: bool,
    pub waitlist_total: usize,
    pub contacts_total: usize,
    pub stats: WaitlistStats,
    pub rows: DashboardRows,
}

/// Events sent over the admin gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Access state changed. `email` is the signed-in identity, if any.
    AccessState {
        state: AccessState,
        email: Option<String>,
    },

    /// Fresh render after a snapshot or a view command
    DashboardView(DashboardView),

    /// CSV export of the active tab
    Export {
        filename: String,
        content_type: String,
        csv: String,
    },

    /// Session revoked; the server closes the socket after this
    SignedOut,
}

/// Commands sent FROM client TO server over the admin gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the connection with a session token
    Identify { token: String },

    /// Switch the active tab
    SelectTab { tab: Collection },

    /// Replace the free-text filter
    Search { term: String },

    /// Export the active tab, filtered, as CSV
    Export,

    /// Revoke the session and close
    SignOut,
}
