use chrono::{DateTime, Utc};
use tracing::debug;

use fhiro_types::events::{DashboardRows, DashboardView};
use fhiro_types::models::{Collection, ContactEntry, Snapshot, WaitlistEntry};

use crate::aggregate::waitlist_stats;
use crate::export::{CsvExport, export};
use crate::filter::filter;

/// In-memory state behind one admin view.
///
/// Lists are only ever replaced wholesale by snapshots. Everything shown is
/// derived again on each render.
#[derive(Debug, Clone)]
pub struct Dashboard {
    waitlist: Vec<WaitlistEntry>,
    contacts: Vec<ContactEntry>,
    waitlist_loaded: bool,
    tab: Collection,
    search: String,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            waitlist: Vec::new(),
            contacts: Vec::new(),
            waitlist_loaded: false,
            tab: Collection::Waitlist,
            search: String::new(),
        }
    }

    pub fn apply(&mut self, snapshot: Snapshot) {
        debug!("Applying {} snapshot ({} entries)", snapshot.collection(), snapshot.len());
        match snapshot {
            Snapshot::Waitlist(entries) => {
                self.waitlist = entries;
                self.waitlist_loaded = true;
            }
            Snapshot::Contacts(entries) => self.contacts = entries,
        }
    }

    pub fn select_tab(&mut self, tab: Collection) {
        self.tab = tab;
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn tab(&self) -> Collection {
        self.tab
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn waitlist(&self) -> &[WaitlistEntry] {
        &self.waitlist
    }

    pub fn contacts(&self) -> &[ContactEntry] {
        &self.contacts
    }

    pub fn filtered_waitlist(&self) -> Vec<&WaitlistEntry> {
        filter(&self.waitlist, &self.search)
    }

    pub fn filtered_contacts(&self) -> Vec<&ContactEntry> {
        filter(&self.contacts, &self.search)
    }

    pub fn render(&self, now: DateTime<Utc>) -> DashboardView {
        let rows = match self.tab {
            Collection::Waitlist => {
                DashboardRows::Waitlist(self.filtered_waitlist().into_iter().cloned().collect())
            }
            Collection::Contacts => {
                DashboardRows::Contacts(self.filtered_contacts().into_iter().cloned().collect())
            }
        };

        DashboardView {
            tab: self.tab,
            search: self.search.clone(),
            loading: !self.waitlist_loaded,
            waitlist_total: self.waitlist.len(),
            contacts_total: self.contacts.len(),
            stats: waitlist_stats(&self.waitlist, now),
            rows,
        }
    }

    /// CSV of the active tab as currently filtered.
    pub fn export(&self, prefix: &str, now: DateTime<Utc>) -> CsvExport {
        match self.tab {
            Collection::Waitlist => export(&self.filtered_waitlist(), prefix, self.tab, now),
            Collection::Contacts => export(&self.filtered_contacts(), prefix, self.tab, now),
        }
    }
}
