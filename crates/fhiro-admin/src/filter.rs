use fhiro_types::models::{ContactEntry, WaitlistEntry};

/// Records the dashboard search box can match.
pub trait Searchable {
    /// Fields consulted by the free-text filter.
    fn search_fields(&self) -> Vec<&str>;

    /// `needle` must already be lower-cased.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl Searchable for WaitlistEntry {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.specialty.as_str(),
            self.location.as_str(),
        ]
    }
}

impl Searchable for ContactEntry {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.message.as_str()]
    }
}

/// Case-insensitive substring filter. An empty term keeps everything.
pub fn filter<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items.iter().filter(|item| item.matches(&needle)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn signup(name: &str, email: &str, specialty: &str, location: &str) -> WaitlistEntry {
        WaitlistEntry {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            specialty: specialty.into(),
            location: location.into(),
            source: "landing_page".into(),
            created_at: None,
        }
    }

    fn contact(name: &str, message: &str) -> ContactEntry {
        ContactEntry {
            id: Uuid::new_v4(),
            name: name.into(),
            email: "c@x.ie".into(),
            message: message.into(),
            read: false,
            created_at: None,
        }
    }

    #[test]
    fn empty_term_returns_everything() {
        let items = vec![
            signup("A", "a@x.ie", "Oncology", "Cork"),
            signup("B", "b@x.ie", "Urology", "Galway"),
        ];
        assert_eq!(filter(&items, "").len(), 2);
    }

    #[test]
    fn matches_any_waitlist_field_case_insensitively() {
        let items = vec![
            signup("Aoife", "aoife@x.ie", "Oncology", "Cork"),
            signup("Brian", "brian@y.ie", "Urology", "Galway"),
        ];
        let names = |term: &str| -> Vec<String> {
            filter(&items, term).into_iter().map(|e| e.name.clone()).collect()
        };
        assert_eq!(names("AOIFE"), vec!["Aoife"]);
        assert_eq!(names("@Y.IE"), vec!["Brian"]);
        assert_eq!(names("urol"), vec!["Brian"]);
        assert_eq!(names("cOrK"), vec!["Aoife"]);
        assert!(names("dublin").is_empty());
    }

    #[test]
    fn contacts_match_on_message_but_not_read_flag() {
        let items = vec![contact("Anonymous", "Pricing question"), contact("Ciara", "Hello")];
        let hits = filter(&items, "PRICING");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Anonymous");
        assert!(filter(&items, "false").is_empty());
    }
}
