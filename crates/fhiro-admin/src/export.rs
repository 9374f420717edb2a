use chrono::{DateTime, NaiveDate, Utc};

use fhiro_types::models::{Collection, ContactEntry, WaitlistEntry};

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Records that can be written as one CSV row.
pub trait CsvRecord {
    const HEADERS: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

impl CsvRecord for WaitlistEntry {
    const HEADERS: &'static [&'static str] = &["Name", "Email", "Specialty", "Location", "Date"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.specialty.clone(),
            self.location.clone(),
            format_timestamp(self.created_at),
        ]
    }
}

impl CsvRecord for ContactEntry {
    const HEADERS: &'static [&'static str] = &["Name", "Email", "Message", "Date"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.message.clone(),
            format_timestamp(self.created_at),
        ]
    }
}

/// A finished export, ready to hand to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

/// Date column format. Null timestamps render as `N/A`.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.format("%-d %b %Y, %H:%M").to_string(),
        None => "N/A".to_string(),
    }
}

/// Always quoted; embedded quotes are doubled.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn write_row<S: AsRef<str>>(out: &mut String, cells: &[S]) {
    let line: Vec<String> = cells.iter().map(|c| quote(c.as_ref())).collect();
    out.push_str(&line.join(","));
}

/// Header row plus one row per record, newline separated.
pub fn to_csv<T: CsvRecord>(records: &[&T]) -> String {
    let mut out = String::new();
    write_row(&mut out, T::HEADERS);
    for record in records {
        out.push('\n');
        write_row(&mut out, &record.fields());
    }
    out
}

/// `<prefix>-<tab>-<date>.csv`, or `<tab>-<date>.csv` without a prefix.
pub fn export_filename(prefix: &str, tab: Collection, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    if prefix.is_empty() {
        format!("{}-{}.csv", tab, date)
    } else {
        format!("{}-{}-{}.csv", prefix, tab, date)
    }
}

pub fn export<T: CsvRecord>(
    records: &[&T],
    prefix: &str,
    tab: Collection,
    now: DateTime<Utc>,
) -> CsvExport {
    CsvExport {
        filename: export_filename(prefix, tab, now.date_naive()),
        content_type: CSV_CONTENT_TYPE,
        body: to_csv(records),
    }
}
