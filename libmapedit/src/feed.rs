//! Parsing of the published spreadsheet feed into location records
//!
//! The feed is comma-separated text with a header row. Data rows come in one of two positional
//! layouts: the current one, which starts with an id column and ends with a driver column, and
//! the legacy one, which has neither. Columns are only ever appended to the current layout so
//! that legacy rows can still be recognized.
use crate::location::{Location, LocationId};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Column positions of the current layout
mod current {
    pub(super) const ID: usize = 0;
    pub(super) const NAME: usize = 1;
    pub(super) const HUB: usize = 2;
    pub(super) const ADDRESS: usize = 3;
    pub(super) const LAT: usize = 4;
    pub(super) const LNG: usize = 5;
    pub(super) const VIABILITY: usize = 6;
    pub(super) const NOTES: usize = 7;
    pub(super) const EXPECTING: usize = 8;
    pub(super) const DRIVER: usize = 9;
    pub(super) const WIDTH: usize = 10;
}

/// Column positions of the legacy layout (no id, no driver)
mod legacy {
    pub(super) const NAME: usize = 0;
    pub(super) const HUB: usize = 1;
    pub(super) const ADDRESS: usize = 2;
    pub(super) const LAT: usize = 3;
    pub(super) const LNG: usize = 4;
    pub(super) const VIABILITY: usize = 5;
    pub(super) const NOTES: usize = 6;
    pub(super) const EXPECTING: usize = 7;
}

/// Split a single line of comma-separated text into its fields.
///
/// Fields may be wrapped in double quotes, in which case commas and newlines inside them are
/// literal and `""` stands for one quote character. This never fails: an unterminated quote
/// simply makes the rest of the line part of the last field.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse the longest leading decimal number of `s`, the way a spreadsheet export is usually
/// read: leading whitespace is skipped and trailing garbage is ignored.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a leading positive integer id. Zero, negative, and non-numeric values count as no id, and
/// so does the largest possible id, since no id could follow it.
fn parse_id(s: &str) -> Option<LocationId> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end]
        .parse::<LocationId>()
        .ok()
        .filter(|id| *id > 0 && *id < LocationId::MAX)
}

fn field(fields: &[String], index: usize) -> String {
    fields
        .get(index)
        .map(|f| f.trim().to_string())
        .unwrap_or_default()
}

fn coordinates(fields: &[String], lat: usize, lng: usize) -> Option<(f64, f64)> {
    let lat = parse_float_prefix(fields.get(lat)?)?;
    let lng = parse_float_prefix(fields.get(lng)?)?;
    Some((lat, lng))
}

/// A data row whose layout has been recognized, but which has not yet been given an id
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub id: Option<LocationId>,
    pub name: String,
    pub hub: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub viability: String,
    pub notes: String,
    pub expecting: String,
    pub driver: String,
}

impl RowRecord {
    fn into_location(self, id: LocationId) -> Location {
        Location {
            id,
            name: self.name,
            hub: self.hub,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            viability: self.viability,
            notes: self.notes,
            expecting: self.expecting,
            driver: self.driver,
        }
    }
}

/// The result of recognizing the layout of a single data row
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedRow {
    Current(RowRecord),
    Legacy(RowRecord),
    Invalid,
}

impl ClassifiedRow {
    pub fn into_record(self) -> Option<RowRecord> {
        match self {
            ClassifiedRow::Current(r) | ClassifiedRow::Legacy(r) => Some(r),
            ClassifiedRow::Invalid => None,
        }
    }
}

fn current_row(fields: &[String], (lat, lng): (f64, f64)) -> RowRecord {
    RowRecord {
        id: fields.get(current::ID).and_then(|f| parse_id(f)),
        name: field(fields, current::NAME),
        hub: field(fields, current::HUB),
        address: field(fields, current::ADDRESS),
        lat,
        lng,
        viability: field(fields, current::VIABILITY),
        notes: field(fields, current::NOTES),
        expecting: field(fields, current::EXPECTING),
        driver: field(fields, current::DRIVER),
    }
}

fn legacy_row(fields: &[String], (lat, lng): (f64, f64)) -> RowRecord {
    RowRecord {
        id: None,
        name: field(fields, legacy::NAME),
        hub: field(fields, legacy::HUB),
        address: field(fields, legacy::ADDRESS),
        lat,
        lng,
        viability: field(fields, legacy::VIABILITY),
        notes: field(fields, legacy::NOTES),
        expecting: field(fields, legacy::EXPECTING),
        driver: String::new(),
    }
}

/// Decide which layout a row of fields follows.
///
/// The current layout is tried first and the legacy one is the fallback when its coordinates do
/// not parse. A short row that starts with a name instead of an id, and whose coordinates parse
/// under both layouts, is also treated as legacy, since a shifted legacy row can look numeric in
/// the current coordinate columns. A blank first column is a current row without an id.
pub fn classify_row(fields: &[String]) -> ClassifiedRow {
    let current = coordinates(fields, current::LAT, current::LNG);
    let legacy = coordinates(fields, legacy::LAT, legacy::LNG);
    let starts_with_name = fields
        .first()
        .map(|f| f.trim())
        .is_some_and(|f| !f.is_empty() && parse_float_prefix(f).is_none());

    match (current, legacy) {
        (Some(_), Some(coords)) if starts_with_name && fields.len() < current::WIDTH => {
            ClassifiedRow::Legacy(legacy_row(fields, coords))
        }
        (Some(coords), _) => ClassifiedRow::Current(current_row(fields, coords)),
        (None, Some(coords)) => ClassifiedRow::Legacy(legacy_row(fields, coords)),
        (None, None) => ClassifiedRow::Invalid,
    }
}

/// Every valid location of one feed, keyed by id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSnapshot {
    pub locations: BTreeMap<LocationId, Location>,
    /// Driver names of the accepted rows, in feed order
    pub drivers: Vec<String>,
    /// The id the next locally created location will get
    pub next_id: LocationId,
    /// Number of non-blank lines after the header, valid or not
    pub data_rows: usize,
}

impl FeedSnapshot {
    /// Build a snapshot out of the full text of the feed. Rows without valid coordinates in
    /// either layout are dropped; rows without an id get one from a running counter that always
    /// stays above every id seen so far.
    pub fn parse(text: &str) -> Self {
        let mut snapshot = FeedSnapshot::default();
        let mut max_id: LocationId = 0;

        let lines = text
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .skip(1);
        for (lineno, line) in lines.enumerate() {
            snapshot.data_rows += 1;
            let fields = split_line(line);
            let row = classify_row(&fields);
            trace!(lineno, ?row, "classified feed row");
            let Some(record) = row.into_record() else {
                debug!(lineno, line, "dropping row without valid coordinates");
                continue;
            };
            let id = match record.id {
                Some(id) => {
                    max_id = max_id.max(id);
                    id
                }
                None => match max_id.checked_add(1).filter(|id| *id < LocationId::MAX) {
                    Some(id) => {
                        max_id = id;
                        id
                    }
                    None => {
                        debug!(lineno, line, "dropping row, no id left to assign");
                        continue;
                    }
                },
            };
            let location = record.into_location(id);
            snapshot.drivers.push(location.driver.clone());
            snapshot.locations.insert(id, location);
        }
        // max_id is always below LocationId::MAX
        snapshot.next_id = max_id + 1;
        snapshot
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    const HEADER: &str = "ID,Location,Hub,Address,Lat,Lng,Viability,Notes,Expecting,Driver";

    fn fields(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_line() {
        assert_eq!(split_line("a,b,c"), fields(&["a", "b", "c"]));
        assert_eq!(split_line(""), fields(&[""]));
        assert_eq!(split_line("a,,"), fields(&["a", "", ""]));
        assert_eq!(
            split_line(r#"1,"Main St, Suite 2",x"#),
            fields(&["1", "Main St, Suite 2", "x"])
        );
        assert_eq!(
            split_line(r#""say ""hi""",2"#),
            fields(&[r#"say "hi""#, "2"])
        );
        assert_eq!(
            split_line("\"two\nlines\",3"),
            fields(&["two\nlines", "3"])
        );
    }

    #[test]
    fn test_split_line_unterminated() {
        assert_eq!(
            split_line(r#"1,"open, never closed,2"#),
            fields(&["1", "open, never closed,2"])
        );
        assert_eq!(split_line("\""), fields(&[""]));
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("40.0"), Some(40.0));
        assert_eq!(parse_float_prefix("  -74.5 "), Some(-74.5));
        assert_eq!(parse_float_prefix("12.5abc"), Some(12.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("1e999"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("Old Spot"), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("5"), Some(5));
        assert_eq!(parse_id(" 12 "), Some(12));
        assert_eq!(parse_id("7abc"), Some(7));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("Old Spot"), None);
        assert_eq!(parse_id("18446744073709551615"), None);
        assert_eq!(parse_id("18446744073709551614"), Some(LocationId::MAX - 1));
    }

    #[test]
    fn test_classify_row() {
        let row = fields(&[
            "5", "Depot", "Yes", "1 Main St", "40.0", "-74.0", "8", "ok", "No", "",
        ]);
        let ClassifiedRow::Current(record) = classify_row(&row) else {
            panic!("expected current layout");
        };
        assert_eq!(record.id, Some(5));
        assert_eq!(record.lat, 40.0);

        let row = fields(&["Old Spot", "No", "2 Elm St", "41.0", "-73.5", "5", "note", "Yes"]);
        let ClassifiedRow::Legacy(record) = classify_row(&row) else {
            panic!("expected legacy layout");
        };
        assert_eq!(record.id, None);
        assert_eq!(record.name, "Old Spot");
        assert_eq!((record.lat, record.lng), (41.0, -73.5));

        let row = fields(&["Bad", "No", "addr", "north", "west", "5", "note", "Yes"]);
        assert_eq!(classify_row(&row), ClassifiedRow::Invalid);
        assert_eq!(classify_row(&fields(&[""])), ClassifiedRow::Invalid);
    }

    #[test]
    fn test_classify_current_without_id() {
        // blank id, no driver column, and the legacy coordinate columns are not numeric
        let row = fields(&["", "Shed", "No", "addr", "40.5", "-74.5", "3", "n", "Yes"]);
        let ClassifiedRow::Current(record) = classify_row(&row) else {
            panic!("expected current layout");
        };
        assert_eq!(record.id, None);
        assert_eq!(record.name, "Shed");
        assert_eq!((record.lat, record.lng), (40.5, -74.5));
    }

    #[test]
    fn test_classify_blank_id_numeric_address() {
        // the address starts with a number, so both layouts find coordinates
        let row = fields(&["", "Shed", "No", "12 Main St", "40.5", "-74.5", "3", "n", "Yes"]);
        let ClassifiedRow::Current(record) = classify_row(&row) else {
            panic!("expected current layout");
        };
        assert_eq!(record.id, None);
        assert_eq!(record.name, "Shed");
        assert_eq!(record.address, "12 Main St");
        assert_eq!((record.lat, record.lng), (40.5, -74.5));
    }

    #[test]
    fn test_huge_ids() {
        let text = format!(
            "{HEADER}\n{}\n{}\n",
            "18446744073709551615,Max,No,,40,-74,,,,", "18446744073709551614,Near,No,,41,-74,,,,"
        );
        let snapshot = FeedSnapshot::parse(&text);
        // the largest id counts as no id, so the row gets a synthesized one
        assert_eq!(
            snapshot.locations.keys().copied().collect::<Vec<_>>(),
            vec![1, LocationId::MAX - 1]
        );
        assert_eq!(snapshot.locations[&1].name, "Max");
        assert_eq!(snapshot.next_id, LocationId::MAX);
        assert_eq!(snapshot.data_rows, 2);

        let snapshot = FeedSnapshot::parse(&format!(
            "{HEADER}\n18446744073709551614,Near,No,,41,-74,,,,\n,Blank,No,,40,-74,,,,\n"
        ));
        assert_eq!(snapshot.locations.len(), 1);
        assert_eq!(snapshot.next_id, LocationId::MAX);
    }

    #[test]
    fn test_current_row() {
        let text = format!("{HEADER}\n5,Depot,Yes,1 Main St,40.0,-74.0,8,ok,No,\n");
        let snapshot = FeedSnapshot::parse(&text);
        assert_eq!(snapshot.locations.len(), 1);
        assert_eq!(snapshot.next_id, 6);
        let loc = &snapshot.locations[&5];
        assert_eq!(loc.id, 5);
        assert_eq!(loc.name, "Depot");
        assert_eq!(loc.hub, "Yes");
        assert_eq!(loc.address, "1 Main St");
        assert_eq!((loc.lat, loc.lng), (40.0, -74.0));
        assert_eq!(loc.viability, "8");
        assert_eq!(loc.notes, "ok");
        assert!(!loc.is_expecting());
        assert_eq!(loc.driver, "");
    }

    #[test]
    fn test_legacy_row() {
        let text = format!("{HEADER}\nOld Spot,No,2 Elm St,41.0,-73.5,5,note,Yes\n");
        let snapshot = FeedSnapshot::parse(&text);
        assert_eq!(snapshot.locations.len(), 1);
        let loc = &snapshot.locations[&1];
        assert_eq!(loc.name, "Old Spot");
        assert_eq!(loc.hub, "No");
        assert_eq!(loc.address, "2 Elm St");
        assert_eq!((loc.lat, loc.lng), (41.0, -73.5));
        assert!(loc.is_expecting());
        assert_eq!(loc.driver, "");
        assert_eq!(snapshot.next_id, 2);
    }

    #[test]
    fn test_malformed_rows_dropped() {
        let text = format!(
            "{HEADER}\r\n1,A,No,,40,-74,,,,\r\n\r\n2,B,No,,north,west,,,,\r\nC,No,addr,up,down\r\n3,D,No,,41,-73,,,,Bob\r\n"
        );
        let snapshot = FeedSnapshot::parse(&text);
        assert_eq!(snapshot.data_rows, 4);
        assert_eq!(
            snapshot.locations.keys().copied().collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(snapshot.locations[&3].driver, "Bob");
        assert_eq!(snapshot.next_id, 4);
    }

    #[test]
    fn test_id_assignment() {
        let text = format!(
            "{HEADER}\n10,A,No,,40,-74,,,,\n,B,No,,40,-74,,,,\n3,C,No,,40,-74,,,,\nD,No,addr,41,-73,,,\n"
        );
        let snapshot = FeedSnapshot::parse(&text);
        assert_eq!(
            snapshot.locations.keys().copied().collect::<Vec<_>>(),
            vec![3, 10, 11, 12]
        );
        assert_eq!(snapshot.locations[&11].name, "B");
        assert_eq!(snapshot.locations[&12].name, "D");
        assert_eq!(snapshot.next_id, 13);
    }

    #[test]
    fn test_auto_ids_then_explicit() {
        let text = format!("{HEADER}\n,A,No,,40,-74,,,,\n,B,No,,40,-74,,,,\n7,C,No,,40,-74,,,,\n");
        let snapshot = FeedSnapshot::parse(&text);
        assert_eq!(
            snapshot.locations.keys().copied().collect::<Vec<_>>(),
            vec![1, 2, 7]
        );
        assert_eq!(snapshot.next_id, 8);
    }

    #[test]
    fn test_empty_feed() {
        let blank_rows = format!("{HEADER}\n  \n");
        for text in ["", "\n\n", HEADER, blank_rows.as_str()] {
            let snapshot = FeedSnapshot::parse(text);
            assert!(snapshot.locations.is_empty());
            assert_eq!(snapshot.data_rows, 0);
            assert_eq!(snapshot.next_id, 1);
        }
    }

    #[test]
    fn test_quoted_fields() {
        let text = format!(
            "{HEADER}\n4,\"Warehouse, North\",No,\"12 \"\"Big\"\" Rd\",40.1,-74.2,9,\"a, b\",yes,\" Carol \"\n"
        );
        let snapshot = FeedSnapshot::parse(&text);
        let loc = &snapshot.locations[&4];
        assert_eq!(loc.name, "Warehouse, North");
        assert_eq!(loc.address, "12 \"Big\" Rd");
        assert_eq!(loc.notes, "a, b");
        assert_eq!(loc.driver, "Carol");
        assert_eq!(snapshot.drivers, vec!["Carol".to_string()]);
    }

    #[test]
    fn test_deterministic() {
        let text = format!(
            "{HEADER}\n5,Depot,Yes,1 Main St,40.0,-74.0,8,ok,No,\nOld Spot,No,2 Elm St,41.0,-73.5,5,note,Yes\n,X,No,,1,2,,,,Dan\n"
        );
        let first = FeedSnapshot::parse(&text);
        let second = FeedSnapshot::parse(&text);
        assert_eq!(first, second);
        assert_eq!(first.next_id, 8);
    }
}
