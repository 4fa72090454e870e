//! Roster record classification
//!
//! Streams the combined tab-separated roster file in a single pass, prunes
//! the administrative columns, and routes each active record into up to two
//! of the four output categories based on its top-parent ID and relationship
//! type. The file is decoded lossily, so undecodable bytes never fail the
//! parse; a record shorter than a required fixed offset is fatal for the run.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ReferenceConfig;

/// Meaningful raw columns; anything past this is truncated before pruning.
pub const RAW_COLUMN_COUNT: usize = 26;
/// Raw column holding the record status.
pub const STATUS_COLUMN: usize = 21;
/// First field of the header row.
pub const HEADER_MARKER: &str = "GPO ID";
/// Synthetic column label inserted before the last field of every row.
pub const AFFILIATE_HEADER: &str = "Top Parent Affiliate";
/// Field count of every pruned row.
pub const PRUNED_COLUMN_COUNT: usize = 15;

/// Pruned column holding the relationship type.
const RELATIONSHIP_COLUMN: usize = 11;
/// Pruned column holding the top-parent ID.
const TOP_PARENT_COLUMN: usize = 12;

/// Administrative columns removed from every row, by original raw index.
/// Must stay in ascending order: removal walks the list with a running shift
/// correction so each removal targets the originally-intended column.
const DROPPED_COLUMNS: [usize; 11] = [1, 2, 13, 14, 15, 17, 18, 21, 22, 23, 24];

/// Affiliate label lookup by top-parent ID. First match wins, in listed
/// order; IDs outside every bucket get an empty label.
const AFFILIATE_LABELS: &[(&[&str], &str)] = &[
    (
        &["635796", "CA0053", "616890", "CA053", "601045"],
        "Adventist Health Aff",
    ),
    (&["OH2004", "669907"], "Mercy Health Aff"),
    (&["700273"], "Peace Health Aff"),
    (&["631225", "IL2185"], "Presence Health Network Aff"),
];

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Failed to read roster file: {0}")]
    Io(#[from] std::io::Error),

    /// A record with fewer fields than a fixed offset requires. Fatal for the
    /// run; there is no skip-and-continue and no partial-output recovery.
    #[error("record on line {line} has {fields} fields, expected at least {required}")]
    ShortRecord {
        line: usize,
        fields: usize,
        required: usize,
    },
}

/// Affiliation type of a facility with its top parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Owned,
    Leased,
    Managed,
    Affiliated,
    Employed,
    Other,
}

impl Relationship {
    pub fn parse(field: &str) -> Self {
        match field {
            "Owned" => Relationship::Owned,
            "Leased" => Relationship::Leased,
            "Managed" => Relationship::Managed,
            "Affiliated" => Relationship::Affiliated,
            "Employed" => Relationship::Employed,
            _ => Relationship::Other,
        }
    }

    pub fn is_owned_leased_managed(self) -> bool {
        matches!(
            self,
            Relationship::Owned | Relationship::Leased | Relationship::Managed
        )
    }

    pub fn is_affiliated(self) -> bool {
        matches!(self, Relationship::Affiliated | Relationship::Employed)
    }
}

/// The four output categories, each backed by one worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    SpgOlm = 0,
    SpgAff = 1,
    LidnOlm = 2,
    LidnAff = 3,
}

impl Category {
    /// Fixed sheet order of the output workbook.
    pub const ALL: [Category; 4] = [
        Category::SpgOlm,
        Category::SpgAff,
        Category::LidnOlm,
        Category::LidnAff,
    ];

    pub fn sheet_name(self) -> &'static str {
        match self {
            Category::SpgOlm => "SPG OLM",
            Category::SpgAff => "SPG Aff",
            Category::LidnOlm => "LIDN OLM",
            Category::LidnAff => "LIDN Aff",
        }
    }
}

/// The two reference ID sets, loaded from configuration and read-only for
/// the duration of a run.
#[derive(Debug, Clone)]
pub struct ReferenceIds {
    spg: HashSet<String>,
    lidn: HashSet<String>,
}

impl ReferenceIds {
    pub fn new(config: &ReferenceConfig) -> Self {
        ReferenceIds {
            spg: config.spg_ids.iter().cloned().collect(),
            lidn: config.lidn_ids.iter().cloned().collect(),
        }
    }
}

/// Classified records in insertion order, one collection per category, each
/// beginning with the shared header row.
#[derive(Debug, Default)]
pub struct ClassifiedRoster {
    sheets: [Vec<Vec<String>>; 4],
}

impl ClassifiedRoster {
    pub fn rows(&self, category: Category) -> &[Vec<String>] {
        &self.sheets[category as usize]
    }

    /// Data records across all categories, header rows excluded.
    pub fn record_count(&self) -> usize {
        self.sheets
            .iter()
            .map(|rows| rows.len().saturating_sub(1))
            .sum()
    }

    fn push(&mut self, category: Category, row: Vec<String>) {
        self.sheets[category as usize].push(row);
    }
}

/// Stream the combined roster file and classify every active record.
pub fn classify(path: &Path, ids: &ReferenceIds) -> Result<ClassifiedRoster, RosterError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut roster = ClassifiedRoster::default();
    let mut header_seen = false;
    let mut line_no = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = String::from_utf8_lossy(&buf);
        let mut row = split_fields(&line);

        // Status sits at a fixed raw offset; shorter records are fatal.
        let active = match row.get(STATUS_COLUMN) {
            Some(status) => status.as_str() == "Active",
            None => {
                return Err(RosterError::ShortRecord {
                    line: line_no,
                    fields: row.len(),
                    required: STATUS_COLUMN + 1,
                })
            }
        };
        // The status filter only applies once the header has been seen.
        if header_seen && !active {
            continue;
        }

        prune_columns(&mut row, line_no)?;

        if header_seen {
            dispatch(&mut roster, row, ids);
        } else if row.first().map(String::as_str) == Some(HEADER_MARKER) {
            let mut header = row;
            header.insert(header.len() - 1, AFFILIATE_HEADER.to_string());
            for category in Category::ALL {
                roster.push(category, header.clone());
            }
            header_seen = true;
            debug!("Header row found on line {line_no}");
        }
        // Pre-header lines that are not the header are dropped.
    }

    info!(
        "Classified {} records from {} lines",
        roster.record_count(),
        line_no
    );
    Ok(roster)
}

/// Strip quote characters and the trailing line ending, then split on tabs.
fn split_fields(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.split('\t')
        .map(|field| field.replace('"', ""))
        .collect()
}

/// Truncate to the meaningful raw columns, then remove the administrative
/// columns in ascending original order with a shift correction for prior
/// removals.
fn prune_columns(row: &mut Vec<String>, line: usize) -> Result<(), RosterError> {
    row.truncate(RAW_COLUMN_COUNT);
    for (shift, &column) in DROPPED_COLUMNS.iter().enumerate() {
        let index = column - shift;
        if index >= row.len() {
            return Err(RosterError::ShortRecord {
                line,
                fields: row.len() + shift,
                required: column + 1,
            });
        }
        row.remove(index);
    }
    Ok(())
}

fn affiliate_label(top_parent_id: &str) -> &'static str {
    for (ids, label) in AFFILIATE_LABELS {
        if ids.contains(&top_parent_id) {
            return label;
        }
    }
    ""
}

/// Label the pruned row and append it to every category whose reference set
/// contains its top-parent ID and whose relationship bucket matches. A record
/// lands in 0, 1, or 2 categories.
fn dispatch(roster: &mut ClassifiedRoster, mut row: Vec<String>, ids: &ReferenceIds) {
    let top_parent = row[TOP_PARENT_COLUMN].clone();
    let relationship = Relationship::parse(&row[RELATIONSHIP_COLUMN]);
    row.insert(row.len() - 1, affiliate_label(&top_parent).to_string());

    if ids.spg.contains(&top_parent) {
        if relationship.is_owned_leased_managed() {
            roster.push(Category::SpgOlm, row.clone());
        } else if relationship.is_affiliated() {
            roster.push(Category::SpgAff, row.clone());
        }
    }
    if ids.lidn.contains(&top_parent) {
        if relationship.is_owned_leased_managed() {
            roster.push(Category::LidnOlm, row);
        } else if relationship.is_affiliated() {
            roster.push(Category::LidnAff, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_is_position_stable_under_shift_correction() {
        // Synthetic row where each column holds its own index as a marker.
        let mut row: Vec<String> = (0..RAW_COLUMN_COUNT).map(|i| format!("m{i}")).collect();
        prune_columns(&mut row, 1).unwrap();

        assert_eq!(row.len(), PRUNED_COLUMN_COUNT);
        for dropped in DROPPED_COLUMNS {
            assert!(!row.contains(&format!("m{dropped}")), "m{dropped} survived");
        }
        // Survivors keep their original relative order.
        let expected: Vec<String> = [0, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 16, 19, 20, 25]
            .iter()
            .map(|i| format!("m{i}"))
            .collect();
        assert_eq!(row, expected);
    }

    #[test]
    fn prune_truncates_excess_columns_first() {
        let mut row: Vec<String> = (0..30).map(|i| format!("m{i}")).collect();
        prune_columns(&mut row, 1).unwrap();
        assert_eq!(row.len(), PRUNED_COLUMN_COUNT);
        assert!(!row.contains(&"m26".to_string()));
    }

    #[test]
    fn prune_fails_on_short_row() {
        let mut row: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
        let err = prune_columns(&mut row, 7).unwrap_err();
        assert!(matches!(err, RosterError::ShortRecord { line: 7, .. }));
    }

    #[test]
    fn affiliate_labels_are_exclusive_and_ordered() {
        assert_eq!(affiliate_label("635796"), "Adventist Health Aff");
        assert_eq!(affiliate_label("CA053"), "Adventist Health Aff");
        assert_eq!(affiliate_label("669907"), "Mercy Health Aff");
        assert_eq!(affiliate_label("700273"), "Peace Health Aff");
        assert_eq!(affiliate_label("IL2185"), "Presence Health Network Aff");
        assert_eq!(affiliate_label("CA2043"), "");
    }

    #[test]
    fn relationship_parse_covers_both_buckets() {
        assert!(Relationship::parse("Owned").is_owned_leased_managed());
        assert!(Relationship::parse("Leased").is_owned_leased_managed());
        assert!(Relationship::parse("Managed").is_owned_leased_managed());
        assert!(Relationship::parse("Affiliated").is_affiliated());
        assert!(Relationship::parse("Employed").is_affiliated());
        let other = Relationship::parse("Divested");
        assert!(!other.is_owned_leased_managed() && !other.is_affiliated());
    }

    #[test]
    fn quote_characters_are_stripped_before_splitting() {
        let row = split_fields("\"GPO ID\"\tname\t\"a\"\"b\"\r\n");
        assert_eq!(row, vec!["GPO ID", "name", "ab"]);
    }
}
