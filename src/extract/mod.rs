// src/extract/mod.rs
//
// Table-to-record extraction. The algorithms here only see the `TableNode`
// and `RowNode` capabilities; `html` provides them on top of `scraper`.

pub mod html;

pub use html::{
    extract_records, extract_sections, select_table, select_tables, table_marker, HtmlRow,
    HtmlTable,
};

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One row of a table, as far as extraction cares.
pub trait RowNode {
    /// Trimmed text of each header cell, in order.
    fn header_cells(&self) -> Vec<String>;
    /// Trimmed text of each data cell, in order.
    fn data_cells(&self) -> Vec<String>;
    /// Header and data cells together.
    fn cell_count(&self) -> usize;
    /// Trimmed text of the whole row.
    fn full_text(&self) -> String;
    /// True when this row sits inside `other`, e.g. in a table nested in one of its cells.
    fn is_within(&self, other: &Self) -> bool;
}

/// One table: an ordered list of rows.
pub trait TableNode {
    type Row: RowNode;

    fn rows(&self) -> Vec<Self::Row>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Keep rows whose cells are all blank.
    pub include_blank_rows: bool,
}

/// One data row keyed by header.
///
/// Fields keep header order. Inserting a key that already exists replaces
/// the value but keeps the original position, so with duplicate headers the
/// last column wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::default();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Records of one table in a multi-table report, named by the table's lead row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitledSection {
    pub title: String,
    pub records: Vec<Record>,
}

impl Serialize for TitledSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.title, &self.records)?;
        map.end()
    }
}

/// Convert one table into records, using its first row as the header row.
pub fn parse_table<T: TableNode>(table: &T, options: ExtractOptions) -> Vec<Record> {
    records_from_rows(&table.rows(), options)
}

/// Convert tables whose first row is a title and second row the headers.
///
/// One section per table, in table order. Equal titles stay separate.
/// The title row is dropped together with any rows nested inside it.
pub fn parse_titled_tables<T: TableNode>(tables: &[T], options: ExtractOptions) -> Vec<TitledSection> {
    tables
        .iter()
        .map(|table| {
            let mut rows = table.rows();
            if rows.is_empty() {
                return TitledSection {
                    title: String::new(),
                    records: Vec::new(),
                };
            }
            let title_row = rows.remove(0);
            rows.retain(|row| !row.is_within(&title_row));
            TitledSection {
                title: title_row.full_text(),
                records: records_from_rows(&rows, options),
            }
        })
        .collect()
}

/// Column names for a table whose header row is `rows[0]`.
///
/// Header cells win over data cells; with neither, `Column_1..=Column_N`
/// is synthesised from the widest row so no cell lacks a slot.
pub fn derive_headers<R: RowNode>(rows: &[R]) -> Vec<String> {
    let mut headers = match rows.first() {
        Some(first) => {
            let th = first.header_cells();
            if th.is_empty() {
                first.data_cells()
            } else {
                th
            }
        }
        None => Vec::new(),
    };

    if headers.is_empty() {
        let width = rows.iter().map(RowNode::cell_count).max().unwrap_or(0);
        headers = (1..=width).map(|i| format!("Column_{}", i)).collect();
    }

    headers.into_iter().map(truncate_at_line_break).collect()
}

/// Keep only the text before the first line break.
pub fn truncate_at_line_break(header: String) -> String {
    match header.find('\n') {
        Some(idx) => header[..idx].trim_end_matches('\r').to_string(),
        None => header,
    }
}

fn records_from_rows<R: RowNode>(rows: &[R], options: ExtractOptions) -> Vec<Record> {
    let headers = derive_headers(rows);

    rows.iter()
        .skip(1)
        .filter_map(|row| {
            let cells = row.data_cells();
            let has_data = cells.iter().any(|c| !c.is_empty());
            if !has_data && !options.include_blank_rows {
                return None;
            }

            let mut record = Record::with_capacity(headers.len());
            for (i, header) in headers.iter().enumerate() {
                let value = cells.get(i).cloned().unwrap_or_default();
                record.insert(header.as_str(), value);
            }
            Some(record)
        })
        .collect()
}
