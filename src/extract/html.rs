// src/extract/html.rs

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{parse_table, parse_titled_tables, ExtractOptions, Record, RowNode, TableNode, TitledSection};

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector should parse"));
static HEADER_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("header cell selector should parse"));
static DATA_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("data cell selector should parse"));
static ANY_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("cell selector should parse"));

/// A `<table>` element inside a parsed document.
#[derive(Clone, Copy)]
pub struct HtmlTable<'a>(pub ElementRef<'a>);

/// A `<tr>` element.
#[derive(Clone, Copy)]
pub struct HtmlRow<'a>(pub ElementRef<'a>);

fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl<'a> TableNode for HtmlTable<'a> {
    type Row = HtmlRow<'a>;

    fn rows(&self) -> Vec<HtmlRow<'a>> {
        self.0.select(&ROW).map(HtmlRow).collect()
    }
}

impl RowNode for HtmlRow<'_> {
    fn header_cells(&self) -> Vec<String> {
        self.0.select(&HEADER_CELL).map(trimmed_text).collect()
    }

    fn data_cells(&self) -> Vec<String> {
        self.0.select(&DATA_CELL).map(trimmed_text).collect()
    }

    fn cell_count(&self) -> usize {
        self.0.select(&ANY_CELL).count()
    }

    fn full_text(&self) -> String {
        trimmed_text(self.0)
    }

    fn is_within(&self, other: &Self) -> bool {
        let outer = other.0.id();
        self.0.ancestors().any(|node| node.id() == outer)
    }
}

/// Parse a CSS marker such as `table.functionLayout` or `table#callLogListing`.
pub fn table_marker(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid table marker {:?}: {:?}", css, e))
}

/// First element matching `marker`, if any.
pub fn select_table<'a>(document: &'a Html, marker: &Selector) -> Option<HtmlTable<'a>> {
    document.select(marker).next().map(HtmlTable)
}

/// Every element matching `marker`, in document order.
pub fn select_tables<'a>(document: &'a Html, marker: &Selector) -> Vec<HtmlTable<'a>> {
    document.select(marker).map(HtmlTable).collect()
}

/// Parse `html` and extract the first table matching `marker`.
/// A page without such a table gives no records.
pub fn extract_records(html: &str, marker: &Selector, options: ExtractOptions) -> Option<Vec<Record>> {
    let document = Html::parse_document(html);
    select_table(&document, marker).map(|table| parse_table(&table, options))
}

/// Parse `html` and extract every table matching `marker` as a titled section.
pub fn extract_sections(html: &str, marker: &Selector, options: ExtractOptions) -> Vec<TitledSection> {
    let document = Html::parse_document(html);
    parse_titled_tables(&select_tables(&document, marker), options)
}
