//! Table formatting for CLI list commands
//!
//! List commands build [`TableRow`]s of typed [`CellValue`]s and hand them to
//! a [`TableFormatter`], which renders TSV (colored when on a terminal), CSV,
//! Markdown or bare IDs. JSON output is produced by the commands directly
//! from the serde types.

use chrono::NaiveDate;
use console::style;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::entities::BlendType;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Plain text, truncated to the column width
    Text(String),
    /// Blend type (dim when unset)
    Type(Option<BlendType>),
    /// Rating on the 0-5 scale, colored by value
    Rating(Option<f64>),
    /// Favorite/disliked marker
    Sentiment { favorite: bool, disliked: bool },
    /// Yes/no flag
    Flag(bool),
    Number(i64),
    Date(Option<NaiveDate>),
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Type(Some(t)) => format!("{:<width$}", style(t.as_str()).magenta(), width = width),
            CellValue::Rating(Some(r)) => {
                let s = format!("{:.2}", r);
                let styled = if *r >= 4.0 {
                    style(s).green()
                } else if *r >= 2.5 {
                    style(s).yellow()
                } else {
                    style(s).red()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Sentiment { favorite: true, .. } => {
                format!("{:<width$}", style("♥").red(), width = width)
            }
            CellValue::Sentiment { disliked: true, .. } => {
                format!("{:<width$}", style("✗").dim(), width = width)
            }
            CellValue::Flag(true) => format!("{:<width$}", style("yes").green(), width = width),
            CellValue::Flag(false) => format!("{:<width$}", style("no").dim(), width = width),
            CellValue::Number(n) => format!("{:<width$}", n, width = width),
            CellValue::Date(Some(d)) => format!("{:<width$}", d.format("%Y-%m-%d"), width = width),
            CellValue::Type(None)
            | CellValue::Rating(None)
            | CellValue::Sentiment { .. }
            | CellValue::Date(None)
            | CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        escape_csv(&self.raw())
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Sentiment { favorite: true, .. } => "♥".to_string(),
            CellValue::Sentiment { disliked: true, .. } => "✗".to_string(),
            other => other.raw(),
        };
        if raw.is_empty() {
            "-".to_string()
        } else {
            raw.replace('|', "\\|")
        }
    }

    /// Raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Type(t) => t.map(|t| t.as_str().to_string()).unwrap_or_default(),
            CellValue::Rating(r) => r.map(|r| format!("{:.2}", r)).unwrap_or_default(),
            CellValue::Sentiment { favorite, disliked } => {
                if *favorite {
                    "favorite".to_string()
                } else if *disliked {
                    "disliked".to_string()
                } else {
                    String::new()
                }
            }
            CellValue::Flag(b) => (if *b { "yes" } else { "no" }).to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(d) => d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Sentiment { .. } | CellValue::Empty => 1,
            CellValue::Date(_) => 10,
            other => other.raw().chars().count().max(1),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: i64,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Drop the trailing "N item(s) found" line
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_summary = !quiet;
        self
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat)
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Csv => self.output_csv(&rows),
            OutputFormat::Md => self.output_md(&rows),
            OutputFormat::Id => self.output_ids(&rows),
            _ => self.output_tsv(&rows),
        }
    }

    /// Column widths sized to content, capped at each column's width
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let id_width = rows
            .iter()
            .map(|r| r.id.to_string().len())
            .max()
            .unwrap_or(2)
            .max(2);

        let mut widths = vec![id_width];
        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(|v| v.display_width())
                .max()
                .unwrap_or(0);
            let natural_width = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural_width.min(col.width));
        }
        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header_parts = vec![format!("{:<width$}", style("ID").bold().dim(), width = widths[0])];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header_parts.push(format!("{:<width$}", style(col.header).bold(), width = width));
        }
        println!("{}", header_parts.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let mut parts = vec![format!("{:<width$}", style(row.id).cyan(), width = widths[0])];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                match row.get(col.key) {
                    Some(value) => parts.push(value.format_tsv(*width)),
                    None => parts.push(format!("{:<width$}", "-", width = width)),
                }
            }
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!("{} {}(s) found.", style(rows.len()).cyan(), self.entity_name);
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let mut headers = vec!["id".to_string()];
        headers.extend(self.columns.iter().map(|c| c.key.to_string()));
        println!("{}", headers.join(","));

        for row in rows {
            let mut values = vec![row.id.to_string()];
            for col in self.columns {
                values.push(row.get(col.key).map(|v| v.format_csv()).unwrap_or_default());
            }
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let mut headers = vec!["ID".to_string()];
        headers.extend(self.columns.iter().map(|c| c.header.to_string()));
        println!("| {} |", headers.join(" | "));

        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        for row in rows {
            let mut values = vec![row.id.to_string()];
            for col in self.columns {
                values.push(
                    row.get(col.key)
                        .map(|v| v.format_md())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_ids(&self, rows: &[TableRow]) {
        for row in rows {
            println!("{}", row.id);
        }
    }
}
