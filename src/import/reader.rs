//! CSV reading for imports

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::ImportError;

/// A parsed CSV file, all rows kept as-is (header included)
#[derive(Debug, Clone)]
pub struct CsvTable {
    rows: Vec<StringRecord>,
    column_count: usize,
}

impl CsvTable {
    /// The first row, whether or not it is a header
    pub fn header(&self) -> &StringRecord {
        &self.rows[0]
    }

    /// First data row
    pub fn first_record(&self, has_header: bool) -> Option<&StringRecord> {
        self.records(has_header).first()
    }

    /// Data rows, with the header row removed when there is one
    pub fn records(&self, has_header: bool) -> &[StringRecord] {
        if has_header {
            &self.rows[1..]
        } else {
            &self.rows
        }
    }

    /// Number of data rows
    pub fn record_count(&self, has_header: bool) -> usize {
        self.records(has_header).len()
    }

    /// Width of the widest row
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Names offered for mapping: header cells, or "Column N" when headerless
    pub fn column_labels(&self, has_header: bool) -> Vec<String> {
        if has_header {
            let mut labels: Vec<String> = self.header().iter().map(|h| h.to_string()).collect();
            for i in labels.len()..self.column_count {
                labels.push(format!("Column {}", i + 1));
            }
            labels
        } else {
            (1..=self.column_count)
                .map(|i| format!("Column {}", i))
                .collect()
        }
    }
}

/// Read a CSV file from disk
pub fn read_csv_file(path: &Path) -> Result<CsvTable, ImportError> {
    let file = File::open(path).map_err(|e| ImportError::Parse(e.to_string()))?;
    read_csv(BufReader::new(file))
}

/// Read CSV from any byte stream
pub fn read_csv<R: Read>(reader: R) -> Result<CsvTable, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let record = result
            .map_err(|e| ImportError::Parse(format!("row {}: {}", row_idx + 1, e)))?;
        rows.push(record);
    }

    // Drop rows with no content at all (e.g. trailing ",,,")
    rows.retain(|r: &StringRecord| r.iter().any(|c| !c.is_empty()));

    if rows.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    if let Some(first) = rows[0].get(0) {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            let mut fixed: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
            fixed[0] = stripped.trim().to_string();
            rows[0] = StringRecord::from(fixed);
        }
    }

    let column_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    log::debug!("read {} csv rows, {} columns", rows.len(), column_count);

    Ok(CsvTable { rows, column_count })
}
