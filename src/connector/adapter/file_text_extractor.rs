use std::io::Cursor;

use async_trait::async_trait;
use calamine::Reader;
use tracing::debug;

use crate::application::TextExtractor;
use crate::domain::{DomainError, FileType};

/// Cell text for missing values in ragged or sparse tables.
const MISSING: &str = "NaN";

/// Extracts text from PDF, CSV and XLSX files.
///
/// Tables are rendered as plain text with a leading row index and
/// right-aligned columns, the same layout a data frame prints.
#[derive(Debug, Default, Clone)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_pdf(data: &[u8]) -> Result<String, DomainError> {
        pdf_extract::extract_text_from_mem(data)
            .map_err(|e| DomainError::extraction(format!("Failed to parse PDF: {}", e)))
    }

    pub fn extract_csv(data: &[u8]) -> Result<String, DomainError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| DomainError::extraction(format!("Failed to parse CSV: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DomainError::extraction("No columns to parse from file"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| DomainError::extraction(format!("Failed to parse CSV: {}", e)))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(render_table(&headers, &rows))
    }

    /// Only the first worksheet is read.
    pub fn extract_xlsx(data: &[u8]) -> Result<String, DomainError> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| DomainError::extraction(format!("Failed to open spreadsheet: {}", e)))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| DomainError::extraction("Spreadsheet has no worksheets"))?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| DomainError::extraction(format!("Failed to read sheet {}: {}", sheet, e)))?;

        // Empty cells stay empty so headers become `Unnamed: i` and values `NaN`.
        let mut rows = range.rows().map(|row| {
            row.iter()
                .map(|cell| match cell {
                    calamine::Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect::<Vec<String>>()
        });

        let headers = rows
            .next()
            .ok_or_else(|| DomainError::extraction("No columns to parse from file"))?;
        let body: Vec<Vec<String>> = rows.collect();

        debug!("Read {} rows from sheet {}", body.len(), sheet);
        Ok(render_table(&headers, &body))
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, file_type: FileType, bytes: &[u8]) -> Result<String, DomainError> {
        let data = bytes.to_vec();

        // Parsers are CPU-bound and the PDF one may panic on malformed input.
        tokio::task::spawn_blocking(move || match file_type {
            FileType::Pdf => Self::extract_pdf(&data),
            FileType::Csv => Self::extract_csv(&data),
            FileType::Xlsx => Self::extract_xlsx(&data),
        })
        .await
        .map_err(|e| {
            DomainError::extraction(format!("Failed to extract {} file: {}", file_type, e))
        })?
    }
}

/// Right-aligns every column, prefixing rows with their zero-based index.
/// Rows shorter than the header are padded; extra cells get numbered columns.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(headers.len());

    let header_cells: Vec<String> = (0..columns)
        .map(|i| {
            headers
                .get(i)
                .filter(|h| !h.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Unnamed: {}", i))
        })
        .collect();

    let body: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|i| match row.get(i) {
                    Some(cell) if !cell.is_empty() => cell.as_str(),
                    _ => MISSING,
                })
                .collect()
        })
        .collect();

    let index_width = rows.len().saturating_sub(1).to_string().len();
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            body.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header_cells[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut header_line = " ".repeat(index_width);
    for (cell, width) in header_cells.iter().zip(&widths) {
        header_line.push_str(&format!("  {:>width$}", cell, width = width));
    }
    lines.push(header_line);

    for (index, row) in body.iter().enumerate() {
        let mut line = format!("{:<width$}", index, width = index_width);
        for (cell, width) in row.iter().zip(&widths) {
            line.push_str(&format!("  {:>width$}", cell, width = width));
        }
        lines.push(line);
    }

    lines.join("\n")
}
