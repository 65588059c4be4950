//! Spreadsheet exports of whole tables
//!
//! A [`Report`] is a sheet name, a header row and one row of
//! [`FieldValue`]s per entity. Timestamps are written as
//! `YYYY-MM-DD HH:MM:SS` text so the sheet reads the same in every locale.

use crate::core::entity::Data;
use crate::core::error::{RentalError, RentalResult};
use crate::core::field::FieldValue;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// MIME type of an XLSX workbook
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Timestamp layout used in every report
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns of the item report
pub const ITEM_COLUMNS: &[&str] = &[
    "id",
    "category",
    "name",
    "description",
    "serial_number",
    "price",
    "images",
    "status",
    "created_at",
    "updated_at",
];

/// Columns of the rental report
pub const RENTAL_COLUMNS: &[&str] = &[
    "id",
    "user",
    "item",
    "start_date",
    "end_date",
    "status",
    "created_at",
    "updated_at",
];

/// Tabular snapshot of one entity type
#[derive(Debug, Clone)]
pub struct Report {
    sheet: String,
    columns: Vec<&'static str>,
    rows: Vec<Vec<FieldValue>>,
}

impl Report {
    /// One row per entity, one column per named field
    pub fn from_entities<T: Data>(
        sheet: impl Into<String>,
        columns: &[&'static str],
        entities: &[T],
    ) -> Self {
        let rows = entities
            .iter()
            .map(|entity| {
                columns
                    .iter()
                    .map(|column| entity.field_value(column).unwrap_or(FieldValue::Null))
                    .collect()
            })
            .collect();

        Self {
            sheet: sheet.into(),
            columns: columns.to_vec(),
            rows,
        }
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows as display text, the way they appear in the sheet
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect()
    }

    /// Render the report as XLSX bytes
    pub fn to_xlsx(&self) -> RentalResult<Vec<u8>> {
        self.render().map_err(|e| {
            RentalError::Internal(format!("failed to render report '{}': {}", self.sheet, e))
        })
    }

    fn render(&self) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet)?;

        for (col, name) in self.columns.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *name, &header)?;
        }

        for (index, row) in self.rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                let col = col as u16;
                match value {
                    FieldValue::Null => {}
                    FieldValue::Float(n) => {
                        sheet.write_number(row_num, col, *n)?;
                    }
                    FieldValue::Boolean(b) => {
                        sheet.write_boolean(row_num, col, *b)?;
                    }
                    other => {
                        sheet.write_string(row_num, col, cell_text(other))?;
                    }
                }
            }
        }

        workbook.save_to_buffer()
    }
}

fn cell_text(value: &FieldValue) -> String {
    match value {
        FieldValue::DateTime(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
        FieldValue::Null => String::new(),
        other => other.search_text(),
    }
}

/// Rendered report ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub filename: String,
    pub data: Vec<u8>,
    pub row_count: usize,
}

impl ReportFile {
    pub fn render(filename: impl Into<String>, report: &Report) -> RentalResult<Self> {
        Ok(Self {
            filename: filename.into(),
            data: report.to_xlsx()?,
            row_count: report.row_count(),
        })
    }

    /// `Content-Disposition` value for the download
    pub fn disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}
