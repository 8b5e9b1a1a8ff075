use rust_xlsxwriter::{Format, Workbook, XlsxError};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::model::attendance::{BranchAttendanceRow, DATE_FORMAT, format_time};

const HEADERS: [&str; 4] = ["Employee", "Date", "Check-in time", "Check-out time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ExportFormat {
    #[strum(to_string = "excel", serialize = "xlsx")]
    Spreadsheet,
    #[strum(to_string = "csv")]
    Csv,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer flush failed: {0}")]
    Flush(String),

    #[error("spreadsheet encoding failed: {0}")]
    Xlsx(#[from] XlsxError),
}

#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Builds the download for a branch. `None` means there is nothing to export.
pub fn build_export(
    rows: &[BranchAttendanceRow],
    format: ExportFormat,
) -> Result<Option<ExportFile>, ExportError> {
    if rows.is_empty() {
        return Ok(None);
    }

    let table: Vec<[String; 4]> = rows.iter().map(to_cells).collect();

    let bytes = match format {
        ExportFormat::Spreadsheet => write_xlsx(&table)?,
        ExportFormat::Csv => write_csv(&table)?,
    };

    Ok(Some(ExportFile {
        file_name: format!("attendance.{}", format.extension()),
        format,
        bytes,
    }))
}

fn to_cells(row: &BranchAttendanceRow) -> [String; 4] {
    [
        row.employee_name.clone(),
        row.date.format(DATE_FORMAT).to_string(),
        format_time(row.check_in).unwrap_or_default(),
        format_time(row.check_out).unwrap_or_default(),
    ]
}

fn write_csv(table: &[[String; 4]]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for cells in table {
        writer.write_record(cells)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))
}

fn write_xlsx(table: &[[String; 4]]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Attendance")?;

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, cells) in table.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in cells.iter().enumerate() {
            sheet.write_string(row, col as u16, value.as_str())?;
        }
    }
    sheet.autofit();

    Ok(workbook.save_to_buffer()?)
}
