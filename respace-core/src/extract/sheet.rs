//! Spreadsheet extraction (XLSX / XLS) via calamine.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Reader, Xls, Xlsx};
use respace_types::SourceFormat;
use tracing::debug;

use super::error::{ExtractError, ExtractResult};

pub(crate) fn extract_xlsx(data: &[u8]) -> ExtractResult<String> {
    let workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
        .map_err(|e| ExtractError::parse(SourceFormat::Xlsx, e))?;
    workbook_text(workbook, SourceFormat::Xlsx)
}

pub(crate) fn extract_xls(data: &[u8]) -> ExtractResult<String> {
    let workbook: Xls<_> =
        Xls::new(Cursor::new(data)).map_err(|e| ExtractError::parse(SourceFormat::Xls, e))?;
    workbook_text(workbook, SourceFormat::Xls)
}

/// Every sheet in workbook order, one line per non-blank row.
///
/// Non-empty cells of a row are joined by a single space.
fn workbook_text<RS, R>(mut workbook: R, format: SourceFormat) -> ExtractResult<String>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let mut out = String::new();

    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExtractError::parse(format, e))?;
        debug!(sheet = %name, rows = range.height(), "reading sheet");

        for row in range.rows() {
            push_row(row, &mut out);
        }
    }

    Ok(out)
}

fn push_row(row: &[Data], out: &mut String) {
    let mut first = true;
    for cell in row {
        let Some(text) = cell_text(cell) else {
            continue;
        };
        if !first {
            out.push(' ');
        }
        out.push_str(&text);
        first = false;
    }

    if !first {
        out.push('\n');
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Error(e) => format!("#{e:?}"),
    };

    (!text.trim().is_empty()).then_some(text)
}
