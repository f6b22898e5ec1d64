use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::schema::{Column, ColumnKind, OddsRecord};

pub struct ExportReport {
    pub rows: usize,
    pub columns: usize,
}

pub fn export_xlsx(path: &Path, rows: &[&OddsRecord]) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("odds").context("name worksheet")?;

    let bold = Format::new().set_bold();
    for column in Column::ALL.iter().copied() {
        worksheet
            .write_string_with_format(0, column.index() as u16, column.label(), &bold)
            .with_context(|| format!("write header {}", column.name()))?;
    }

    for (i, row) in rows.iter().enumerate() {
        write_row(worksheet, (i + 1) as u32, row)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(ExportReport {
        rows: rows.len(),
        columns: Column::ALL.len(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Number(f64),
    Text(String),
}

pub fn export_cell(row: &OddsRecord, column: Column) -> ExportCell {
    let text = row.display(column);
    let numeric = matches!(column.kind(), ColumnKind::Odds)
        || matches!(
            column,
            Column::Margin1x2 | Column::MarginOu25 | Column::MarginOu3 | Column::MarginBtts
        );
    match numeric.then(|| text.parse::<f64>().ok()).flatten() {
        Some(value) => ExportCell::Number(value),
        None => ExportCell::Text(text),
    }
}

fn write_row(worksheet: &mut Worksheet, row_idx: u32, row: &OddsRecord) -> Result<()> {
    for column in Column::ALL.iter().copied() {
        let col_idx = column.index() as u16;
        let written = match export_cell(row, column) {
            ExportCell::Number(value) => worksheet.write_number(row_idx, col_idx, value),
            ExportCell::Text(text) => worksheet.write_string(row_idx, col_idx, &text),
        };
        written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
    }
    Ok(())
}
