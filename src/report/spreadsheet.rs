use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use tracing::debug;

use crate::model::FlaggedIssue;
use crate::util::ensure_directory;

use super::column_width;

pub const SHEET_NAME: &str = "AI Suggestions";
pub const SUGGESTION_HEADERS: [&str; 5] = ["Type", "Metric", "Value", "Line", "AI Suggestion"];

pub fn suggestion_rows(issues: &[FlaggedIssue]) -> Vec<[String; 5]> {
    issues
        .iter()
        .map(|issue| {
            [
                issue.category.as_str().to_string(),
                issue.metric_or_type.clone(),
                issue.value.clone(),
                issue.line_number.clone(),
                issue.suggestion_text.clone(),
            ]
        })
        .collect()
}

fn column_widths(rows: &[[String; 5]]) -> Vec<usize> {
    SUGGESTION_HEADERS
        .iter()
        .enumerate()
        .map(|(col, header)| {
            column_width(std::iter::once(*header).chain(rows.iter().map(|row| row[col].as_str())))
        })
        .collect()
}

pub fn write_suggestion_workbook(path: &Path, issues: &[FlaggedIssue]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let rows = suggestion_rows(issues);
    let widths = column_widths(&rows);

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new()
        .set_font_name("Calibri")
        .set_font_size(10)
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .context("failed to name suggestion sheet")?;

    for (col, header) in (0_u16..).zip(SUGGESTION_HEADERS) {
        worksheet.write_string_with_format(0, col, header, &header_format)?;
    }

    for (row_num, row) in (1_u32..).zip(&rows) {
        for (col, cell) in (0_u16..).zip(row) {
            worksheet.write_string_with_format(row_num, col, cell, &cell_format)?;
        }
    }

    for (col, width) in (0_u16..).zip(&widths) {
        worksheet.set_column_width(col, *width as f64)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write spreadsheet: {}", path.display()))?;

    debug!(
        path = %path.display(),
        rows = rows.len(),
        widths = ?widths,
        "wrote suggestion workbook"
    );
    Ok(())
}
