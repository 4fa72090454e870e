//! Workbook assembly
//!
//! Builds the four-sheet member roster workbook: one sheet per category in
//! fixed order, rows in classifier order, a styled header row, and fixed
//! column widths shared by every sheet.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook};
use std::path::Path;
use tracing::info;

use crate::roster::{Category, ClassifiedRoster};

/// Header fill, the roster accent green.
const HEADER_FILL: Color = Color::RGB(0x64A70B);
const HEADER_ROW_HEIGHT: f64 = 25.0;

/// Column widths by zero-based column index (B, C, D, E, G, H, I, J, L, M,
/// N, O, P), identical across all four sheets.
const COLUMN_WIDTHS: &[(u16, f64)] = &[
    (1, 40.0),
    (2, 36.0),
    (3, 15.0),
    (4, 25.0),
    (6, 15.0),
    (7, 15.0),
    (8, 12.0),
    (9, 12.0),
    (11, 25.0),
    (12, 16.0),
    (13, 32.0),
    (14, 25.0),
    (15, 25.0),
];

/// Date-derived output filename: no zero-padding, no year component. A second
/// run on the same day overwrites the previous file.
pub fn output_filename(date: NaiveDate) -> String {
    format!("MemberRoster_{}_{}.xlsx", date.month(), date.day())
}

/// Write the classified roster to a styled workbook at `path`.
pub fn build_report(roster: &ClassifiedRoster, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(HEADER_FILL)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    for category in Category::ALL {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(category.sheet_name())
            .with_context(|| format!("Failed to name sheet '{}'", category.sheet_name()))?;

        for (row_index, record) in roster.rows(category).iter().enumerate() {
            for (col_index, field) in record.iter().enumerate() {
                if row_index == 0 {
                    worksheet
                        .write_with_format(0, col_index as u16, field.as_str(), &header_format)
                        .context("Failed to write header cell")?;
                } else {
                    worksheet
                        .write(row_index as u32, col_index as u16, field.as_str())
                        .context("Failed to write record cell")?;
                }
            }
        }

        for &(column, width) in COLUMN_WIDTHS {
            worksheet
                .set_column_width(column, width)
                .context("Failed to set column width")?;
        }
        worksheet
            .set_row_height(0, HEADER_ROW_HEIGHT)
            .context("Failed to set header row height")?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook to {}", path.display()))?;
    info!("Saved report to {}", path.display());
    Ok(())
}
