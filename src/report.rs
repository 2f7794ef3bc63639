//! Report artifacts built from derived rows and their summary.
//!
//! Two renderers are provided: an `.xlsx` workbook with raw data, summary and
//! analytics sheets, and a paginated PDF document. Both write atomically into
//! the output directory.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::format::{format_currency, format_quantity};
use crate::models::summary::NOT_AVAILABLE;
use crate::models::{DerivedRow, Summary};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The unit handed to renderers and the notifier.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_on: NaiveDate,
    pub rows: Vec<DerivedRow>,
    pub summary: Option<Summary>,
}

impl Report {
    pub fn new(generated_on: NaiveDate, rows: Vec<DerivedRow>, summary: Option<Summary>) -> Self {
        Self {
            generated_on,
            rows,
            summary,
        }
    }

    /// File stem shared by every artifact of this report.
    pub fn file_stem(&self) -> String {
        format!("daily_sales_report_{}", self.generated_on.format("%Y-%m-%d"))
    }

    /// Metric/value pairs for the headline table.
    pub fn key_metrics(&self) -> Vec<(&'static str, String)> {
        match &self.summary {
            Some(s) => vec![
                ("Total Revenue", format_currency(s.total_revenue)),
                ("Total Profit", format_currency(s.total_profit)),
                ("Average Unit Price", format_currency(s.avg_unit_price)),
                ("Top City", s.top_city.clone()),
                ("Top Product", s.top_product.clone()),
            ],
            None => vec![
                ("Total Revenue", format_currency(0.0)),
                ("Total Profit", format_currency(0.0)),
                ("Average Unit Price", format_currency(0.0)),
                ("Top City", NOT_AVAILABLE.to_string()),
                ("Top Product", NOT_AVAILABLE.to_string()),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// ReportRenderer
// ---------------------------------------------------------------------------

pub trait ReportRenderer {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    /// Write the report into `out_dir`, returning the created files.
    fn render(&self, report: &Report, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Write `contents` to `path` through a temp file in the same directory, so
/// readers never see a half-written artifact.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SpreadsheetRenderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// One worksheet; the first row is the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub rows: Vec<Vec<Cell>>,
}

/// Writes one workbook with `Raw_Data`, `Summary` and `Analytics` sheets.
#[derive(Debug, Default)]
pub struct SpreadsheetRenderer;

impl SpreadsheetRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Sheet contents, in workbook order.
    pub fn sheets(report: &Report) -> Vec<Sheet> {
        let mut raw = vec![header(&[
            "city",
            "product",
            "units_sold",
            "unit_price",
            "cost_per_unit",
            "revenue",
            "profit",
        ])];
        for row in &report.rows {
            raw.push(vec![
                row.city.as_str().into(),
                row.product.as_str().into(),
                row.units_sold.into(),
                row.unit_price.into(),
                row.cost_per_unit.into(),
                row.revenue.into(),
                row.profit.into(),
            ]);
        }

        let mut summary = vec![header(&[
            "total_revenue",
            "total_profit",
            "avg_unit_price",
            "top_city",
            "top_product",
            "lowest_margin_city",
            "total_transactions",
        ])];
        if let Some(s) = &report.summary {
            summary.push(vec![
                s.total_revenue.into(),
                s.total_profit.into(),
                s.avg_unit_price.into(),
                s.top_city.clone().into(),
                s.top_product.clone().into(),
                s.lowest_margin_city_label().into(),
                (s.total_transactions as f64).into(),
            ]);
        }

        let mut analytics = vec![header(&["Metric", "Value"])];
        for (metric, value) in report.key_metrics() {
            analytics.push(vec![metric.into(), value.into()]);
        }

        vec![
            Sheet { name: "Raw_Data", rows: raw },
            Sheet { name: "Summary", rows: summary },
            Sheet { name: "Analytics", rows: analytics },
        ]
    }

    /// Serialize the workbook to `.xlsx` bytes.
    pub fn workbook(report: &Report) -> Result<Vec<u8>> {
        let bold = Format::new().set_bold();
        let mut workbook = Workbook::new();

        for sheet in Self::sheets(report) {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name)?;
            for (r, row) in sheet.rows.iter().enumerate() {
                let r = r as u32;
                for (c, cell) in row.iter().enumerate() {
                    let c = c as u16;
                    match cell {
                        Cell::Text(text) if r == 0 => {
                            worksheet.write_string_with_format(r, c, text, &bold)?;
                        }
                        Cell::Text(text) => {
                            worksheet.write_string(r, c, text)?;
                        }
                        Cell::Number(n) if n.is_finite() => {
                            worksheet.write_number(r, c, *n)?;
                        }
                        // Excel has no NaN or infinity.
                        Cell::Number(n) => {
                            worksheet.write_string(r, c, n.to_string())?;
                        }
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::from(*n)).collect()
}

impl ReportRenderer for SpreadsheetRenderer {
    fn name(&self) -> &str {
        "spreadsheet"
    }

    fn render(&self, report: &Report, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let path = out_dir.join(format!("{}.xlsx", report.file_stem()));
        write_atomic(&path, &Self::workbook(report)?)?;
        log::info!("Excel report saved as {}", path.display());
        Ok(vec![path])
    }
}

// ---------------------------------------------------------------------------
// DocumentRenderer
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_LINES: usize = 54;

// US letter
const PAGE_WIDTH: Mm = Mm(215.9);
const PAGE_HEIGHT: Mm = Mm(279.4);
const MARGIN_MM: f32 = 18.0;
const LINE_HEIGHT_MM: f32 = 4.2;
const FONT_SIZE: f32 = 8.0;

/// Writes a paginated PDF report in a monospaced font.
#[derive(Debug)]
pub struct DocumentRenderer {
    page_lines: usize,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self {
            page_lines: DEFAULT_PAGE_LINES,
        }
    }
}

impl DocumentRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines per page, including the page header. Clamped to at least 4.
    pub fn page_lines(mut self, lines: usize) -> Self {
        self.page_lines = lines.max(4);
        self
    }

    /// Lay the report out into pages of text lines. Each page starts with a
    /// running header and a blank line.
    pub fn pages(&self, report: &Report) -> Vec<Vec<String>> {
        let date = report.generated_on.format("%Y-%m-%d").to_string();
        let lines = Self::body(report, &date);

        let body = self.page_lines - 2;
        let chunks: Vec<&[String]> = lines.chunks(body).collect();
        let total = chunks.len().max(1);

        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut page = Vec::with_capacity(chunk.len() + 2);
                page.push(format!(
                    "Daily Bakery Sales Report - {}    Page {} of {}",
                    date,
                    i + 1,
                    total
                ));
                page.push(String::new());
                page.extend(chunk.iter().cloned());
                page
            })
            .collect()
    }

    fn body(report: &Report, date: &str) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        lines.push("Daily Bakery Sales Report".to_string());
        lines.push(format!("Date: {}", date));
        lines.push(String::new());
        lines.push("Key Performance Indicators".to_string());
        lines.push(format!("{:<28} {}", "Metric", "Value"));
        for (metric, value) in report.key_metrics() {
            lines.push(format!("{:<28} {}", metric, value));
        }
        let transactions = report.summary.as_ref().map(|s| s.total_transactions).unwrap_or(0);
        lines.push(format!("{:<28} {}", "Total Transactions", transactions));
        lines.push(String::new());

        lines.push("Business Insights".to_string());
        let (city, product, margin_city) = match &report.summary {
            Some(s) => (
                s.top_city.as_str(),
                s.top_product.as_str(),
                s.lowest_margin_city_label(),
            ),
            None => (NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE),
        };
        lines.push(format!("- {} generates the highest revenue", city));
        lines.push(format!("- {} is the most profitable product", product));
        lines.push(format!("- Consider promotions in {} to improve margins", margin_city));
        lines.push(String::new());

        lines.push("Transactions".to_string());
        lines.push(format!(
            "{:<16} {:<16} {:>8} {:>10} {:>10} {:>12} {:>12}",
            "City", "Product", "Units", "Price", "Cost", "Revenue", "Profit"
        ));
        for row in &report.rows {
            lines.push(format!(
                "{:<16} {:<16} {:>8} {:>10} {:>10} {:>12} {:>12}",
                row.city,
                row.product,
                format_quantity(row.units_sold),
                format_currency(row.unit_price),
                format_currency(row.cost_per_unit),
                format_currency(row.revenue),
                format_currency(row.profit)
            ));
        }
        lines
    }

    /// Render the pages into PDF bytes.
    pub fn pdf(&self, report: &Report) -> Result<Vec<u8>> {
        let title = format!(
            "Daily Bakery Sales Report - {}",
            report.generated_on.format("%Y-%m-%d")
        );
        let (doc, first_page, first_layer) =
            PdfDocument::new(title.as_str(), PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Courier).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::CourierBold).map_err(pdf_error)?;

        for (i, page) in self.pages(report).iter().enumerate() {
            let (page_index, layer_index) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1")
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);
            for (n, line) in page.iter().enumerate() {
                let y = PAGE_HEIGHT.0 - MARGIN_MM - n as f32 * LINE_HEIGHT_MM;
                let font = if n == 0 { &bold } else { &regular };
                layer.use_text(line.as_str(), FONT_SIZE, Mm(MARGIN_MM), Mm(y), font);
            }
        }

        doc.save_to_bytes().map_err(pdf_error)
    }
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> AnalyticsError {
    AnalyticsError::Pdf(format!("{:?}", e))
}

impl ReportRenderer for DocumentRenderer {
    fn name(&self) -> &str {
        "document"
    }

    fn render(&self, report: &Report, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let path = out_dir.join(format!("{}.pdf", report.file_stem()));
        write_atomic(&path, &self.pdf(report)?)?;
        log::info!("PDF report saved as {}", path.display());
        Ok(vec![path])
    }
}
