//! Dashboard view model: KPIs, chart series and tables for a filtered
//! selection of derived rows, plus a plain-text rendering of it.

use std::fmt::Write as _;

use serde::Serialize;

use crate::aggregate::{group_sum, summarize};
use crate::filter::{distinct_cities, distinct_products, RowFilter};
use crate::format::{format_currency, format_quantity, round2};
use crate::models::{DerivedRow, Summary};

/// Help text shown when no source produced any rows.
pub const NO_DATA_HELP: &str = "\
No data available. Please check:

Database:
  - Ensure the DuckDB file at SALES_DB_PATH exists
  - Verify the sales table (SALES_TABLE) exists and has rows

CSV backup:
  - Ensure the file at CSV_BACKUP_PATH exists
  - It needs the columns city, product, units_sold, unit_price, cost_per_unit

Run with RUST_LOG=debug for details on each source.";

// ---------------------------------------------------------------------------
// Kpis
// ---------------------------------------------------------------------------

/// Headline numbers, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub avg_unit_price: f64,
    /// Overall profit as a percentage of revenue; zero when revenue is not positive.
    pub profit_margin: f64,
}

impl Kpis {
    /// `None` for an empty selection.
    pub fn compute(rows: &[DerivedRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let total_revenue: f64 = rows.iter().map(|r| r.revenue).sum();
        let total_profit: f64 = rows.iter().map(|r| r.profit).sum();
        let avg_unit_price = rows.iter().map(|r| r.unit_price).sum::<f64>() / rows.len() as f64;

        let total_revenue = round2(total_revenue);
        let total_profit = round2(total_profit);
        let profit_margin = if total_revenue > 0.0 {
            round2(total_profit / total_revenue * 100.0)
        } else {
            0.0
        };

        Some(Self {
            total_revenue,
            total_profit,
            avg_unit_price: round2(avg_unit_price),
            profit_margin,
        })
    }
}

// ---------------------------------------------------------------------------
// CityPerformance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPerformance {
    pub city: String,
    pub revenue: f64,
    pub profit: f64,
}

// ---------------------------------------------------------------------------
// DashboardView
// ---------------------------------------------------------------------------

/// Everything the dashboard shows for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Filter options, taken from the unfiltered dataset.
    pub available_cities: Vec<String>,
    pub available_products: Vec<String>,
    pub rows: Vec<DerivedRow>,
    pub kpis: Option<Kpis>,
    pub revenue_by_city: Vec<(String, f64)>,
    pub profit_by_product: Vec<(String, f64)>,
    pub units_by_product: Vec<(String, f64)>,
    pub city_table: Vec<CityPerformance>,
    /// Summary of the filtered rows.
    pub summary: Option<Summary>,
    /// True when the unfiltered dataset was empty.
    pub no_data: bool,
}

impl DashboardView {
    pub fn build(all_rows: &[DerivedRow], filter: &RowFilter) -> Self {
        let rows = filter.apply(all_rows);

        let revenue_by_city = sorted_desc(group_sum(&rows, |r| &r.city, |r| r.revenue));
        let profit = group_sum(&rows, |r| &r.city, |r| r.profit);
        let city_table = revenue_by_city
            .iter()
            .map(|(city, revenue)| CityPerformance {
                city: city.clone(),
                revenue: *revenue,
                profit: profit.get(city).copied().unwrap_or(0.0),
            })
            .collect();

        Self {
            available_cities: distinct_cities(all_rows),
            available_products: distinct_products(all_rows),
            kpis: Kpis::compute(&rows),
            profit_by_product: sorted_desc(group_sum(&rows, |r| &r.product, |r| r.profit)),
            units_by_product: sorted_desc(group_sum(&rows, |r| &r.product, |r| r.units_sold)),
            revenue_by_city,
            city_table,
            summary: summarize(&rows),
            no_data: all_rows.is_empty(),
            rows,
        }
    }

    /// Render the view as plain text for a terminal.
    pub fn render_text(&self) -> String {
        if self.no_data {
            return format!("Bakery Sales Dashboard\n\n{}\n", NO_DATA_HELP);
        }

        let mut out = String::new();
        let _ = writeln!(out, "Bakery Sales Dashboard");
        let _ = writeln!(out, "Cities:   {}", self.available_cities.join(", "));
        let _ = writeln!(out, "Products: {}", self.available_products.join(", "));
        let _ = writeln!(out);

        let Some(kpis) = &self.kpis else {
            let _ = writeln!(out, "No data available for selected filters");
            return out;
        };

        let _ = writeln!(out, "== Key Performance Indicators ==");
        let _ = writeln!(out, "Total Revenue:  {}", format_currency(kpis.total_revenue));
        let _ = writeln!(out, "Total Profit:   {}", format_currency(kpis.total_profit));
        let _ = writeln!(out, "Avg. Price:     {}", format_currency(kpis.avg_unit_price));
        let _ = writeln!(out, "Profit Margin:  {}%", kpis.profit_margin);
        let _ = writeln!(out);

        write_bars(&mut out, "Revenue by City", &self.revenue_by_city, format_currency);
        write_bars(&mut out, "Profit by Product", &self.profit_by_product, format_currency);
        write_bars(&mut out, "Units Sold by Product", &self.units_by_product, format_quantity);

        let _ = writeln!(out, "== Top Performing Cities ==");
        let _ = writeln!(out, "{:<20} {:>15} {:>15}", "City", "Revenue", "Profit");
        for row in &self.city_table {
            let _ = writeln!(
                out,
                "{:<20} {:>15} {:>15}",
                row.city,
                format_currency(row.revenue),
                format_currency(row.profit)
            );
        }
        let _ = writeln!(out);

        if let Some(summary) = &self.summary {
            let _ = writeln!(out, "== Summary Statistics ==");
            let _ = writeln!(out, "Top City:            {}", summary.top_city);
            let _ = writeln!(out, "Top Product:         {}", summary.top_product);
            let _ = writeln!(out, "Total Transactions:  {}", summary.total_transactions);
            let _ = writeln!(out, "Lowest Margin City:  {}", summary.lowest_margin_city_label());
        }

        out
    }

    /// Write the filtered rows as CSV.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> crate::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn sorted_desc(groups: std::collections::BTreeMap<String, f64>) -> Vec<(String, f64)> {
    let mut series: Vec<(String, f64)> = groups.into_iter().collect();
    // Stable sort keeps key order among equal values.
    series.sort_by(|a, b| b.1.total_cmp(&a.1));
    series
}

const BAR_WIDTH: f64 = 40.0;

fn write_bars(out: &mut String, title: &str, series: &[(String, f64)], fmt: fn(f64) -> String) {
    let _ = writeln!(out, "== {} ==", title);
    let max = series
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    for (label, value) in series {
        // Non-finite values get no bar; only their formatted value is shown.
        let len = if value.is_finite() && max > 0.0 && *value > 0.0 {
            ((value / max) * BAR_WIDTH).round().min(BAR_WIDTH) as usize
        } else {
            0
        };
        let _ = writeln!(out, "{:<20} {:<40} {}", label, "#".repeat(len), fmt(*value));
    }
    let _ = writeln!(out);
}
