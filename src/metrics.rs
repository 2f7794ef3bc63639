//! Per-row financial fields.

use crate::models::{DerivedRow, TransactionRow};

/// Compute `revenue` and `profit` for every row.
///
/// `revenue = units_sold * unit_price` and
/// `profit = (unit_price - cost_per_unit) * units_sold`. No rounding and no
/// range checks are applied; negative inputs flow straight through.
pub fn derive_metrics(rows: &[TransactionRow]) -> Vec<DerivedRow> {
    rows.iter().map(derive_row).collect()
}

pub fn derive_row(row: &TransactionRow) -> DerivedRow {
    DerivedRow {
        city: row.city.clone(),
        product: row.product.clone(),
        units_sold: row.units_sold,
        unit_price: row.unit_price,
        cost_per_unit: row.cost_per_unit,
        revenue: row.units_sold * row.unit_price,
        profit: (row.unit_price - row.cost_per_unit) * row.units_sold,
    }
}
