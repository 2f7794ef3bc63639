use serde::{Deserialize, Serialize};

/// Display value used wherever a summary field has no value.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Summary: fixed-shape aggregate over a batch of derived rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub avg_unit_price: f64,
    /// City with the highest summed revenue.
    pub top_city: String,
    /// Product with the highest summed profit.
    pub top_product: String,
    /// City with the lowest mean per-row profit margin, `None` when no
    /// city has a defined margin.
    pub lowest_margin_city: Option<String>,
    pub total_transactions: usize,
}

impl Summary {
    pub fn lowest_margin_city_label(&self) -> &str {
        self.lowest_margin_city.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}
