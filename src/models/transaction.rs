use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TransactionRow: one raw sales record as stored
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub city: String,
    pub product: String,
    pub units_sold: f64,
    pub unit_price: f64,
    pub cost_per_unit: f64,
}

impl TransactionRow {
    pub fn new(
        city: impl Into<String>,
        product: impl Into<String>,
        units_sold: f64,
        unit_price: f64,
        cost_per_unit: f64,
    ) -> Self {
        Self {
            city: city.into(),
            product: product.into(),
            units_sold,
            unit_price,
            cost_per_unit,
        }
    }

    /// True when every numeric field is neither NaN nor infinite.
    pub fn has_finite_values(&self) -> bool {
        self.units_sold.is_finite() && self.unit_price.is_finite() && self.cost_per_unit.is_finite()
    }
}

// ---------------------------------------------------------------------------
// DerivedRow: a transaction with computed revenue and profit
// ---------------------------------------------------------------------------

/// A [`TransactionRow`] with `revenue` and `profit` filled in.
///
/// Both fields are computed by [`crate::metrics::derive_metrics`] and are
/// never read back from a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    pub city: String,
    pub product: String,
    pub units_sold: f64,
    pub unit_price: f64,
    pub cost_per_unit: f64,
    pub revenue: f64,
    pub profit: f64,
}

impl DerivedRow {
    /// Profit as a percentage of revenue.
    ///
    /// Returns `None` when the ratio is undefined, which happens for rows
    /// with zero revenue.
    pub fn profit_margin(&self) -> Option<f64> {
        let margin = self.profit / self.revenue * 100.0;
        margin.is_finite().then_some(margin)
    }
}
