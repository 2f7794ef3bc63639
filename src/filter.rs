//! Set-membership filtering over derived rows.
//!
//! # Example
//!
//! ```rust
//! use bakery_analytics::RowFilter;
//! let filter = RowFilter::new()
//!     .cities(&["NYC", "LA"])
//!     .products(&["Bagel"]);
//! assert!(filter.matches("NYC", "Bagel"));
//! assert!(!filter.matches("NYC", "Croissant"));
//! ```

use std::collections::HashSet;

use crate::models::DerivedRow;

/// Keeps rows whose city and product are in the selected sets.
///
/// A dimension that was never restricted matches everything. A dimension
/// restricted to an empty set matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    cities: Option<HashSet<String>>,
    products: Option<HashSet<String>>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given cities.
    pub fn cities<S: AsRef<str>>(mut self, cities: &[S]) -> Self {
        self.cities = Some(cities.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    /// Restrict to the given products.
    pub fn products<S: AsRef<str>>(mut self, products: &[S]) -> Self {
        self.products = Some(products.iter().map(|p| p.as_ref().to_string()).collect());
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.cities.is_none() && self.products.is_none()
    }

    pub fn matches(&self, city: &str, product: &str) -> bool {
        let city_ok = self.cities.as_ref().map_or(true, |set| set.contains(city));
        let product_ok = self.products.as_ref().map_or(true, |set| set.contains(product));
        city_ok && product_ok
    }

    pub fn apply(&self, rows: &[DerivedRow]) -> Vec<DerivedRow> {
        rows.iter()
            .filter(|r| self.matches(&r.city, &r.product))
            .cloned()
            .collect()
    }
}

/// Distinct cities in first-seen order.
pub fn distinct_cities(rows: &[DerivedRow]) -> Vec<String> {
    distinct(rows.iter().map(|r| r.city.as_str()))
}

/// Distinct products in first-seen order.
pub fn distinct_products(rows: &[DerivedRow]) -> Vec<String> {
    distinct(rows.iter().map(|r| r.product.as_str()))
}

fn distinct<'a, I: Iterator<Item = &'a str>>(values: I) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
