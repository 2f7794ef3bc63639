//! Summary statistics over derived rows.
//!
//! Groups are kept in a `BTreeMap`, so every "pick the best group" step walks
//! keys in lexicographic order and the first key among equal values wins.

use std::collections::BTreeMap;

use crate::models::{DerivedRow, Summary};

/// Reduce derived rows into a [`Summary`].
///
/// Returns `None` for an empty input and for inputs whose groups cannot be
/// ranked (every group sum is NaN). Callers render `None` as "no data".
pub fn summarize(rows: &[DerivedRow]) -> Option<Summary> {
    if rows.is_empty() {
        return None;
    }

    let total_revenue: f64 = rows.iter().map(|r| r.revenue).sum();
    let total_profit: f64 = rows.iter().map(|r| r.profit).sum();
    let avg_unit_price = rows.iter().map(|r| r.unit_price).sum::<f64>() / rows.len() as f64;

    let Some(top_city) = arg_max(&group_sum(rows, |r| &r.city, |r| r.revenue)) else {
        log::error!("Cannot rank cities by revenue: no finite revenue totals");
        return None;
    };
    let Some(top_product) = arg_max(&group_sum(rows, |r| &r.product, |r| r.profit)) else {
        log::error!("Cannot rank products by profit: no finite profit totals");
        return None;
    };

    Some(Summary {
        total_revenue,
        total_profit,
        avg_unit_price,
        top_city,
        top_product,
        lowest_margin_city: lowest_margin_city(rows),
        total_transactions: rows.len(),
    })
}

/// Sum `value` per distinct `key`.
pub fn group_sum<'a, K, V>(rows: &'a [DerivedRow], key: K, value: V) -> BTreeMap<String, f64>
where
    K: Fn(&'a DerivedRow) -> &'a String,
    V: Fn(&DerivedRow) -> f64,
{
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        *groups.entry(key(row).clone()).or_insert(0.0) += value(row);
    }
    groups
}

/// Mean profit margin per city, over rows with a defined margin only.
///
/// Cities whose rows all have zero revenue are absent from the result.
pub fn city_margins(rows: &[DerivedRow]) -> BTreeMap<String, f64> {
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        if let Some(margin) = row.profit_margin() {
            let entry = acc.entry(row.city.as_str()).or_insert((0.0, 0));
            entry.0 += margin;
            entry.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(city, (sum, n))| (city.to_string(), sum / n as f64))
        .collect()
}

fn lowest_margin_city(rows: &[DerivedRow]) -> Option<String> {
    let margins = city_margins(rows);
    let city = arg_min(&margins);
    if city.is_none() {
        log::warn!("No city has a defined profit margin; lowest margin city unavailable");
    }
    city
}

fn arg_max(groups: &BTreeMap<String, f64>) -> Option<String> {
    pick(groups, |candidate, best| candidate > best)
}

fn arg_min(groups: &BTreeMap<String, f64>) -> Option<String> {
    pick(groups, |candidate, best| candidate < best)
}

/// Walk groups in key order, replacing the current pick only when `better`
/// holds strictly. NaN values are skipped with a warning.
fn pick<F>(groups: &BTreeMap<String, f64>, better: F) -> Option<String>
where
    F: Fn(f64, f64) -> bool,
{
    let mut best: Option<(&String, f64)> = None;
    for (key, &value) in groups {
        if value.is_nan() {
            log::warn!("Skipping group '{}': its total is NaN", key);
            continue;
        }
        match best {
            Some((_, current)) if !better(value, current) => {}
            _ => best = Some((key, value)),
        }
    }
    best.map(|(key, _)| key.clone())
}
