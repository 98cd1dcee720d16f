use super::model::{Column, ListingTable};

// ---------------------------------------------------------------------------
// Cleaning: per-column percentile trim + derived age
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanOptions {
    /// Rows above this quantile in any numeric column are dropped.
    pub quantile: f64,
    /// Year `Car_Age` is measured from.
    pub reference_year: i32,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            quantile: 0.95,
            reference_year: 2025,
        }
    }
}

/// Outlier filter followed by the `Car_Age` derivation.
pub fn clean(table: &ListingTable, options: &CleanOptions) -> ListingTable {
    let trimmed = filter_quantile(table, options.quantile);
    derive_car_age(trimmed, options.reference_year)
}

/// The default trim: every numeric column at or below its own 95th percentile.
pub fn filter_95th_percentile(table: &ListingTable) -> ListingTable {
    filter_quantile(table, 0.95)
}

/// Keep a row only if, for every numeric column, its value is at or below that
/// column's `q`-quantile. Thresholds all come from the unfiltered `table`; a
/// null cell never fails its column. Row order is preserved.
pub fn filter_quantile(table: &ListingTable, q: f64) -> ListingTable {
    let thresholds = column_thresholds(table, q);
    if thresholds.is_empty() {
        return table.clone();
    }
    for (col, limit) in &thresholds {
        log::debug!("{col} threshold at q={q}: {limit}");
    }
    retain_within(table, &thresholds)
}

/// `(column, q-quantile)` for every numeric column that has at least one value.
pub fn column_thresholds(table: &ListingTable, q: f64) -> Vec<(Column, f64)> {
    table
        .numeric_columns()
        .into_iter()
        .filter_map(|col| {
            let mut values = table.numeric_values(col);
            quantile(&mut values, q).map(|limit| (col, limit))
        })
        .collect()
}

fn retain_within(table: &ListingTable, thresholds: &[(Column, f64)]) -> ListingTable {
    table.filter_rows(|row| {
        thresholds
            .iter()
            .all(|&(col, limit)| row.numeric(col).map_or(true, |v| v <= limit))
    })
}

/// `Car_Age = reference_year - Production_year` (null when the year is null).
pub fn derive_car_age(table: ListingTable, reference_year: i32) -> ListingTable {
    table.with_derived_column(Column::CarAge, |row| {
        row.car_age = row.production_year.map(|year| reference_year - year);
    })
}

/// Quantile with linear interpolation between the closest ranks.
///
/// Sorts `values` in place. Returns `None` for an empty slice or `q` outside `[0, 1]`.
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper || upper >= n {
        return Some(values[lower.min(n - 1)]);
    }
    let fraction = pos - lower as f64;
    Some(values[lower] * (1.0 - fraction) + values[upper] * fraction)
}

/// Middle value of `values` (mean of the two middle values for even counts).
pub fn median(values: &mut [f64]) -> Option<f64> {
    quantile(values, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Listing;

    fn priced(prices: &[f64]) -> ListingTable {
        let rows = prices
            .iter()
            .map(|&p| Listing {
                brand: "X".into(),
                price: Some(p),
                ..Default::default()
            })
            .collect();
        ListingTable::new([Column::VehicleBrand, Column::Price], rows)
    }

    fn prices(table: &ListingTable) -> Vec<f64> {
        table.rows().iter().filter_map(|r| r.price).collect()
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let mut v: Vec<f64> = (1..=10).map(f64::from).rev().collect();
        assert_eq!(quantile(&mut v, 0.0), Some(1.0));
        assert_eq!(quantile(&mut v, 1.0), Some(10.0));
        assert!((quantile(&mut v, 0.95).unwrap() - 9.55).abs() < 1e-9);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(quantile(&mut [], 0.5), None);
        assert_eq!(quantile(&mut [1.0], 1.5), None);
    }

    #[test]
    fn test_drops_exactly_the_injected_outliers() {
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push(Listing {
                brand: format!("B{i}"),
                price: Some(10_000.0 + i as f64 * 100.0),
                mileage_km: Some(50_000.0 + i as f64 * 1_000.0),
                ..Default::default()
            });
        }
        rows[3].price = Some(5_000_000.0);
        rows[7].mileage_km = Some(9_000_000.0);
        let table = ListingTable::new(
            [Column::VehicleBrand, Column::Price, Column::MileageKm],
            rows,
        );

        let cleaned = filter_95th_percentile(&table);
        let kept: Vec<&str> = cleaned.rows().iter().map(|r| r.brand.as_str()).collect();
        assert_eq!(kept, vec!["B0", "B1", "B2", "B4", "B5", "B6", "B8", "B9"]);
    }

    #[test]
    fn test_nulls_do_not_fail_their_column() {
        let mut table = priced(&[1.0, 2.0, 3.0, 4.0, 100.0]);
        let mut rows = table.rows().to_vec();
        rows.push(Listing {
            brand: "no price".into(),
            ..Default::default()
        });
        table = table.with_rows(rows);

        let cleaned = filter_95th_percentile(&table);
        assert_eq!(cleaned.len(), 5);
        assert!(cleaned.rows().iter().any(|r| r.brand == "no price"));
        assert_eq!(prices(&cleaned), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_no_numeric_columns_is_identity() {
        let rows = vec![
            Listing {
                brand: "A".into(),
                colour: Some("red".into()),
                ..Default::default()
            },
            Listing {
                brand: "B".into(),
                ..Default::default()
            },
        ];
        let table = ListingTable::new([Column::VehicleBrand, Column::Colour], rows);
        assert_eq!(filter_95th_percentile(&table), table);
    }

    #[test]
    fn test_idempotent_once_the_top_is_tied() {
        let mut values = vec![10.0; 96];
        values.extend([1_000.0, 2_000.0, 3_000.0, 4_000.0]);
        let table = priced(&values);

        let once = filter_95th_percentile(&table);
        assert_eq!(once.len(), 96);
        let twice = filter_95th_percentile(&once);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_reapplying_to_distinct_values_trims_again() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let once = filter_95th_percentile(&priced(&values));
        assert_eq!(once.len(), 95);
        let twice = filter_95th_percentile(&once);
        assert_eq!(twice.len(), 90);
    }

    #[test]
    fn test_threshold_order_does_not_change_result() {
        let mut rows = Vec::new();
        for i in 0..40 {
            rows.push(Listing {
                brand: format!("B{i}"),
                price: Some(((i * 37) % 40) as f64),
                mileage_km: Some(((i * 11) % 40) as f64),
                power_hp: Some(((i * 23) % 40) as f64),
                ..Default::default()
            });
        }
        let table = ListingTable::new(
            [Column::Price, Column::MileageKm, Column::PowerHp, Column::VehicleBrand],
            rows,
        );

        let mut thresholds = column_thresholds(&table, 0.95);
        assert_eq!(thresholds.len(), 3);
        let forward = retain_within(&table, &thresholds);
        thresholds.reverse();
        let backward = retain_within(&table, &thresholds);
        thresholds.rotate_left(1);
        let rotated = retain_within(&table, &thresholds);

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
        assert_eq!(forward, filter_95th_percentile(&table));
    }

    #[test]
    fn test_car_age_is_derived_after_trim() {
        let rows = vec![
            Listing {
                production_year: Some(2015),
                ..Default::default()
            },
            Listing::default(),
        ];
        let table = ListingTable::new([Column::VehicleBrand], rows);
        let cleaned = clean(&table, &CleanOptions::default());
        assert!(cleaned.has_column(Column::CarAge));
        assert_eq!(cleaned.rows()[0].car_age, Some(10));
        assert_eq!(cleaned.rows()[1].car_age, None);
    }
}
