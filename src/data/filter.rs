use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Condition, Listing, ListingTable};

// ---------------------------------------------------------------------------
// Filter predicate: the widget selections that narrow a table
// ---------------------------------------------------------------------------

/// Row predicate built from the dashboard's filter widgets.
///
/// The default value matches every listing. Each field narrows independently:
/// * `condition`   – `None` means both New and Used.
/// * `fuel_types`  – empty means no fuel filter (multi-select with nothing picked).
/// * `price_range` – inclusive; listings without a price never match a range.
/// * `offer_dates` – inclusive; listings without an offer date never match a range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub condition: Option<Condition>,
    pub fuel_types: BTreeSet<String>,
    pub price_range: Option<(f64, f64)>,
    pub offer_dates: Option<(NaiveDate, NaiveDate)>,
}

impl ListingFilter {
    /// Filter on condition only.
    pub fn condition(condition: Option<Condition>) -> Self {
        Self {
            condition,
            ..Self::default()
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(cond) = self.condition {
            if listing.condition != Some(cond) {
                return false;
            }
        }
        if !self.fuel_types.is_empty() {
            match &listing.fuel_type {
                Some(fuel) if self.fuel_types.contains(fuel) => {}
                _ => return false,
            }
        }
        if let Some((lo, hi)) = self.price_range {
            match listing.price {
                Some(p) if p >= lo && p <= hi => {}
                _ => return false,
            }
        }
        if let Some((from, to)) = self.offer_dates {
            match listing.offer_publication_date {
                Some(d) if d >= from && d <= to => {}
                _ => return false,
            }
        }
        true
    }

    /// Rows of `table` passing the filter, in their original order.
    pub fn apply(&self, table: &ListingTable) -> ListingTable {
        if self.is_pass_through() {
            return table.clone();
        }
        table.filter_rows(|row| self.matches(row))
    }

    /// True when no field narrows anything.
    pub fn is_pass_through(&self) -> bool {
        self.condition.is_none()
            && self.fuel_types.is_empty()
            && self.price_range.is_none()
            && self.offer_dates.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn filtered_indices(table: &ListingTable, filter: &ListingFilter) -> Vec<usize> {
        table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, _)| i)
            .collect()
    }

    fn listing(price: Option<f64>, fuel: Option<&str>, condition: Condition) -> Listing {
        Listing {
            price,
            fuel_type: fuel.map(str::to_string),
            condition: Some(condition),
            ..Default::default()
        }
    }

    fn sample() -> ListingTable {
        ListingTable::new(
            [Column::Price, Column::FuelType, Column::Condition],
            vec![
                listing(Some(5_000.0), Some("Diesel"), Condition::Used),
                listing(Some(90_000.0), Some("Gasoline"), Condition::New),
                listing(None, Some("Diesel"), Condition::Used),
                listing(Some(20_000.0), None, Condition::Used),
            ],
        )
    }

    #[test]
    fn test_default_matches_everything() {
        let table = sample();
        let filter = ListingFilter::default();
        assert!(filter.is_pass_through());
        assert_eq!(filter.apply(&table), table);
        assert_eq!(filtered_indices(&table, &filter), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_condition_filter() {
        let table = sample();
        let used = ListingFilter::condition(Some(Condition::Used));
        assert_eq!(filtered_indices(&table, &used), vec![0, 2, 3]);
        assert_eq!(ListingFilter::condition(None).apply(&table).len(), 4);
    }

    #[test]
    fn test_fuel_selection_excludes_null_fuel() {
        let table = sample();
        let filter = ListingFilter {
            fuel_types: BTreeSet::from(["Diesel".to_string()]),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &filter), vec![0, 2]);
    }

    #[test]
    fn test_price_range_is_inclusive_and_drops_null_price() {
        let table = sample();
        let filter = ListingFilter {
            price_range: Some((5_000.0, 20_000.0)),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &filter), vec![0, 3]);
    }

    #[test]
    fn test_offer_date_range() {
        let day = |d| NaiveDate::from_ymd_opt(2021, 5, d);
        let table = ListingTable::new(
            [Column::OfferPublicationDate],
            vec![
                Listing {
                    offer_publication_date: day(1),
                    ..Default::default()
                },
                Listing {
                    offer_publication_date: day(9),
                    ..Default::default()
                },
                Listing::default(),
            ],
        );
        let filter = ListingFilter {
            offer_dates: Some((day(1).unwrap(), day(5).unwrap())),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &filter), vec![0]);
    }
}
