use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::aggregate::below_price_quantile;
use super::clean::CleanOptions;
use super::error::DataResult;
use super::loader::load_and_clean;
use super::model::{Column, ListingTable};

// ---------------------------------------------------------------------------
// DataStore – the cleaned dataset every page reads from
// ---------------------------------------------------------------------------

/// Built once per load and handed to each page by reference.
///
/// The tables are immutable; pages narrow them with a
/// [`ListingFilter`](super::filter::ListingFilter) and hand the copy to the
/// aggregation helpers.
#[derive(Debug, Clone)]
pub struct DataStore {
    source: PathBuf,
    cleaned: Arc<ListingTable>,
    /// Cleaned rows with a known production year.
    trends: Arc<ListingTable>,
    /// Cleaned rows priced strictly below the cleaned price quantile.
    comparisons: Arc<ListingTable>,
    price_max: f64,
}

impl DataStore {
    /// Load and clean `path`.
    pub fn load(path: &Path, options: &CleanOptions) -> DataResult<Self> {
        let cleaned = load_and_clean(path, options)?;
        Self::from_cleaned(path, cleaned, options.quantile)
    }

    /// Wrap an already cleaned table.
    pub fn from_cleaned(
        source: impl Into<PathBuf>,
        cleaned: ListingTable,
        comparison_quantile: f64,
    ) -> DataResult<Self> {
        let trends = cleaned.filter_rows(|row| row.production_year.is_some());
        let comparisons = below_price_quantile(&cleaned, comparison_quantile)?;
        let price_max = cleaned
            .numeric_values(Column::Price)
            .into_iter()
            .fold(0.0, f64::max);
        log::debug!(
            "DataStore: {} cleaned, {} with year, {} for comparisons, max price {price_max}",
            cleaned.len(),
            trends.len(),
            comparisons.len()
        );

        Ok(Self {
            source: source.into(),
            cleaned: Arc::new(cleaned),
            trends: Arc::new(trends),
            comparisons: Arc::new(comparisons),
            price_max,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn cleaned(&self) -> &ListingTable {
        &self.cleaned
    }

    pub fn trends(&self) -> &ListingTable {
        &self.trends
    }

    pub fn comparisons(&self) -> &ListingTable {
        &self.comparisons
    }

    /// Upper bound for the price sliders.
    pub fn price_max(&self) -> f64 {
        self.price_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::DataError;
    use crate::data::model::Listing;

    #[test]
    fn test_page_bases() {
        let mut rows: Vec<Listing> = (1..=20)
            .map(|p| Listing {
                brand: "X".into(),
                price: Some(p as f64 * 1000.0),
                production_year: Some(2000 + p),
                ..Default::default()
            })
            .collect();
        rows[0].production_year = None;
        let table = ListingTable::new([Column::Price, Column::ProductionYear], rows);

        let store = DataStore::from_cleaned("memory.csv", table, 0.95).unwrap();
        assert_eq!(store.cleaned().len(), 20);
        assert_eq!(store.trends().len(), 19);
        assert_eq!(store.comparisons().len(), 19);
        assert_eq!(store.price_max(), 20_000.0);
        assert_eq!(store.source(), Path::new("memory.csv"));
    }

    #[test]
    fn test_empty_table_has_zero_price_max() {
        let table = ListingTable::new([Column::Price], Vec::new());
        let store = DataStore::from_cleaned("empty.csv", table, 0.95).unwrap();
        assert_eq!(store.price_max(), 0.0);
        assert!(store.comparisons().is_empty());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = DataStore::load(Path::new("no/such/listings.csv"), &CleanOptions::default())
            .unwrap_err();
        assert!(matches!(err, DataError::DataSource { .. }));
    }
}
