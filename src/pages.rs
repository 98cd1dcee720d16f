use std::collections::BTreeMap;
use std::fmt;

use crate::data::aggregate::{
    animation_frames, brand_mean_price, category_trend, colour_counts, condition_share,
    deviation_table, engine_subset, listings_per_year, mileage_price_subset, origin_subset,
    price_distribution, price_trend, top_brand_subset, year_range, AnimationPoint, BrandPrice,
    CategoryYearCount, ColourCount, ConditionShare, DeviationRow, PriceSpread, YearListings,
    YearPrice, YearRange,
};
use crate::data::error::DataResult;
use crate::data::filter::ListingFilter;
use crate::data::model::{Column, Condition};
use crate::data::store::DataStore;

// ---------------------------------------------------------------------------
// Pages and tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Overview,
    Trends,
    Comparisons,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Overview, Page::Trends, Page::Comparisons];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Trends => "Market Trends",
            Page::Comparisons => "Price Comparisons",
        }
    }

    /// The overview is computed once per dataset; the other pages follow the filters.
    pub fn uses_filters(self) -> bool {
        !matches!(self, Page::Overview)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendTab {
    #[default]
    Listings,
    FuelType,
    Transmission,
}

impl TrendTab {
    pub const ALL: [TrendTab; 3] = [TrendTab::Listings, TrendTab::FuelType, TrendTab::Transmission];

    pub fn title(self) -> &'static str {
        match self {
            TrendTab::Listings => "Listings Over Time",
            TrendTab::FuelType => "Fuel Type Trends",
            TrendTab::Transmission => "Transmission Trends",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonTab {
    #[default]
    MileagePrice,
    BrandPrices,
    Deviation,
    PriceByYear,
    Origin,
    Engine,
    Animated,
}

impl ComparisonTab {
    pub const ALL: [ComparisonTab; 7] = [
        ComparisonTab::MileagePrice,
        ComparisonTab::BrandPrices,
        ComparisonTab::Deviation,
        ComparisonTab::PriceByYear,
        ComparisonTab::Origin,
        ComparisonTab::Engine,
        ComparisonTab::Animated,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ComparisonTab::MileagePrice => "Mileage vs Price",
            ComparisonTab::BrandPrices => "Brand Comparisons",
            ComparisonTab::Deviation => "Price Deviation",
            ComparisonTab::PriceByYear => "Average Price by Year",
            ComparisonTab::Origin => "Price by Country of Origin",
            ComparisonTab::Engine => "Engine Power vs Displacement",
            ComparisonTab::Animated => "Animated Price vs Mileage",
        }
    }
}

// ---------------------------------------------------------------------------
// Page data: what each page's charts bind to
// ---------------------------------------------------------------------------

/// Each chart keeps its own result so one missing column only blanks one chart.
pub struct OverviewData {
    pub brand_means: DataResult<Vec<BrandPrice>>,
    pub colours: DataResult<Vec<ColourCount>>,
    pub condition: DataResult<ConditionShare>,
}

impl OverviewData {
    pub fn build(store: &DataStore, top_n: usize) -> Self {
        let table = store.cleaned();
        Self {
            brand_means: brand_mean_price(table),
            colours: colour_counts(table, top_n),
            condition: condition_share(table),
        }
    }
}

pub struct TrendsData {
    pub listings: DataResult<Vec<YearListings>>,
    pub fuel: DataResult<Vec<CategoryYearCount>>,
    pub transmission: DataResult<Vec<CategoryYearCount>>,
}

impl TrendsData {
    pub fn build(store: &DataStore, filter: &ListingFilter) -> Self {
        let table = filter.apply(store.trends());
        Self {
            listings: listings_per_year(&table),
            fuel: category_trend(&table, Column::FuelType),
            transmission: category_trend(&table, Column::Transmission),
        }
    }
}

/// Chart-local settings on the comparisons page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonOptions {
    pub mileage_condition: Option<Condition>,
    pub origin_condition: Option<Condition>,
    pub deviation_by_model: bool,
    pub top_n: usize,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            mileage_condition: Some(Condition::Used),
            origin_condition: None,
            deviation_by_model: false,
            top_n: 10,
        }
    }
}

/// Scatter points grouped by category, categories in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySeries {
    pub series: Vec<(String, Vec<[f64; 2]>)>,
}

impl CategorySeries {
    /// Group `(category, x, y)` triples; a triple with a null coordinate is skipped.
    pub fn collect<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<f64>, Option<f64>)>,
    {
        let mut grouped: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
        for (category, x, y) in points {
            if let (Some(x), Some(y)) = (x, y) {
                grouped.entry(category).or_default().push([x, y]);
            }
        }
        Self {
            series: grouped
                .into_iter()
                .map(|(category, points)| (category.to_string(), points))
                .collect(),
        }
    }

    /// Total number of points over all categories.
    pub fn len(&self) -> usize {
        self.series.iter().map(|(_, points)| points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|(_, points)| points.is_empty())
    }
}

/// One marker of the animated mileage/price chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub brand: String,
    pub mileage: f64,
    pub price: f64,
    pub size: f64,
}

/// Animation frames keyed by production year; points without mileage or price are dropped.
fn bubbles_by_year(points: Vec<AnimationPoint>) -> BTreeMap<i32, Vec<Bubble>> {
    let mut frames: BTreeMap<i32, Vec<Bubble>> = BTreeMap::new();
    for p in points {
        let l = p.listing;
        if let (Some(year), Some(mileage), Some(price)) = (l.production_year, l.mileage_km, l.price)
        {
            frames.entry(year).or_default().push(Bubble {
                brand: l.brand,
                mileage,
                price,
                size: p.bubble_size,
            });
        }
    }
    frames
}

fn deviation_series(rows: &[DeviationRow]) -> CategorySeries {
    CategorySeries::collect(
        rows.iter()
            .map(|r| (r.listing.brand.as_str(), r.listing.mileage_km, r.pct_deviation)),
    )
}

/// Chart data for the comparisons page, computed once per filter change.
pub struct ComparisonsData {
    /// Mileage against price, by brand.
    pub mileage: DataResult<CategorySeries>,
    /// Keyed by (brand, condition).
    pub brand_prices: DataResult<Vec<PriceSpread>>,
    /// Mileage against `%_Deviation`, by brand.
    pub deviation: DataResult<CategorySeries>,
    /// Unfiltered, like the static chart it feeds.
    pub price_by_year: DataResult<Vec<YearPrice>>,
    pub origin: DataResult<Vec<PriceSpread>>,
    /// Displacement against power, by brand.
    pub engine: DataResult<CategorySeries>,
    pub animation: DataResult<BTreeMap<i32, Vec<Bubble>>>,
    pub years: DataResult<Option<YearRange>>,
}

impl ComparisonsData {
    pub fn build(store: &DataStore, filter: &ListingFilter, options: &ComparisonOptions) -> Self {
        let table = filter.apply(store.comparisons());
        let brand_prices = top_brand_subset(&table, options.top_n).and_then(|top| {
            price_distribution(&top, &[Column::VehicleBrand, Column::Condition])
        });
        let origin = origin_subset(&table, options.origin_condition)
            .and_then(|subset| price_distribution(&subset, &[Column::OriginCountry]));

        let mileage = mileage_price_subset(&table, options.mileage_condition).map(|subset| {
            CategorySeries::collect(
                subset
                    .rows()
                    .iter()
                    .map(|r| (r.brand.as_str(), r.mileage_km, r.price)),
            )
        });
        let engine = engine_subset(&table).map(|subset| {
            CategorySeries::collect(
                subset
                    .rows()
                    .iter()
                    .map(|r| (r.brand.as_str(), r.displacement_cm3, r.power_hp)),
            )
        });

        Self {
            mileage,
            brand_prices,
            deviation: deviation_table(&table, options.deviation_by_model)
                .map(|rows| deviation_series(&rows)),
            price_by_year: price_trend(store.comparisons()),
            origin,
            engine,
            animation: animation_frames(&table).map(bubbles_by_year),
            years: year_range(&table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::DataError;
    use crate::data::model::{Listing, ListingTable};
    use std::collections::BTreeSet;

    fn listing(brand: &str, price: f64, fuel: &str, year: i32, condition: Condition) -> Listing {
        Listing {
            brand: brand.to_string(),
            model: "M".to_string(),
            price: Some(price),
            fuel_type: Some(fuel.to_string()),
            production_year: Some(year),
            condition: Some(condition),
            colour: Some("black".to_string()),
            mileage_km: Some(100_000.0),
            ..Default::default()
        }
    }

    fn store() -> DataStore {
        let mut rows = Vec::new();
        for i in 0..20 {
            let fuel = if i % 2 == 0 { "Diesel" } else { "Gasoline" };
            let condition = if i % 5 == 0 { Condition::New } else { Condition::Used };
            rows.push(listing("Audi", 1_000.0 * (i + 1) as f64, fuel, 2010 + i % 3, condition));
        }
        let table = ListingTable::new(
            [
                Column::Price,
                Column::Condition,
                Column::VehicleBrand,
                Column::VehicleModel,
                Column::ProductionYear,
                Column::MileageKm,
                Column::FuelType,
                Column::Colour,
            ],
            rows,
        );
        DataStore::from_cleaned("memory.csv", table, 0.95).unwrap()
    }

    #[test]
    fn test_overview_reads_cleaned_table() {
        let data = OverviewData::build(&store(), 10);
        assert_eq!(data.brand_means.unwrap().len(), 1);
        assert_eq!(data.colours.unwrap()[0].count, 20);
        assert_eq!(data.condition.unwrap().used_percentage, 80.0);
    }

    #[test]
    fn test_trends_follow_price_and_fuel_filter() {
        let filter = ListingFilter {
            fuel_types: BTreeSet::from(["Diesel".to_string()]),
            price_range: Some((0.0, 10_000.0)),
            ..Default::default()
        };
        let data = TrendsData::build(&store(), &filter);
        let total: usize = data.listings.unwrap().iter().map(|y| y.listings).sum();
        assert_eq!(total, 5);
        assert!(data.fuel.unwrap().iter().all(|c| c.category == "Diesel"));
        assert!(matches!(
            data.transmission,
            Err(DataError::Schema { column: Column::Transmission })
        ));
    }

    #[test]
    fn test_comparisons_surface_missing_columns_per_chart() {
        let data = ComparisonsData::build(
            &store(),
            &ListingFilter::default(),
            &ComparisonOptions::default(),
        );
        // Price 20_000 is at the top of the range and falls out of the comparisons base.
        assert_eq!(data.deviation.unwrap().len(), 19);
        // 19 left, of which 4 are new.
        let mileage = data.mileage.unwrap();
        assert_eq!(mileage.len(), 15);
        assert_eq!(mileage.series.len(), 1);
        assert_eq!(mileage.series[0].0, "Audi");
        assert_eq!(data.brand_prices.unwrap().len(), 2);
        assert!(data.origin.is_err());
        assert!(data.engine.is_err());
        assert!(data.animation.is_err());
        assert_eq!(
            data.years.unwrap(),
            Some(YearRange {
                min: 2010,
                max: 2012
            })
        );
    }

    #[test]
    fn test_category_series_groups_and_skips_nulls() {
        let series = CategorySeries::collect([
            ("Opel", Some(1.0), Some(2.0)),
            ("Audi", Some(3.0), None),
            ("Audi", Some(5.0), Some(6.0)),
            ("Opel", Some(7.0), Some(8.0)),
        ]);
        assert_eq!(series.len(), 3);
        assert_eq!(
            series.series,
            vec![
                ("Audi".to_string(), vec![[5.0, 6.0]]),
                ("Opel".to_string(), vec![[1.0, 2.0], [7.0, 8.0]]),
            ]
        );
        let none: Vec<(&str, Option<f64>, Option<f64>)> = Vec::new();
        assert!(CategorySeries::collect(none).is_empty());
    }

    #[test]
    fn test_bubbles_grouped_by_production_year() {
        let point = |year: i32, mileage: Option<f64>, size: f64| AnimationPoint {
            listing: Listing {
                brand: "Kia".into(),
                production_year: Some(year),
                mileage_km: mileage,
                price: Some(10_000.0),
                ..Default::default()
            },
            bubble_size: size,
        };
        let frames = bubbles_by_year(vec![
            point(2012, Some(90_000.0), 50.0),
            point(2010, Some(150_000.0), 25.0),
            point(2012, None, 10.0),
        ]);
        assert_eq!(frames.keys().copied().collect::<Vec<_>>(), vec![2010, 2012]);
        assert_eq!(frames[&2012].len(), 1);
        assert_eq!(frames[&2012][0].size, 50.0);
        assert_eq!(frames[&2010][0].mileage, 150_000.0);
    }
}
