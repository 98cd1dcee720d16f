//! Chart-ready tables derived from a cleaned [`ListingTable`].
//!
//! Every helper is a pure function of its inputs. Helpers check the columns they
//! read up front and fail with [`DataError::Schema`] naming the first missing one.
//! Empty inputs give empty outputs.
//!
//! Ranking ties (top-N brands, colour counts, brand means) keep the order in
//! which the values first appear in the table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::clean::{median, quantile};
use super::error::{DataError, DataResult};
use super::filter::ListingFilter;
use super::model::{Column, Condition, Listing, ListingTable};

fn require_all(table: &ListingTable, columns: &[Column]) -> DataResult<()> {
    columns.iter().try_for_each(|&c| table.require(c))
}

/// Grouping and counting only make sense on categorical columns.
fn require_categorical(column: Column) -> DataResult<()> {
    if column.is_categorical() {
        Ok(())
    } else {
        Err(DataError::Schema { column })
    }
}

// ---------------------------------------------------------------------------
// Frequency ranking
// ---------------------------------------------------------------------------

/// Non-null values of a categorical column with their row counts, most frequent
/// first. Equal counts keep first-appearance order.
pub fn value_counts(table: &ListingTable, column: Column) -> DataResult<Vec<(String, usize)>> {
    table.require(column)?;
    require_categorical(column)?;

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for row in table.rows() {
        let Some(value) = row.category(column) else {
            continue;
        };
        match slot.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slot.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }
    // `sort_by` is stable, which is what pins the tie-break.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

/// All rows whose brand is among the `n` most frequent brands.
pub fn top_brand_subset(table: &ListingTable, n: usize) -> DataResult<ListingTable> {
    let top: BTreeSet<String> = value_counts(table, Column::VehicleBrand)?
        .into_iter()
        .take(n)
        .map(|(brand, _)| brand)
        .collect();
    Ok(table.filter_rows(|row| top.contains(&row.brand)))
}

/// One row of the colour popularity table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourCount {
    #[serde(rename = "Colour")]
    pub colour: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

impl ColourCount {
    pub const COLUMNS: [&'static str; 2] = ["Colour", "Count"];
}

/// The `n` most frequent colours, most frequent first.
pub fn colour_counts(table: &ListingTable, n: usize) -> DataResult<Vec<ColourCount>> {
    Ok(value_counts(table, Column::Colour)?
        .into_iter()
        .take(n)
        .map(|(colour, count)| ColourCount { colour, count })
        .collect())
}

// ---------------------------------------------------------------------------
// Price aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandPrice {
    #[serde(rename = "Vehicle_brand")]
    pub brand: String,
    #[serde(rename = "Price")]
    pub price: f64,
}

impl BrandPrice {
    pub const COLUMNS: [&'static str; 2] = ["Vehicle_brand", "Price"];
}

/// Mean price per brand over priced rows, highest mean first.
pub fn brand_mean_price(table: &ListingTable) -> DataResult<Vec<BrandPrice>> {
    require_all(table, &[Column::VehicleBrand, Column::Price])?;

    let mut sums: Vec<(String, f64, usize)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for row in table.rows() {
        let (Some(brand), Some(price)) = (row.category(Column::VehicleBrand), row.price) else {
            continue;
        };
        match slot.get(brand) {
            Some(&i) => {
                sums[i].1 += price;
                sums[i].2 += 1;
            }
            None => {
                slot.insert(brand, sums.len());
                sums.push((brand.to_string(), price, 1));
            }
        }
    }

    let mut means: Vec<BrandPrice> = sums
        .into_iter()
        .map(|(brand, sum, n)| BrandPrice {
            brand,
            price: sum / n as f64,
        })
        .collect();
    means.sort_by(|a, b| b.price.total_cmp(&a.price));
    Ok(means)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPrice {
    #[serde(rename = "Production_year")]
    pub year: i32,
    #[serde(rename = "Price")]
    pub price: f64,
}

impl YearPrice {
    pub const COLUMNS: [&'static str; 2] = ["Production_year", "Price"];
}

/// Mean price per production year, oldest year first.
pub fn price_trend(table: &ListingTable) -> DataResult<Vec<YearPrice>> {
    require_all(table, &[Column::ProductionYear, Column::Price])?;

    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        if let (Some(year), Some(price)) = (row.production_year, row.price) {
            let entry = sums.entry(year).or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }
    }
    Ok(sums
        .into_iter()
        .map(|(year, (sum, n))| YearPrice {
            year,
            price: sum / n as f64,
        })
        .collect())
}

/// Five-number price summary of one group, ready for a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSpread {
    /// One value per grouping column, in the order requested.
    pub keys: Vec<String>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

/// Price spread per group of `by` columns. Rows with a null key or price are
/// skipped; groups come out in first-appearance order.
pub fn price_distribution(table: &ListingTable, by: &[Column]) -> DataResult<Vec<PriceSpread>> {
    table.require(Column::Price)?;
    for &col in by {
        table.require(col)?;
        require_categorical(col)?;
    }

    let mut groups: Vec<(Vec<String>, Vec<f64>)> = Vec::new();
    let mut slot: HashMap<Vec<String>, usize> = HashMap::new();
    for row in table.rows() {
        let Some(price) = row.price else { continue };
        let Some(keys) = by
            .iter()
            .map(|&c| row.category(c).map(str::to_string))
            .collect::<Option<Vec<String>>>()
        else {
            continue;
        };
        match slot.get(&keys) {
            Some(&i) => groups[i].1.push(price),
            None => {
                slot.insert(keys.clone(), groups.len());
                groups.push((keys, vec![price]));
            }
        }
    }

    Ok(groups
        .into_iter()
        .filter_map(|(keys, mut prices)| {
            let q1 = quantile(&mut prices, 0.25)?;
            let mid = median(&mut prices)?;
            let q3 = quantile(&mut prices, 0.75)?;
            Some(PriceSpread {
                keys,
                min: prices[0],
                q1,
                median: mid,
                q3,
                max: prices[prices.len() - 1],
                count: prices.len(),
            })
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Deviation from the group median
// ---------------------------------------------------------------------------

/// A listing next to the median price of its (brand[, model], year) group.
///
/// All three added values are `None` when the listing has no group (null year
/// or empty brand) or no price. `pct_deviation` is also `None` when the group
/// median is exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationRow {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(rename = "Price_median")]
    pub price_median: Option<f64>,
    #[serde(rename = "Price_deviation")]
    pub price_deviation: Option<f64>,
    #[serde(rename = "%_Deviation")]
    pub pct_deviation: Option<f64>,
}

impl DeviationRow {
    /// Columns added to the listing's own.
    pub const COLUMNS: [&'static str; 3] = ["Price_median", "Price_deviation", "%_Deviation"];
}

type GroupKey = (String, Option<String>, i32);

fn group_key(row: &Listing, by_model: bool) -> Option<GroupKey> {
    let brand = row.category(Column::VehicleBrand)?.to_string();
    let model = if by_model {
        Some(row.category(Column::VehicleModel)?.to_string())
    } else {
        None
    };
    Some((brand, model, row.production_year?))
}

/// Every row of `table` left-joined with its group's median price.
///
/// `price_deviation = price - median`, `pct_deviation = 100 * deviation / median`.
pub fn deviation_table(table: &ListingTable, by_model: bool) -> DataResult<Vec<DeviationRow>> {
    require_all(
        table,
        &[Column::VehicleBrand, Column::ProductionYear, Column::Price],
    )?;
    if by_model {
        table.require(Column::VehicleModel)?;
    }

    let mut group_prices: HashMap<GroupKey, Vec<f64>> = HashMap::new();
    for row in table.rows() {
        if let (Some(key), Some(price)) = (group_key(row, by_model), row.price) {
            group_prices.entry(key).or_default().push(price);
        }
    }
    let medians: HashMap<GroupKey, f64> = group_prices
        .into_iter()
        .filter_map(|(key, mut prices)| median(&mut prices).map(|m| (key, m)))
        .collect();

    Ok(table
        .rows()
        .iter()
        .map(|row| {
            let price_median = group_key(row, by_model).and_then(|k| medians.get(&k).copied());
            let price_deviation = row.price.zip(price_median).map(|(p, m)| p - m);
            let pct_deviation = price_deviation
                .zip(price_median)
                .filter(|&(_, m)| m != 0.0)
                .map(|(d, m)| d / m * 100.0);
            DeviationRow {
                listing: row.clone(),
                price_median,
                price_deviation,
                pct_deviation,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Row subsets
// ---------------------------------------------------------------------------

/// Rows optionally narrowed to one condition; identity when `condition` is `None`.
pub fn mileage_price_subset(
    table: &ListingTable,
    condition: Option<Condition>,
) -> DataResult<ListingTable> {
    require_all(table, &[Column::MileageKm, Column::Price])?;
    if condition.is_some() {
        table.require(Column::Condition)?;
    }
    Ok(ListingFilter::condition(condition).apply(table))
}

/// Rows with a known origin country, optionally narrowed to one condition.
pub fn origin_subset(table: &ListingTable, condition: Option<Condition>) -> DataResult<ListingTable> {
    table.require(Column::OriginCountry)?;
    if condition.is_some() {
        table.require(Column::Condition)?;
    }
    let filter = ListingFilter::condition(condition);
    Ok(table.filter_rows(|row| row.origin_country.is_some() && filter.matches(row)))
}

/// Rows with both engine displacement and power known.
pub fn engine_subset(table: &ListingTable) -> DataResult<ListingTable> {
    require_all(table, &[Column::DisplacementCm3, Column::PowerHp])?;
    Ok(table.filter_rows(|row| row.displacement_cm3.is_some() && row.power_hp.is_some()))
}

/// Rows priced strictly below the `q`-quantile of price.
pub fn below_price_quantile(table: &ListingTable, q: f64) -> DataResult<ListingTable> {
    table.require(Column::Price)?;
    let mut prices = table.numeric_values(Column::Price);
    let Some(limit) = quantile(&mut prices, q) else {
        return Ok(table.with_rows(Vec::new()));
    };
    Ok(table.filter_rows(|row| row.price.is_some_and(|p| p < limit)))
}

/// A used listing sized for the animated mileage/price chart.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPoint {
    pub listing: Listing,
    /// `Power_HP / max(Power_HP) * 50`.
    pub bubble_size: f64,
}

/// Used listings with known power and production year, with bubble sizes
/// relative to the most powerful of them.
pub fn animation_frames(table: &ListingTable) -> DataResult<Vec<AnimationPoint>> {
    require_all(
        table,
        &[Column::Condition, Column::PowerHp, Column::ProductionYear],
    )?;

    let used: Vec<&Listing> = table
        .rows()
        .iter()
        .filter(|r| {
            r.condition == Some(Condition::Used)
                && r.power_hp.is_some()
                && r.production_year.is_some()
        })
        .collect();
    let max_power = used
        .iter()
        .filter_map(|r| r.power_hp)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(used
        .into_iter()
        .map(|r| {
            let power = r.power_hp.unwrap_or(0.0);
            let bubble_size = if max_power > 0.0 {
                power / max_power * 50.0
            } else {
                0.0
            };
            AnimationPoint {
                listing: r.clone(),
                bubble_size,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Counts by production year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearListings {
    #[serde(rename = "Production_year")]
    pub year: i32,
    #[serde(rename = "Number_of_Listings")]
    pub listings: usize,
}

impl YearListings {
    pub const COLUMNS: [&'static str; 2] = ["Production_year", "Number_of_Listings"];
}

/// Number of listings per production year, oldest first.
pub fn listings_per_year(table: &ListingTable) -> DataResult<Vec<YearListings>> {
    table.require(Column::ProductionYear)?;
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for year in table.rows().iter().filter_map(|r| r.production_year) {
        *counts.entry(year).or_default() += 1;
    }
    Ok(counts
        .into_iter()
        .map(|(year, listings)| YearListings { year, listings })
        .collect())
}

/// Count of one category value within one production year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryYearCount {
    #[serde(rename = "Production_year")]
    pub year: i32,
    pub category: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

/// Listings per (production year, `column` value), ordered by year then value.
/// Rows with a null year or category are skipped.
pub fn category_trend(table: &ListingTable, column: Column) -> DataResult<Vec<CategoryYearCount>> {
    require_all(table, &[Column::ProductionYear, column])?;
    require_categorical(column)?;

    let mut counts: BTreeMap<(i32, String), usize> = BTreeMap::new();
    for row in table.rows() {
        if let (Some(year), Some(value)) = (row.production_year, row.category(column)) {
            *counts.entry((year, value.to_string())).or_default() += 1;
        }
    }
    Ok(counts
        .into_iter()
        .map(|((year, category), count)| CategoryYearCount {
            year,
            category,
            count,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Overview figures and widget options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionShare {
    pub new: usize,
    pub used: usize,
    pub total: usize,
    /// Share of used listings in percent, one decimal.
    pub used_percentage: f64,
}

/// New/used split over all rows. An empty table reports 0.0 %.
pub fn condition_share(table: &ListingTable) -> DataResult<ConditionShare> {
    table.require(Column::Condition)?;
    let used = table
        .rows()
        .iter()
        .filter(|r| r.condition == Some(Condition::Used))
        .count();
    let new = table
        .rows()
        .iter()
        .filter(|r| r.condition == Some(Condition::New))
        .count();
    let total = table.len();
    let used_percentage = if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 1000.0).round() / 10.0
    };
    Ok(ConditionShare {
        new,
        used,
        total,
        used_percentage,
    })
}

/// Sorted distinct non-null values of a categorical column.
pub fn distinct_values(table: &ListingTable, column: Column) -> DataResult<Vec<String>> {
    table.require(column)?;
    require_categorical(column)?;
    let values: BTreeSet<&str> = table.rows().iter().filter_map(|r| r.category(column)).collect();
    Ok(values.into_iter().map(str::to_string).collect())
}

pub fn brand_options(table: &ListingTable) -> DataResult<Vec<String>> {
    distinct_values(table, Column::VehicleBrand)
}

pub fn fuel_type_options(table: &ListingTable) -> DataResult<Vec<String>> {
    distinct_values(table, Column::FuelType)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

/// Oldest and newest production year, `None` when no row has a year.
pub fn year_range(table: &ListingTable) -> DataResult<Option<YearRange>> {
    table.require(Column::ProductionYear)?;
    let years = || table.rows().iter().filter_map(|r| r.production_year);
    Ok(years()
        .min()
        .zip(years().max())
        .map(|(min, max)| YearRange { min, max }))
}
