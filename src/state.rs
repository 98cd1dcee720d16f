use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::aggregate::fuel_type_options;
use crate::data::filter::ListingFilter;
use crate::data::store::DataStore;
use crate::pages::{
    ComparisonOptions, ComparisonTab, ComparisonsData, OverviewData, Page, TrendTab, TrendsData,
};

// ---------------------------------------------------------------------------
// Filter widget state
// ---------------------------------------------------------------------------

/// Raw widget values, turned into a [`ListingFilter`] on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterWidgets {
    /// Empty means no fuel filter.
    pub fuel_types: BTreeSet<String>,
    pub price_min: f64,
    pub price_max: f64,
    pub dates_enabled: bool,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl FilterWidgets {
    /// Everything selected, price range spanning `[0, price_ceiling]`.
    pub fn reset(price_ceiling: f64) -> Self {
        Self {
            fuel_types: BTreeSet::new(),
            price_min: 0.0,
            price_max: price_ceiling,
            dates_enabled: false,
            date_from: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            date_to: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap_or_default(),
        }
    }

    pub fn to_filter(&self) -> ListingFilter {
        let (lo, hi) = ordered(self.price_min, self.price_max);
        ListingFilter {
            condition: None,
            fuel_types: self.fuel_types.clone(),
            price_range: Some((lo, hi)),
            offer_dates: self
                .dates_enabled
                .then(|| ordered(self.date_from, self.date_to)),
        }
    }
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ---------------------------------------------------------------------------
// Animation playback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    /// Production year currently shown; `None` until the first frame.
    pub year: Option<i32>,
    pub playing: bool,
    pub last_step: Option<Instant>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a file loads).
    pub store: Option<DataStore>,

    pub page: Page,
    pub trend_tab: TrendTab,
    pub comparison_tab: ComparisonTab,

    pub widgets: FilterWidgets,
    pub comparison_options: ComparisonOptions,
    pub animation: AnimationState,

    /// Fuel types offered by the multi-select.
    pub fuel_options: Vec<String>,

    /// Chart data, rebuilt whenever the dataset or a widget changes.
    pub overview: Option<OverviewData>,
    pub trends: Option<TrendsData>,
    pub comparisons: Option<ComparisonsData>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let comparison_options = ComparisonOptions {
            top_n: config.top_n,
            ..ComparisonOptions::default()
        };
        Self {
            config,
            store: None,
            page: Page::default(),
            trend_tab: TrendTab::default(),
            comparison_tab: ComparisonTab::default(),
            widgets: FilterWidgets::reset(0.0),
            comparison_options,
            animation: AnimationState::default(),
            fuel_options: Vec::new(),
            overview: None,
            trends: None,
            comparisons: None,
            status_message: None,
        }
    }

    /// Load and clean `path`, replacing the current dataset on success.
    pub fn load(&mut self, path: &Path) {
        match DataStore::load(path, &self.config.clean_options()) {
            Ok(store) => {
                log::info!(
                    "Loaded {} cleaned listings from {}",
                    store.cleaned().len(),
                    path.display()
                );
                self.set_store(store);
            }
            Err(e) => {
                log::error!("Failed to load listings: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, reset the widgets and rebuild every page.
    pub fn set_store(&mut self, store: DataStore) {
        self.widgets = FilterWidgets::reset(store.price_max());
        self.fuel_options = fuel_type_options(store.cleaned()).unwrap_or_default();
        self.animation = AnimationState::default();
        self.overview = Some(OverviewData::build(&store, self.config.top_n));
        self.store = Some(store);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered pages after a widget change.
    pub fn refilter(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let filter = self.widgets.to_filter();
        self.trends = Some(TrendsData::build(store, &filter));
        self.comparisons = Some(ComparisonsData::build(
            store,
            &filter,
            &self.comparison_options,
        ));
    }

    /// Toggle a single fuel type in the multi-select.
    pub fn toggle_fuel(&mut self, fuel: &str) {
        if !self.widgets.fuel_types.remove(fuel) {
            self.widgets.fuel_types.insert(fuel.to_string());
        }
        self.refilter();
    }

    /// Clear the fuel selection (no fuel filter).
    pub fn clear_fuels(&mut self) {
        self.widgets.fuel_types.clear();
        self.refilter();
    }
}
