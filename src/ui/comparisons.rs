use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use eframe::egui::{self, Ui};

use crate::data::aggregate::YearRange;
use crate::pages::{Bubble, ComparisonTab};
use crate::state::{AnimationState, AppState};
use crate::ui::panels::condition_selector;
use crate::ui::plot::{bubble_scatter, category_scatter, chart_or_error, price_boxes, single_line};

const FRAME_INTERVAL: Duration = Duration::from_millis(800);

// ---------------------------------------------------------------------------
// Price comparisons page
// ---------------------------------------------------------------------------

pub fn comparisons_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Price Comparisons");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for t in ComparisonTab::ALL {
            ui.selectable_value(&mut state.comparison_tab, t, t.title());
        }
    });
    ui.separator();

    let options = &mut state.comparison_options;
    let changed = match state.comparison_tab {
        ComparisonTab::MileagePrice => {
            condition_selector(ui, "mileage_condition", &mut options.mileage_condition)
        }
        ComparisonTab::Origin => {
            condition_selector(ui, "origin_condition", &mut options.origin_condition)
        }
        ComparisonTab::Deviation => ui
            .checkbox(&mut options.deviation_by_model, "Group by model as well as brand")
            .changed(),
        _ => false,
    };
    if changed {
        state.refilter();
    }

    let Some(data) = &state.comparisons else {
        return;
    };

    match state.comparison_tab {
        ComparisonTab::MileagePrice => chart_or_error(ui, &data.mileage, |ui, points| {
            category_scatter(ui, "mileage_price", "Mileage (km)", "Price", points);
        }),
        ComparisonTab::BrandPrices => chart_or_error(ui, &data.brand_prices, |ui, spreads| {
            price_boxes(ui, "brand_prices", spreads, 1);
        }),
        ComparisonTab::Deviation => chart_or_error(ui, &data.deviation, |ui, points| {
            category_scatter(ui, "price_deviation", "Mileage (km)", "% deviation", points);
        }),
        ComparisonTab::PriceByYear => chart_or_error(ui, &data.price_by_year, |ui, years| {
            let points = years.iter().map(|y| [y.year as f64, y.price]).collect();
            single_line(ui, "price_by_year", "Production year", "Average price", points);
        }),
        ComparisonTab::Origin => chart_or_error(ui, &data.origin, |ui, spreads| {
            price_boxes(ui, "origin_prices", spreads, 0);
        }),
        ComparisonTab::Engine => chart_or_error(ui, &data.engine, |ui, points| {
            category_scatter(ui, "engine", "Displacement (cm3)", "Power (HP)", points);
        }),
        ComparisonTab::Animated => {
            let animation = &mut state.animation;
            chart_or_error(ui, &data.animation, |ui, frames| {
                let years = data.years.as_ref().ok().copied().flatten();
                animated_view(ui, frames, years, animation);
            });
        }
    }
}

/// Used-car mileage/price bubbles for one production year at a time.
fn animated_view(
    ui: &mut Ui,
    frames: &BTreeMap<i32, Vec<Bubble>>,
    years: Option<YearRange>,
    animation: &mut AnimationState,
) {
    let Some(range) = years else {
        ui.label("No listings with a production year in the current selection.");
        return;
    };

    let mut year = animation
        .year
        .unwrap_or(range.min)
        .clamp(range.min, range.max);
    ui.horizontal(|ui: &mut Ui| {
        let label = if animation.playing { "Pause" } else { "Play" };
        if ui.button(label).clicked() {
            animation.playing = !animation.playing;
            animation.last_step = Some(Instant::now());
        }
        ui.add(egui::Slider::new(&mut year, range.min..=range.max).text("Production year"));
    });

    if animation.playing {
        let now = Instant::now();
        let due = animation
            .last_step
            .map_or(true, |t| now.duration_since(t) >= FRAME_INTERVAL);
        if due {
            year = if year >= range.max { range.min } else { year + 1 };
            animation.last_step = Some(now);
        }
        ui.ctx().request_repaint_after(FRAME_INTERVAL);
    }
    animation.year = Some(year);

    let bubbles = frames.get(&year).map(Vec::as_slice).unwrap_or(&[]);
    bubble_scatter(ui, "animated_mileage_price", "Mileage (km)", "Price", bubbles);
}
