use eframe::egui::Ui;

use crate::pages::{TrendTab, TrendsData};
use crate::ui::plot::{category_lines, chart_or_error, single_line};

// ---------------------------------------------------------------------------
// Market trends page
// ---------------------------------------------------------------------------

pub fn trends_page(ui: &mut Ui, tab: &mut TrendTab, data: &TrendsData) {
    ui.heading("Market Trends Analysis");
    ui.horizontal(|ui: &mut Ui| {
        for t in TrendTab::ALL {
            ui.selectable_value(tab, t, t.title());
        }
    });
    ui.separator();

    match tab {
        TrendTab::Listings => chart_or_error(ui, &data.listings, |ui, years| {
            let points = years
                .iter()
                .map(|y| [y.year as f64, y.listings as f64])
                .collect();
            single_line(ui, "listings_per_year", "Production year", "Number of listings", points);
        }),
        TrendTab::FuelType => chart_or_error(ui, &data.fuel, |ui, counts| {
            category_lines(ui, "fuel_trends", "Count", counts);
        }),
        TrendTab::Transmission => chart_or_error(ui, &data.transmission, |ui, counts| {
            category_lines(ui, "transmission_trends", "Count", counts);
        }),
    }
}
