use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, PlotUi, Points,
};

use crate::color::ColorMap;
use crate::data::aggregate::{CategoryYearCount, PriceSpread};
use crate::data::error::DataResult;
use crate::pages::{Bubble, CategorySeries};

// ---------------------------------------------------------------------------
// Shared chart helpers
// ---------------------------------------------------------------------------

/// Render `result` with `draw`, or the error in place of the chart.
pub fn chart_or_error<T>(ui: &mut Ui, result: &DataResult<T>, draw: impl FnOnce(&mut Ui, &T)) {
    match result {
        Ok(value) => draw(ui, value),
        Err(e) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(format!("Chart unavailable: {e}")).color(Color32::RED));
            });
        }
    }
}

/// Common plot setup; `build` adds the series.
fn show_plot(ui: &mut Ui, id: &str, x_label: &str, y_label: &str, build: impl FnOnce(&mut PlotUi)) {
    Plot::new(id)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, build);
}

/// One bar per category, each named so it shows up in the legend.
pub fn category_bars(ui: &mut Ui, id: &str, y_label: &str, bars: &[(String, f64)]) {
    let colors = ColorMap::new(bars.iter().map(|(name, _)| name));
    show_plot(ui, id, "", y_label, |plot_ui| {
        for (i, (name, value)) in bars.iter().enumerate() {
            let color = colors.color_for(name);
            let bar = Bar::new(i as f64, *value).width(0.7).name(name).fill(color);
            plot_ui.bar_chart(BarChart::new(vec![bar]).name(name).color(color));
        }
    });
}

/// A single line through `(x, y)` points.
pub fn single_line(ui: &mut Ui, id: &str, x_label: &str, y_label: &str, points: Vec<[f64; 2]>) {
    show_plot(ui, id, x_label, y_label, |plot_ui| {
        let points: PlotPoints = points.into();
        plot_ui.line(Line::new(points).name(y_label).color(Color32::LIGHT_BLUE).width(2.0));
    });
}

/// One line per category of a year/category/count table.
pub fn category_lines(ui: &mut Ui, id: &str, y_label: &str, counts: &[CategoryYearCount]) {
    let colors = ColorMap::new(counts.iter().map(|c| &c.category));
    let mut categories: Vec<&str> = counts.iter().map(|c| c.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();

    show_plot(ui, id, "Production year", y_label, |plot_ui| {
        for category in &categories {
            let points: PlotPoints = counts
                .iter()
                .filter(|c| c.category == *category)
                .map(|c| [c.year as f64, c.count as f64])
                .collect();
            plot_ui.line(
                Line::new(points)
                    .name(*category)
                    .color(colors.color_for(category))
                    .width(1.5),
            );
        }
    });
}

/// Scatter with one coloured series per category.
pub fn category_scatter(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    y_label: &str,
    points: &CategorySeries,
) {
    if points.is_empty() {
        ui.label("No listings to plot for the current selection.");
        return;
    }
    let colors = ColorMap::new(points.series.iter().map(|(category, _)| category));

    show_plot(ui, id, x_label, y_label, |plot_ui| {
        for (category, series) in &points.series {
            plot_ui.points(
                Points::new(series.clone())
                    .name(category)
                    .color(colors.color_for(category))
                    .radius(2.0),
            );
        }
    });
}

/// One box per price spread, coloured by the key at `color_key`.
pub fn price_boxes(ui: &mut Ui, id: &str, spreads: &[PriceSpread], color_key: usize) {
    let label = |s: &PriceSpread| s.keys.join(" / ");
    let colors = ColorMap::new(
        spreads
            .iter()
            .map(|s| s.keys.get(color_key).map(String::as_str).unwrap_or("")),
    );

    show_plot(ui, id, "", "Price", |plot_ui| {
        for (i, spread) in spreads.iter().enumerate() {
            let name = label(spread);
            let color_name = spread.keys.get(color_key).map(String::as_str).unwrap_or("");
            let elem = BoxElem::new(
                i as f64,
                BoxSpread::new(spread.min, spread.q1, spread.median, spread.q3, spread.max),
            )
            .name(&name)
            .box_width(0.6);
            plot_ui.box_plot(
                BoxPlot::new(vec![elem])
                    .name(color_name)
                    .color(colors.color_for(color_name)),
            );
        }
    });
}

/// Scatter with a per-point marker size.
pub fn bubble_scatter(ui: &mut Ui, id: &str, x_label: &str, y_label: &str, bubbles: &[Bubble]) {
    let colors = ColorMap::new(bubbles.iter().map(|b| &b.brand));
    show_plot(ui, id, x_label, y_label, |plot_ui| {
        for b in bubbles {
            plot_ui.points(
                Points::new(vec![[b.mileage, b.price]])
                    .name(&b.brand)
                    .color(colors.color_for(&b.brand))
                    .radius((b.size / 5.0).max(1.0) as f32),
            );
        }
    });
}
