use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::aggregate::ColourCount;
use crate::pages::OverviewData;
use crate::ui::plot::{category_bars, chart_or_error};

// ---------------------------------------------------------------------------
// Overview page
// ---------------------------------------------------------------------------

pub fn overview_page(ui: &mut Ui, data: &OverviewData, top_n: usize) {
    ui.heading("Car Market Overview");
    ui.label("Average prices, condition split and colour popularity over the cleaned listings.");
    ui.separator();

    match &data.condition {
        Ok(share) => {
            ui.label(format!(
                "{} listings: {} used, {} new. Used vehicles make up {}% of the dataset.",
                share.total, share.used, share.new, share.used_percentage
            ));
        }
        Err(e) => {
            ui.label(format!("Condition split unavailable: {e}"));
        }
    }
    ui.separator();

    let half = ui.available_height() / 2.0;

    ui.strong("Average Car Price by Brand");
    ui.allocate_ui(egui::vec2(ui.available_width(), half), |ui: &mut Ui| {
        chart_or_error(ui, &data.brand_means, |ui, means| {
            let bars: Vec<(String, f64)> =
                means.iter().map(|b| (b.brand.clone(), b.price)).collect();
            category_bars(ui, "brand_mean_price", "Price", &bars);
        });
    });

    ui.strong(format!("Top {top_n} Most Popular Car Colours"));
    chart_or_error(ui, &data.colours, |ui, colours| {
        ui.columns(2, |cols| {
            let bars: Vec<(String, f64)> = colours
                .iter()
                .map(|c| (c.colour.clone(), c.count as f64))
                .collect();
            category_bars(&mut cols[0], "colour_counts", "Count", &bars);
            colour_table(&mut cols[1], colours);
        });
    });
}

fn colour_table(ui: &mut Ui, colours: &[ColourCount]) {
    TableBuilder::new(ui)
        .striped(true)
        .column(TableColumn::auto())
        .column(TableColumn::remainder())
        .header(20.0, |mut header| {
            for name in ColourCount::COLUMNS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for c in colours {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(c.colour.as_str());
                    });
                    row.col(|ui| {
                        ui.label(c.count.to_string());
                    });
                });
            }
        });
}
