use eframe::egui;

use crate::pages::Page;
use crate::state::AppState;
use crate::ui::{comparisons, overview, panels, trends};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CarDashboardApp {
    pub state: AppState,
}

impl CarDashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for CarDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        if self.state.page.uses_filters() {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: current page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.store.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label("Open a car listings file with File → Open…");
                });
                return;
            }

            let state = &mut self.state;
            match state.page {
                Page::Overview => {
                    if let Some(data) = &state.overview {
                        overview::overview_page(ui, data, state.config.top_n);
                    }
                }
                Page::Trends => {
                    if let Some(data) = &state.trends {
                        trends::trends_page(ui, &mut state.trend_tab, data);
                    }
                }
                Page::Comparisons => comparisons::comparisons_page(ui, state),
            }
        });
    }
}
