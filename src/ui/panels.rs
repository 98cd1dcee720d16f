use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::Condition;
use crate::pages::Page;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, page switcher and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for page in Page::ALL {
            ui.selectable_value(&mut state.page, page, page.title());
        }

        ui.separator();

        if let Some(store) = &state.store {
            ui.label(format!(
                "{} listings from {}",
                store.cleaned().len(),
                store.source().display()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filter panel for the trends and comparisons pages.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(price_ceiling) = state.store.as_ref().map(|s| s.price_max()) else {
        ui.label("No dataset loaded.");
        return;
    };

    let mut changed = false;
    let mut clear_fuels = false;
    let mut toggled_fuel: Option<String> = None;
    let step = state.config.price_slider_step;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Fuel type multi-select ----
            let n_selected = state.widgets.fuel_types.len();
            let header = if n_selected == 0 {
                "Fuel type  (all)".to_string()
            } else {
                format!("Fuel type  ({n_selected}/{})", state.fuel_options.len())
            };
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("fuel_types")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        clear_fuels = true;
                    }
                    for fuel in &state.fuel_options {
                        let mut checked = state.widgets.fuel_types.contains(fuel);
                        if ui.checkbox(&mut checked, fuel.as_str()).changed() {
                            toggled_fuel = Some(fuel.clone());
                        }
                    }
                });
            ui.separator();

            // ---- Price range ----
            ui.strong("Price range");
            // Refilter once a drag ends rather than on every dragged frame.
            for (value, label) in [
                (&mut state.widgets.price_min, "min"),
                (&mut state.widgets.price_max, "max"),
            ] {
                let response = ui.add(
                    egui::Slider::new(value, 0.0..=price_ceiling)
                        .step_by(step)
                        .text(label),
                );
                changed |= response.drag_stopped() || (response.changed() && !response.dragged());
            }
            ui.separator();

            // ---- Offer publication date ----
            changed |= ui
                .checkbox(&mut state.widgets.dates_enabled, "Filter by offer date")
                .changed();
            if state.widgets.dates_enabled {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("from");
                    changed |= ui
                        .add(
                            egui_extras::DatePickerButton::new(&mut state.widgets.date_from)
                                .id_salt("offer_from"),
                        )
                        .changed();
                });
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("to");
                    changed |= ui
                        .add(
                            egui_extras::DatePickerButton::new(&mut state.widgets.date_to)
                                .id_salt("offer_to"),
                        )
                        .changed();
                });
            }
        });

    if clear_fuels {
        state.clear_fuels();
    } else if let Some(fuel) = toggled_fuel {
        state.toggle_fuel(&fuel);
    } else if changed {
        state.refilter();
    }
}

/// Combo box for an optional condition; returns true when the choice changed.
pub fn condition_selector(ui: &mut Ui, id: &str, value: &mut Option<Condition>) -> bool {
    let before = *value;
    let label = |c: Option<Condition>| c.map(Condition::as_str).unwrap_or("Any condition");
    egui::ComboBox::from_id_salt(id)
        .selected_text(label(*value))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(value, None, label(None));
            for c in Condition::ALL {
                ui.selectable_value(value, Some(c), c.as_str());
            }
        });
    *value != before
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open car listings")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load(&path);
    }
}
