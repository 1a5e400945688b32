use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::InputShape;
use crate::data::{export, loader};
use crate::state::{AppState, FilterDim};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    let Some(table) = state.table.clone() else {
        ui.label("No data loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match table.shape {
            InputShape::DateDifference => {
                date_range_section(ui, state);
                ui.separator();
                checkbox_section(ui, state, FilterDim::Vendor, "Vendor");
                if !table.units.is_empty() {
                    checkbox_section(ui, state, FilterDim::Unit, "Unit");
                }
            }
            InputShape::PrecomputedColumns => {
                checkbox_section(ui, state, FilterDim::Period, "Periode");
                checkbox_section(ui, state, FilterDim::Bagian, "Bagian");
            }
        });
}

fn date_range_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Periode Pembayaran");
    let Some((start, end)) = state.criteria.date_range else {
        // A date-shape table with zero surviving rows has no span.
        ui.label("No payment dates available.");
        return;
    };

    let mut start_edit = start;
    let mut end_edit = end;
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        changed |= ui
            .add(DatePickerButton::new(&mut start_edit).id_salt("date_start"))
            .changed();
        ui.label("to");
        changed |= ui
            .add(DatePickerButton::new(&mut end_edit).id_salt("date_end"))
            .changed();
    });
    if changed {
        state.set_date_range(start_edit, end_edit);
    }
}

/// Collapsible checkbox list for one filter dimension, with All/None
/// shortcuts and a selected/total count in the header.
fn checkbox_section(ui: &mut Ui, state: &mut AppState, dim: FilterDim, label: &str) {
    let values = state.dimension_values(dim);
    let n_selected = state.selection(dim).len();
    let header_text = format!("{label}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(label)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(dim);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(dim);
                }
            });

            for val in &values {
                let mut checked = state.selection(dim).contains(val);
                if ui.checkbox(&mut checked, val).changed() {
                    state.toggle_value(dim, val);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.table.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} records loaded, {} shown",
                table.len(),
                state.visible_indices.len()
            ));
            if table.dropped_rows > 0 {
                ui.label(
                    RichText::new(format!("{} rows dropped at load", table.dropped_rows)).weak(),
                );
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs – the fail-soft boundary: every load error becomes a
// status message, never a crash
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open payment-verification data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xls", "csv"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match loader::load_file(&path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} records ({:?} shape) from {}",
                    table.len(),
                    table.shape,
                    path.display()
                );
                state.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}

pub fn export_dialog(state: &mut AppState) {
    let Some(table) = state.table.clone() else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name("data_sla_terfilter.csv")
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match export::write_csv_file(&table, &state.visible_indices, &path) {
            Ok(()) => {
                log::info!(
                    "Exported {} rows to {}",
                    state.visible_indices.len(),
                    path.display()
                );
            }
            Err(e) => {
                log::error!("Failed to export CSV: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
