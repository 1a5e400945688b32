use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::export;
use crate::data::model::NormalizedTable;

// ---------------------------------------------------------------------------
// Filtered data table
// ---------------------------------------------------------------------------

/// Render the filtered records. Columns mirror the CSV export exactly, so
/// what the user sees is what the export writes.
pub fn data_table(ui: &mut Ui, table: &NormalizedTable, indices: &[usize]) {
    if indices.is_empty() {
        ui.label("No rows to display.");
        return;
    }

    let header = export::header_row(table);

    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().resizable(true), header.len())
        .vscroll(true)
        .max_scroll_height(320.0)
        .header(20.0, |mut header_row| {
            for name in &header {
                header_row.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, indices.len(), |mut row| {
                let rec = &table.records[indices[row.index()]];
                for cell in export::row_values(table, rec) {
                    row.col(|ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
