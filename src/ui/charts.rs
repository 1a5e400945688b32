use std::ops::RangeInclusive;

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::ColorMap;
use crate::data::aggregate::AggregateResult;
use crate::data::model::InputShape;
use crate::state::AppState;
use crate::ui::table as table_view;

// ---------------------------------------------------------------------------
// Central panel – metrics, charts, and the filtered data table
// ---------------------------------------------------------------------------

/// Render the dashboard in the central panel.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a spreadsheet to build the dashboard  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Statistik SLA");
            match &state.dashboard.overall {
                Some(stats) => {
                    ui.horizontal(|ui: &mut Ui| {
                        metric(ui, "Rata-rata SLA", format!("{:.2} hari", stats.mean));
                        metric(ui, "SLA Tercepat", format!("{:.0} hari", stats.min));
                        metric(ui, "SLA Terlama", format!("{:.0} hari", stats.max));
                    });
                }
                None => {
                    ui.label("No rows match the current filters.");
                }
            }
            ui.separator();

            match table.shape {
                InputShape::DateDifference => {
                    bar_chart(
                        ui,
                        "vendor_chart",
                        "Rata-rata SLA per Vendor",
                        &state.dashboard.by_vendor,
                    );
                    line_chart(
                        ui,
                        "trend_chart",
                        "Tren SLA per Minggu",
                        &state.dashboard.trend,
                    );
                    if !table.units.is_empty() {
                        bar_chart(
                            ui,
                            "unit_chart",
                            "Rata-rata SLA per Unit",
                            &state.dashboard.by_unit,
                        );
                    }
                }
                InputShape::PrecomputedColumns => {
                    bar_chart(
                        ui,
                        "bagian_chart",
                        "Rata-rata SLA per Bagian",
                        &state.dashboard.bagian,
                    );
                }
            }

            ui.separator();
            egui::CollapsingHeader::new("Tabel Data Terfilter")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    table_view::data_table(ui, table, &state.visible_indices);
                });
        });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).strong().size(22.0));
    });
    ui.add_space(28.0);
}

// ---------------------------------------------------------------------------
// Charts – categories on the x axis, mean SLA days on the y axis
// ---------------------------------------------------------------------------

/// Mean-per-category bar chart. Entries without data are skipped; an empty
/// result renders an informational message instead of a chart.
fn bar_chart(ui: &mut Ui, id: &str, title: &str, agg: &AggregateResult) {
    ui.strong(title);
    let entries: Vec<(&String, f64)> = agg
        .iter()
        .filter_map(|(label, stat)| stat.mean.map(|m| (label, m)))
        .collect();
    if entries.is_empty() {
        ui.label("No data for the current filter selection.");
        ui.add_space(8.0);
        return;
    }

    let labels: Vec<String> = entries.iter().map(|(label, _)| (*label).clone()).collect();
    let colors = ColorMap::new(labels.iter());
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, (label, mean))| {
            Bar::new(i as f64, *mean)
                .name(label.as_str())
                .fill(colors.color_for(label))
                .width(0.6)
        })
        .collect();

    Plot::new(id.to_string())
        .height(220.0)
        .legend(Legend::default())
        .y_axis_label("SLA (hari)")
        .allow_scroll(false)
        .x_axis_formatter(category_formatter(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
    ui.add_space(8.0);
}

/// Trend line over chronologically ordered buckets.
fn line_chart(ui: &mut Ui, id: &str, title: &str, agg: &AggregateResult) {
    ui.strong(title);
    let entries: Vec<(&String, f64)> = agg
        .iter()
        .filter_map(|(label, stat)| stat.mean.map(|m| (label, m)))
        .collect();
    if entries.is_empty() {
        ui.label("No data for the current filter selection.");
        ui.add_space(8.0);
        return;
    }

    let labels: Vec<String> = entries.iter().map(|(label, _)| (*label).clone()).collect();
    let line_points: PlotPoints = entries
        .iter()
        .enumerate()
        .map(|(i, (_, mean))| [i as f64, *mean])
        .collect();
    let marker_points: PlotPoints = entries
        .iter()
        .enumerate()
        .map(|(i, (_, mean))| [i as f64, *mean])
        .collect();

    Plot::new(id.to_string())
        .height(220.0)
        .y_axis_label("SLA (hari)")
        .allow_scroll(false)
        .x_axis_formatter(category_formatter(labels))
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(line_points).width(1.5));
            plot_ui.points(Points::new(marker_points).radius(2.5));
        });
    ui.add_space(8.0);
}

/// Axis formatter mapping integer positions back to category labels.
fn category_formatter(
    labels: Vec<String>,
) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String + 'static {
    move |mark, _range| {
        let rounded = mark.value.round();
        if (mark.value - rounded).abs() > 0.05 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }
}
