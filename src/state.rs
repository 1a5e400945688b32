use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::data::aggregate::{self, AggregateResult, Dimension, OverallStats};
use crate::data::filter::{self, FilterCriteria};
use crate::data::model::{InputShape, NormalizedTable};

// ---------------------------------------------------------------------------
// Dashboard – aggregates recomputed on every criteria change
// ---------------------------------------------------------------------------

/// The aggregate sets the central panel renders. Ephemeral: rebuilt by
/// [`AppState::refilter`] and discarded on the next interaction.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub overall: Option<OverallStats>,
    pub by_vendor: AggregateResult,
    pub by_unit: AggregateResult,
    pub trend: AggregateResult,
    pub bagian: AggregateResult,
}

impl Dashboard {
    pub fn compute(
        table: &NormalizedTable,
        indices: &[usize],
        criteria: &FilterCriteria,
    ) -> Self {
        let overall = aggregate::overall(table, indices, &criteria.bagian);
        match table.shape {
            InputShape::DateDifference => Dashboard {
                overall,
                by_vendor: aggregate::by_dimension(table, indices, Dimension::Vendor),
                by_unit: aggregate::by_dimension(table, indices, Dimension::Unit),
                trend: aggregate::weekly_trend(table, indices),
                bagian: AggregateResult::new(),
            },
            InputShape::PrecomputedColumns => Dashboard {
                overall,
                by_vendor: AggregateResult::new(),
                by_unit: AggregateResult::new(),
                trend: AggregateResult::new(),
                bagian: aggregate::bagian_means(table, indices, &criteria.bagian),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which selection-set a UI widget is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDim {
    Vendor,
    Unit,
    Period,
    Bagian,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until the user opens a file). Shared read-only;
    /// never mutated after construction.
    pub table: Option<Arc<NormalizedTable>>,

    /// User-driven filter selections.
    pub criteria: FilterCriteria,

    /// Indices of records passing the current criteria (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates for the current filtered view (cached).
    pub dashboard: Dashboard,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            table: None,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            dashboard: Dashboard::default(),
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a freshly loaded table and reset filters to the defaults
    /// (everything selected).
    pub fn set_table(&mut self, table: Arc<NormalizedTable>) {
        self.criteria = FilterCriteria::all_of(&table);
        self.table = Some(table);
        self.status_message = None;
        self.loading = false;
        self.refilter();
    }

    /// Recompute the filtered view and its aggregates after any criteria
    /// change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            self.visible_indices.clear();
            self.dashboard = Dashboard::default();
            return;
        };
        self.visible_indices = filter::apply(table, &self.criteria);
        self.dashboard = Dashboard::compute(table, &self.visible_indices, &self.criteria);
    }

    /// Current selection set for a dimension.
    pub fn selection(&self, dim: FilterDim) -> &BTreeSet<String> {
        match dim {
            FilterDim::Vendor => &self.criteria.vendors,
            FilterDim::Unit => &self.criteria.units,
            FilterDim::Period => &self.criteria.periods,
            FilterDim::Bagian => &self.criteria.bagian,
        }
    }

    fn selection_mut(&mut self, dim: FilterDim) -> &mut BTreeSet<String> {
        match dim {
            FilterDim::Vendor => &mut self.criteria.vendors,
            FilterDim::Unit => &mut self.criteria.units,
            FilterDim::Period => &mut self.criteria.periods,
            FilterDim::Bagian => &mut self.criteria.bagian,
        }
    }

    /// All values observed in the table for a dimension.
    pub fn dimension_values(&self, dim: FilterDim) -> Vec<String> {
        let Some(table) = &self.table else {
            return Vec::new();
        };
        match dim {
            FilterDim::Vendor => table.vendors.iter().cloned().collect(),
            FilterDim::Unit => table.units.iter().cloned().collect(),
            FilterDim::Period => table.periods.iter().cloned().collect(),
            FilterDim::Bagian => table.bagian_labels(),
        }
    }

    /// Toggle a single value in a dimension's selection set.
    pub fn toggle_value(&mut self, dim: FilterDim, value: &str) {
        let selected = self.selection_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every observed value in a dimension.
    pub fn select_all(&mut self, dim: FilterDim) {
        let values = self.dimension_values(dim);
        let selected = self.selection_mut(dim);
        *selected = values.into_iter().collect();
        self.refilter();
    }

    /// Clear a dimension's selection ("show nothing").
    pub fn select_none(&mut self, dim: FilterDim) {
        self.selection_mut(dim).clear();
        self.refilter();
    }

    /// Update the inclusive payment-date range.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.criteria.date_range = Some((start, end));
        self.refilter();
    }
}
