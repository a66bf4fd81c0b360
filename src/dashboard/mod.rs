//! # Dashboard metrics
//!
//! Column classification, the filter pipeline, KPIs and the four chart
//! aggregates. [`MetricsBuilder::build`] recomputes everything from scratch
//! for each filter selection and never fails.

pub mod charts;
pub mod classifier;
pub mod config;
pub mod filter;
pub mod kpi;
pub mod options;

use crate::dashboard::charts::CategoryChart;
use crate::dashboard::charts::HistogramChart;
use crate::dashboard::charts::ShareChart;
use crate::dashboard::charts::TrendChart;
use crate::dashboard::classifier::ColumnRoles;
use crate::dashboard::config::DashboardConfig;
use crate::dashboard::filter::apply_filters;
use crate::dashboard::filter::FilterSelection;
use crate::dashboard::kpi::Kpi;
use crate::dataset::Table;
use serde::Serialize;
use tracing::debug;

/// KPIs, the filtered rows and the chart aggregates for one selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsResult {
    pub kpis: Vec<Kpi>,
    pub filtered: Table,
    pub trend: TrendChart,
    pub category_totals: CategoryChart,
    pub category_shares: ShareChart,
    pub histogram: HistogramChart,
}

#[derive(Clone, Debug, Default)]
pub struct MetricsBuilder {
    config: DashboardConfig,
}

impl MetricsBuilder {
    pub fn new(config: DashboardConfig) -> Self {
        MetricsBuilder { config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Filters `table` by `selection` and derives KPIs and charts from the
    /// remaining rows. `roles` decides which columns are binned as numbers.
    pub fn build(&self, table: &Table, roles: &ColumnRoles, selection: &FilterSelection) -> MetricsResult {
        let filtered = apply_filters(table, selection);
        debug!(rows = table.row_count(), kept = filtered.rows.len(), "filtered table");

        let kpis = kpi::compute_kpis(table, &filtered, selection, &self.config);
        let trend = charts::trend(&filtered, selection);
        let category_totals = charts::category_totals(&filtered, roles, selection, &self.config);
        let category_shares = charts::category_shares(&filtered, selection);
        let histogram = charts::value_histogram(&filtered, roles, selection, &self.config);
        MetricsResult {
            kpis,
            filtered: filtered.table,
            trend,
            category_totals,
            category_shares,
            histogram,
        }
    }
}
