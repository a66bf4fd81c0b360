use serde::Deserialize;
use serde::Serialize;

/// Tunables of the Metrics Builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Bins of the value distribution chart
    pub histogram_bins: usize,
    /// Bins of the histogram shown instead of category totals; Sturges' rule when unset
    pub fallback_histogram_bins: Option<usize>,
    /// Decimal places of formatted KPI values
    pub decimals: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            histogram_bins: 30,
            fallback_histogram_bins: None,
            decimals: 2,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
