use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ReportError;

/// Closed set of analyses the dashboard can request.
///
/// The wire form is snake_case (`top_selling_products`, ...); anything
/// outside the set fails to parse with [`ReportError::UnknownReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisId {
    TopSellingProducts,
    InventoryAnalysis,
    SupplierPerformance,
}

impl AnalysisId {
    pub const ALL: [AnalysisId; 3] = [
        AnalysisId::TopSellingProducts,
        AnalysisId::InventoryAnalysis,
        AnalysisId::SupplierPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisId::TopSellingProducts => "top_selling_products",
            AnalysisId::InventoryAnalysis => "inventory_analysis",
            AnalysisId::SupplierPerformance => "supplier_performance",
        }
    }

    /// Display title shown in the dashboard's analysis selector.
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisId::TopSellingProducts => "Top Selling Products",
            AnalysisId::InventoryAnalysis => "Inventory Analysis",
            AnalysisId::SupplierPerformance => "Supplier Performance",
        }
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisId {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_selling_products" => Ok(AnalysisId::TopSellingProducts),
            "inventory_analysis" => Ok(AnalysisId::InventoryAnalysis),
            "supplier_performance" => Ok(AnalysisId::SupplierPerformance),
            other => Err(ReportError::UnknownReport(other.to_string())),
        }
    }
}
