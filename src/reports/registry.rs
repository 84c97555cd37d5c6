use std::collections::HashMap;

use super::analysis::AnalysisId;
use super::error::{ReportError, ReportResult};
use super::table::ReportTable;
use super::turnover::inventory_turnover;

/// Pure transform appending derived columns to an executed result.
pub type PostProcess = fn(ReportTable) -> ReportResult<ReportTable>;

/// Immutable description of one report: query text, the parameters it
/// needs (in bind order), and an optional post-process transform.
#[derive(Clone, Debug)]
pub struct QueryDefinition {
    pub sql: &'static str,
    pub required_params: &'static [&'static str],
    pub post_process: Option<PostProcess>,
}

impl QueryDefinition {
    pub fn requires_date_range(&self) -> bool {
        !self.required_params.is_empty()
    }
}

pub const DATE_RANGE_PARAMS: &[&str] = &["start_date", "end_date"];

// Aggregates are cast to float8 in SQL so rows decode without a NUMERIC
// codec. Binds are positional and follow required_params order.
const TOP_SELLING_PRODUCTS_SQL: &str = "\
    SELECT s.sku_id, sk.name, sk.category, sk.subcategory, \
           SUM(s.quantity)::float8 AS total_quantity, \
           SUM(s.quantity * s.unit_price)::float8 AS total_revenue \
    FROM sales_data s \
    JOIN skus sk ON s.sku_id = sk.sku_id \
    WHERE s.date BETWEEN $1 AND $2 \
    GROUP BY s.sku_id, sk.name, sk.category, sk.subcategory \
    ORDER BY total_revenue DESC \
    LIMIT 10";

const INVENTORY_ANALYSIS_SQL: &str = "\
    SELECT sk.category, sk.subcategory, \
           ABS(SUM(CASE WHEN i.transaction_type = 'SALE' THEN i.quantity ELSE 0 END))::float8 AS total_sales, \
           AVG(sk.safety_stock)::float8 AS avg_safety_stock \
    FROM inventory_data i \
    JOIN skus sk ON i.sku_id = sk.sku_id \
    WHERE i.date BETWEEN $1 AND $2 \
    GROUP BY sk.category, sk.subcategory";

const SUPPLIER_PERFORMANCE_SQL: &str = "\
    SELECT s.name AS supplier_name, s.country, \
           s.lead_time_reliability::float8 AS lead_time_reliability, \
           s.quality_rating::float8 AS quality_rating, \
           COUNT(DISTINCT pt.sku_id) AS products_supplied \
    FROM suppliers s \
    JOIN pricing_tiers pt ON s.supplier_id = pt.supplier_id \
    GROUP BY s.supplier_id, s.name, s.country, s.lead_time_reliability, s.quality_rating \
    ORDER BY s.quality_rating DESC";

/// Read-only mapping from analysis id to query definition.
///
/// Constructed once at startup and shared behind an `Arc`; never mutated
/// afterwards.
#[derive(Clone, Default)]
pub struct Registry {
    entries: HashMap<AnalysisId, QueryDefinition>,
}

impl Registry {
    pub fn with_builtin_reports() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            AnalysisId::TopSellingProducts,
            QueryDefinition {
                sql: TOP_SELLING_PRODUCTS_SQL,
                required_params: DATE_RANGE_PARAMS,
                post_process: None,
            },
        );
        entries.insert(
            AnalysisId::InventoryAnalysis,
            QueryDefinition {
                sql: INVENTORY_ANALYSIS_SQL,
                required_params: DATE_RANGE_PARAMS,
                post_process: Some(inventory_turnover),
            },
        );
        entries.insert(
            AnalysisId::SupplierPerformance,
            QueryDefinition {
                sql: SUPPLIER_PERFORMANCE_SQL,
                required_params: &[],
                post_process: None,
            },
        );
        Self { entries }
    }

    /// Unreachable for the built-in registry given the closed enum, but
    /// handled defensively rather than panicking.
    pub fn lookup(&self, id: AnalysisId) -> ReportResult<&QueryDefinition> {
        self.entries
            .get(&id)
            .ok_or_else(|| ReportError::UnknownReport(id.to_string()))
    }

    /// Definitions in selector display order.
    pub fn iter(&self) -> impl Iterator<Item = (AnalysisId, &QueryDefinition)> {
        AnalysisId::ALL
            .into_iter()
            .filter_map(|id| self.entries.get(&id).map(|def| (id, def)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_analysis_is_registered() {
        let registry = Registry::with_builtin_reports();
        for id in AnalysisId::ALL {
            assert!(registry.lookup(id).is_ok(), "missing definition for {id}");
        }
    }

    #[test]
    fn test_time_scoped_reports_require_both_dates() {
        let registry = Registry::with_builtin_reports();
        for id in [AnalysisId::TopSellingProducts, AnalysisId::InventoryAnalysis] {
            let def = registry.lookup(id).unwrap();
            assert!(def.requires_date_range());
            assert_eq!(def.required_params, DATE_RANGE_PARAMS);
            assert!(def.sql.contains("$1") && def.sql.contains("$2"));
        }
    }

    #[test]
    fn test_supplier_performance_takes_no_params() {
        let registry = Registry::with_builtin_reports();
        let def = registry.lookup(AnalysisId::SupplierPerformance).unwrap();
        assert!(!def.requires_date_range());
        assert!(def.post_process.is_none());
        assert!(!def.sql.contains('$'));
    }

    #[test]
    fn test_only_inventory_analysis_has_post_process() {
        let registry = Registry::with_builtin_reports();
        assert!(
            registry
                .lookup(AnalysisId::InventoryAnalysis)
                .unwrap()
                .post_process
                .is_some()
        );
        assert!(
            registry
                .lookup(AnalysisId::TopSellingProducts)
                .unwrap()
                .post_process
                .is_none()
        );
    }

    #[test]
    fn test_lookup_on_empty_registry_is_unknown_report() {
        let registry = Registry::default();
        let err = registry.lookup(AnalysisId::TopSellingProducts).unwrap_err();
        assert!(matches!(err, ReportError::UnknownReport(_)));
    }

    #[test]
    fn test_iter_follows_selector_order() {
        let registry = Registry::with_builtin_reports();
        let ids: Vec<AnalysisId> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, AnalysisId::ALL);
    }
}
