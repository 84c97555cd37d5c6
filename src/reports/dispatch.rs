use std::time::Instant;

use chrono::NaiveDate;
use opentelemetry::KeyValue;

use crate::telemetry::metrics::{
    REPORT_DISPATCH_DURATION, REPORT_DISPATCH_ERRORS, REPORT_ROWS,
};

use super::error::{ReportError, ReportResult};
use super::executor::{QueryExecutor, QueryParams};
use super::registry::{QueryDefinition, Registry};
use super::table::{Cell, ReportTable};
use super::AnalysisId;

/// Inclusive calendar date range scoping a time-series report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Runs one report: validate, bind, execute, post-process.
///
/// A linear pipeline with no retained state; each stage either passes its
/// output forward or short-circuits with an error. Failed calls are
/// reissued from scratch by the caller, never retried here.
#[tracing::instrument(
    name = "report dispatch",
    skip(registry, executor),
    fields(
        report.analysis = %id,
        report.rows,
        report.duration_ms,
    )
)]
pub async fn run(
    registry: &Registry,
    executor: &dyn QueryExecutor,
    id: AnalysisId,
    range: Option<DateRange>,
) -> ReportResult<ReportTable> {
    let start = Instant::now();

    let result = dispatch(registry, executor, id, range).await;

    let duration = start.elapsed();
    let analysis_attr = KeyValue::new("report.analysis", id.as_str());

    match &result {
        Ok(table) => {
            REPORT_DISPATCH_DURATION
                .record(duration.as_secs_f64(), std::slice::from_ref(&analysis_attr));
            REPORT_ROWS.record(table.row_count() as f64, std::slice::from_ref(&analysis_attr));

            let span = tracing::Span::current();
            span.record("report.rows", table.row_count());
            span.record("report.duration_ms", duration.as_millis() as u64);
        }
        Err(err) => {
            REPORT_DISPATCH_ERRORS.add(
                1,
                &[analysis_attr, KeyValue::new("error.type", error_label(err))],
            );
        }
    }

    result
}

async fn dispatch(
    registry: &Registry,
    executor: &dyn QueryExecutor,
    id: AnalysisId,
    range: Option<DateRange>,
) -> ReportResult<ReportTable> {
    let definition = registry.lookup(id)?;
    let params = bind_params(definition, range)?;

    let table = executor.query(definition.sql, &params).await?;

    match definition.post_process {
        Some(transform) => transform(table),
        None => Ok(table),
    }
}

/// Builds the bind list from the range, restricted to exactly the
/// definition's required parameters. Reports without required parameters
/// ignore any supplied range entirely.
fn bind_params(
    definition: &QueryDefinition,
    range: Option<DateRange>,
) -> ReportResult<QueryParams> {
    let mut params = QueryParams::new();

    if !definition.requires_date_range() {
        return Ok(params);
    }

    let range = range.ok_or_else(|| {
        ReportError::InvalidParameter(
            "start_date and end_date are required for this report".to_string(),
        )
    })?;

    if range.start > range.end {
        return Err(ReportError::InvalidParameter(format!(
            "start_date {} is after end_date {}",
            range.start, range.end
        )));
    }

    for name in definition.required_params {
        let value = match *name {
            "start_date" => Cell::Date(range.start),
            "end_date" => Cell::Date(range.end),
            other => {
                // Registry authoring bug, unreachable for built-in reports.
                return Err(ReportError::InvalidParameter(format!(
                    "report declares unsupported parameter {other}"
                )));
            }
        };
        params.push(name, value);
    }

    Ok(params)
}

fn error_label(err: &ReportError) -> &'static str {
    match err {
        ReportError::UnknownReport(_) => "unknown_report",
        ReportError::InvalidParameter(_) => "invalid_parameter",
        ReportError::Query(_) => "query",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::reports::table::Column;

    struct MockExecutor {
        table: ReportTable,
        fail: bool,
        calls: Mutex<Vec<(String, QueryParams)>>,
    }

    impl MockExecutor {
        fn returning(table: ReportTable) -> Self {
            Self {
                table,
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                table: ReportTable::new(),
                fail: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, QueryParams)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl QueryExecutor for MockExecutor {
        async fn query(
            &self,
            sql: &str,
            params: &QueryParams,
        ) -> Result<ReportTable, sqlx::Error> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.clone()));
            if self.fail {
                Err(sqlx::Error::PoolTimedOut)
            } else {
                Ok(self.table.clone())
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january_2022() -> DateRange {
        DateRange::new(date(2022, 1, 1), date(2022, 1, 31))
    }

    fn revenue_table() -> ReportTable {
        ReportTable::with_columns(vec![
            Column::new(
                "name",
                vec![
                    Cell::Text("Espresso Beans".to_string()),
                    Cell::Text("Green Tea".to_string()),
                    Cell::Text("Sparkling Water".to_string()),
                ],
            ),
            Column::new(
                "total_revenue",
                vec![Cell::Float(500.0), Cell::Float(300.0), Cell::Float(100.0)],
            ),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_reversed_range_fails_before_executor_runs() {
        let registry = Registry::with_builtin_reports();
        let executor = MockExecutor::returning(revenue_table());
        let reversed = DateRange::new(date(2022, 1, 31), date(2022, 1, 1));

        let err = run(
            &registry,
            &executor,
            AnalysisId::TopSellingProducts,
            Some(reversed),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::InvalidParameter(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_range_fails_before_executor_runs() {
        let registry = Registry::with_builtin_reports();
        let executor = MockExecutor::returning(revenue_table());

        let err = run(&registry, &executor, AnalysisId::InventoryAnalysis, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::InvalidParameter(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_supplier_performance_ignores_any_range() {
        let registry = Registry::with_builtin_reports();
        let supplier_rows = ReportTable::with_columns(vec![Column::new(
            "supplier_name",
            vec![Cell::Text("Acme Foods".to_string())],
        )])
        .unwrap();

        let executor = MockExecutor::returning(supplier_rows.clone());
        let reversed = DateRange::new(date(2024, 12, 31), date(2022, 1, 1));

        let with_range = run(
            &registry,
            &executor,
            AnalysisId::SupplierPerformance,
            Some(reversed),
        )
        .await
        .unwrap();
        let without_range = run(&registry, &executor, AnalysisId::SupplierPerformance, None)
            .await
            .unwrap();

        assert_eq!(with_range, without_range);
        for (_, params) in executor.calls() {
            assert!(params.is_empty());
        }
    }

    #[tokio::test]
    async fn test_row_order_is_preserved() {
        let registry = Registry::with_builtin_reports();
        let executor = MockExecutor::returning(revenue_table());

        let table = run(
            &registry,
            &executor,
            AnalysisId::TopSellingProducts,
            Some(january_2022()),
        )
        .await
        .unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.column("total_revenue").unwrap().values,
            vec![Cell::Float(500.0), Cell::Float(300.0), Cell::Float(100.0)]
        );
    }

    #[tokio::test]
    async fn test_binds_exactly_the_required_params() {
        let registry = Registry::with_builtin_reports();
        let executor = MockExecutor::returning(revenue_table());
        let range = january_2022();

        run(
            &registry,
            &executor,
            AnalysisId::TopSellingProducts,
            Some(range),
        )
        .await
        .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        let (sql, params) = &calls[0];
        assert_eq!(
            *sql,
            registry
                .lookup(AnalysisId::TopSellingProducts)
                .unwrap()
                .sql
        );
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("start_date"), Some(&Cell::Date(range.start)));
        assert_eq!(params.get("end_date"), Some(&Cell::Date(range.end)));
    }

    #[tokio::test]
    async fn test_executor_failure_propagates_without_retry() {
        let registry = Registry::with_builtin_reports();
        let executor = MockExecutor::failing();

        let err = run(
            &registry,
            &executor,
            AnalysisId::TopSellingProducts,
            Some(january_2022()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::Query(sqlx::Error::PoolTimedOut)));
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_inventory_analysis_appends_turnover_column() {
        let registry = Registry::with_builtin_reports();
        let inventory_rows = ReportTable::with_columns(vec![
            Column::new(
                "category",
                vec![
                    Cell::Text("Beverages".to_string()),
                    Cell::Text("Snacks".to_string()),
                ],
            ),
            Column::new("total_sales", vec![Cell::Float(120.0), Cell::Float(80.0)]),
            Column::new(
                "avg_safety_stock",
                vec![Cell::Float(40.0), Cell::Float(0.0)],
            ),
        ])
        .unwrap();
        let executor = MockExecutor::returning(inventory_rows);

        let table = run(
            &registry,
            &executor,
            AnalysisId::InventoryAnalysis,
            Some(january_2022()),
        )
        .await
        .unwrap();

        let turnover = &table.column("inventory_turnover").unwrap().values;
        assert_eq!(turnover[0], Cell::Float(3.0));
        match &turnover[1] {
            Cell::Float(v) => assert!(v.is_nan()),
            other => panic!("expected NaN sentinel, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unregistered_report_fails_before_executor_runs() {
        let registry = Registry::default();
        let executor = MockExecutor::returning(revenue_table());

        let err = run(
            &registry,
            &executor,
            AnalysisId::TopSellingProducts,
            Some(january_2022()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::UnknownReport(_)));
        assert!(executor.calls().is_empty());
    }
}
