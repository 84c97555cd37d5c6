use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{Column as _, PgPool, Row, TypeInfo};

use crate::reports::{Cell, Column, QueryExecutor, QueryParams, ReportTable};

/// Postgres-backed [`QueryExecutor`].
///
/// Owns the pool handle; timeout policy lives in the pool configuration,
/// not in report dispatch.
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    #[tracing::instrument(
        name = "db.report.query",
        skip(self, sql, params),
        fields(bind_count = params.len(), row_count)
    )]
    async fn query(&self, sql: &str, params: &QueryParams) -> Result<ReportTable, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for (_, value) in params.iter() {
            query = match value {
                Cell::Text(v) => query.bind(v.clone()),
                Cell::Int(v) => query.bind(*v),
                Cell::Float(v) => query.bind(*v),
                Cell::Date(v) => query.bind(*v),
                Cell::Null => query.bind(None::<String>),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        let table = decode_rows(&rows)?;

        tracing::Span::current().record("row_count", table.row_count());

        Ok(table)
    }
}

fn decode_rows(rows: &[PgRow]) -> Result<ReportTable, sqlx::Error> {
    // Column metadata comes from the rows themselves, so an empty result
    // set decodes to an empty table.
    let Some(first) = rows.first() else {
        return Ok(ReportTable::new());
    };

    let mut columns: Vec<Column> = first
        .columns()
        .iter()
        .map(|c| Column::new(c.name(), Vec::with_capacity(rows.len())))
        .collect();

    for row in rows {
        for (idx, column) in columns.iter_mut().enumerate() {
            column.values.push(decode_cell(row, idx)?);
        }
    }

    ReportTable::with_columns(columns).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn decode_cell(row: &PgRow, idx: usize) -> Result<Cell, sqlx::Error> {
    let type_name = row.column(idx).type_info().name();
    let cell = match type_name {
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)?
            .map(|v| Cell::Int(i64::from(v))),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| Cell::Int(i64::from(v))),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| Cell::Int(i64::from(v))),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Cell::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| Cell::Float(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Cell::Float),
        "DATE" => row.try_get::<Option<NaiveDate>, _>(idx)?.map(Cell::Date),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.map(Cell::Text)
        }
        // Report SQL casts aggregates to float8; anything else falls back
        // to a string decode and surfaces the driver error if that fails.
        _ => row.try_get::<Option<String>, _>(idx)?.map(Cell::Text),
    };
    Ok(cell.unwrap_or(Cell::Null))
}
