use super::error::{ReportError, ReportResult};
use super::table::{Cell, Column, ReportTable};

pub const TURNOVER_COLUMN: &str = "inventory_turnover";

const NUMERATOR: &str = "total_sales";
const DIVISOR: &str = "avg_safety_stock";

/// Appends the derived `inventory_turnover` column
/// (`total_sales / avg_safety_stock`, elementwise).
///
/// A zero divisor yields the NaN sentinel instead of failing the whole
/// report; SQL NULL in either operand yields NULL. Reapplying the
/// transform replaces the derived column with identical values, since it
/// reads only the two source columns.
pub fn inventory_turnover(mut table: ReportTable) -> ReportResult<ReportTable> {
    let sales = numeric_column(&table, NUMERATOR)?;
    let stock = numeric_column(&table, DIVISOR)?;

    let values: Vec<Cell> = sales
        .into_iter()
        .zip(stock)
        .map(|pair| match pair {
            (Some(_), Some(stocked)) if stocked == 0.0 => Cell::Float(f64::NAN),
            (Some(sold), Some(stocked)) => Cell::Float(sold / stocked),
            _ => Cell::Null,
        })
        .collect();

    table.set_column(Column::new(TURNOVER_COLUMN, values))?;
    Ok(table)
}

/// Reads a column as per-row `Option<f64>` (NULL maps to None).
fn numeric_column(table: &ReportTable, name: &str) -> ReportResult<Vec<Option<f64>>> {
    let column = table
        .column(name)
        .ok_or_else(|| ReportError::Query(sqlx::Error::ColumnNotFound(name.to_string())))?;

    column
        .values
        .iter()
        .map(|cell| {
            if cell.is_null() {
                Ok(None)
            } else {
                cell.as_f64().map(Some).ok_or_else(|| {
                    ReportError::Query(sqlx::Error::Decode(
                        format!("column {name} holds a non-numeric value").into(),
                    ))
                })
            }
        })
        .collect()
}
