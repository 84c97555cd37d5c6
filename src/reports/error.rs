use thiserror::Error;

/// Failure outcomes of a single report dispatch.
///
/// Callers can discriminate between a bad analysis id, user-correctable
/// input problems, and backend failures instead of one generic message.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("unknown report: {0}")]
    UnknownReport(String),

    #[error("invalid report parameters: {0}")]
    InvalidParameter(String),

    #[error("report query failed: {0}")]
    Query(#[from] sqlx::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// A shape violation in an executor-produced table is a backend contract
/// failure, not a user input problem.
impl From<super::table::ColumnLengthMismatch> for ReportError {
    fn from(err: super::table::ColumnLengthMismatch) -> Self {
        ReportError::Query(sqlx::Error::Decode(Box::new(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_report_display() {
        let error = ReportError::UnknownReport("weekly_forecast".to_string());
        assert_eq!(error.to_string(), "unknown report: weekly_forecast");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let error = ReportError::InvalidParameter("start_date after end_date".to_string());
        assert_eq!(
            error.to_string(),
            "invalid report parameters: start_date after end_date"
        );
    }

    #[test]
    fn test_query_error_wraps_sqlx() {
        let error = ReportError::Query(sqlx::Error::PoolTimedOut);
        assert!(error.to_string().starts_with("report query failed:"));
    }

    #[test]
    fn test_query_error_from_sqlx() {
        fn fails() -> ReportResult<()> {
            Err(sqlx::Error::RowNotFound)?
        }
        assert!(matches!(fails(), Err(ReportError::Query(_))));
    }
}
