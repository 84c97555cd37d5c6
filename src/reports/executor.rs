use super::table::{Cell, ReportTable};

/// Ordered, named scalar binds for one query execution.
///
/// Order matches the positional placeholders (`$1`, `$2`, ...) in the
/// query text; names are kept so test doubles can assert what was bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    binds: Vec<(&'static str, Cell)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: Cell) {
        self.binds.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.binds
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Cell)> {
        self.binds.iter().map(|(n, v)| (*n, v))
    }
}

/// The sole seam between report dispatch and the database.
///
/// Implementations own the connection resource and any timeout policy;
/// the dispatcher never opens or closes connections itself.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(&self, sql: &str, params: &QueryParams) -> Result<ReportTable, sqlx::Error>;
}
