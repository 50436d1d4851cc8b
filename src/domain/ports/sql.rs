use crate::domain::errors::DomainError;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Reject any statement that could modify the database.
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub rows_affected: usize,
    pub truncated: bool,
}

impl QueryResult {
    /// Renders the result as a pipe-separated table the model can read.
    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return format!("{} row(s) affected", self.rows_affected);
        }
        if self.rows.is_empty() {
            return format!("{}\n(no rows)", self.columns.join(" | "));
        }

        let mut out = self.columns.join(" | ");
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        if self.truncated {
            out.push_str("\n(more rows omitted)");
        }
        out
    }
}

#[async_trait]
pub trait SqlDatabase: Send + Sync {
    fn dialect(&self) -> &str;

    /// Schema of every table plus a few sample rows.
    async fn table_info(&self) -> Result<String, DomainError>;

    async fn run(&self, sql: &str, mode: QueryMode) -> Result<QueryResult, DomainError>;
}
