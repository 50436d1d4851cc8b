use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::ports::{QueryMode, QueryResult, SqlDatabase};
use crate::domain::DomainError;

const SAMPLE_ROWS: usize = 3;

/// SQLite connection shared by the structured-data tool for the lifetime of the process.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
    max_rows: usize,
}

impl SqliteDatabase {
    /// Opens an existing database file. A missing file is an error rather than a new empty store.
    pub fn open(path: &Path, max_rows: usize) -> Result<Self, DomainError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DomainError::not_found(format!("database {}: {e}", path.display())))?;

        Ok(Self::from_connection(conn, max_rows))
    }

    fn from_connection(conn: Connection, max_rows: usize) -> Self {
        Self {
            conn: Mutex::new(conn),
            max_rows,
        }
    }

    fn table_names(conn: &Connection) -> Result<Vec<(String, String)>, DomainError> {
        let mut stmt = conn
            .prepare(
                "SELECT name, sql FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(sql_error)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(sql_error)?
            .collect::<Result<Vec<(String, String)>, _>>()
            .map_err(sql_error)?;
        Ok(rows)
    }
}

#[async_trait]
impl SqlDatabase for SqliteDatabase {
    fn dialect(&self) -> &str {
        "sqlite"
    }

    async fn table_info(&self) -> Result<String, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut sections = Vec::new();
        for (name, create_sql) in Self::table_names(&conn)? {
            let sample = run_statement(
                &conn,
                &format!("SELECT * FROM \"{name}\" LIMIT {SAMPLE_ROWS}"),
                QueryMode::ReadOnly,
                SAMPLE_ROWS,
            )?;
            sections.push(format!(
                "{create_sql}\n\n/*\n{SAMPLE_ROWS} rows from {name} table:\n{}\n*/",
                sample.render()
            ));
        }

        Ok(sections.join("\n\n"))
    }

    #[instrument(skip(self), fields(mode = ?mode))]
    async fn run(&self, sql: &str, mode: QueryMode) -> Result<QueryResult, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        run_statement(&conn, sql, mode, self.max_rows)
    }
}

fn run_statement(
    conn: &Connection,
    sql: &str,
    mode: QueryMode,
    max_rows: usize,
) -> Result<QueryResult, DomainError> {
    let mut stmt = conn.prepare(sql).map_err(sql_error)?;

    if mode == QueryMode::ReadOnly && !stmt.readonly() {
        return Err(DomainError::validation(
            "only read-only statements are allowed against this database",
        ));
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    if columns.is_empty() {
        let rows_affected = stmt.execute([]).map_err(sql_error)?;
        debug!(rows_affected, "statement executed");
        return Ok(QueryResult {
            rows_affected,
            ..QueryResult::default()
        });
    }

    let mut rows = stmt.query([]).map_err(sql_error)?;
    let mut result = QueryResult {
        columns,
        ..QueryResult::default()
    };

    while let Some(row) = rows.next().map_err(sql_error)? {
        if result.rows.len() == max_rows {
            result.truncated = true;
            break;
        }
        let mut values = Vec::with_capacity(result.columns.len());
        for i in 0..result.columns.len() {
            values.push(render_value(row.get_ref(i).map_err(sql_error)?));
        }
        result.rows.push(values);
    }

    debug!(rows = result.rows.len(), truncated = result.truncated, "query executed");
    Ok(result)
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

pub(crate) fn sql_error(err: rusqlite::Error) -> DomainError {
    DomainError::external(format!("SQL error: {err}"))
}
