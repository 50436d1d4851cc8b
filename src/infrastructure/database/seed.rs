//! One-shot fixture loader for the company database.
//!
//! Schema creation is idempotent, the inserts are not: running against an already
//! populated file fails on the fixed primary keys and leaves the file unchanged.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

use super::sqlite::sql_error;
use crate::domain::{DomainError, Employee, Project};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    start_date TEXT
);

CREATE TABLE IF NOT EXISTS projects (
    project_id INTEGER PRIMARY KEY,
    project_name TEXT NOT NULL,
    status TEXT,
    lead_id INTEGER,
    FOREIGN KEY (lead_id) REFERENCES employees (id)
);
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    pub employees: usize,
    pub projects: usize,
}

pub fn employees() -> Vec<Employee> {
    vec![
        Employee::new(1, "Alice", "Data Scientist", NaiveDate::from_ymd_opt(2022, 8, 1)),
        Employee::new(2, "Bob", "AI Engineer", NaiveDate::from_ymd_opt(2021, 10, 15)),
        Employee::new(3, "Charlie", "Project Manager", NaiveDate::from_ymd_opt(2023, 1, 20)),
    ]
}

pub fn projects() -> Vec<Project> {
    vec![
        Project::new(101, "AI Agent Alpha", "In Progress", 2),
        Project::new(102, "Data Analytics Dashboard", "Completed", 1),
        Project::new(103, "Real-time Search Integration", "Planning", 2),
    ]
}

/// Creates the schema at `path` and inserts the fixed employees and projects.
pub fn bootstrap(path: &Path) -> Result<BootstrapReport, DomainError> {
    let mut conn = Connection::open(path).map_err(sql_error)?;
    conn.execute_batch(SCHEMA).map_err(sql_error)?;

    let employees = employees();
    let projects = projects();

    let tx = conn.transaction().map_err(sql_error)?;
    for e in &employees {
        tx.execute(
            "INSERT INTO employees (id, name, role, start_date) VALUES (?1, ?2, ?3, ?4)",
            params![
                e.id,
                e.name,
                e.role,
                e.start_date.map(|d| d.format("%Y-%m-%d").to_string())
            ],
        )
        .map_err(sql_error)?;
    }
    for p in &projects {
        tx.execute(
            "INSERT INTO projects (project_id, project_name, status, lead_id) VALUES (?1, ?2, ?3, ?4)",
            params![p.project_id, p.project_name, p.status, p.lead_id],
        )
        .map_err(sql_error)?;
    }
    tx.commit().map_err(sql_error)?;

    let report = BootstrapReport {
        employees: employees.len(),
        projects: projects.len(),
    };
    info!(path = %path.display(), employees = report.employees, projects = report.projects, "database populated");
    Ok(report)
}
