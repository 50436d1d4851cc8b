use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub start_date: Option<NaiveDate>,
}

impl Employee {
    pub fn new(id: i64, name: &str, role: &str, start_date: Option<NaiveDate>) -> Self {
        Self {
            id,
            name: name.to_string(),
            role: role.to_string(),
            start_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: i64,
    pub project_name: String,
    pub status: Option<String>,
    /// References `Employee::id`. Declared as a foreign key, not checked on insert.
    pub lead_id: Option<i64>,
}

impl Project {
    pub fn new(project_id: i64, project_name: &str, status: &str, lead_id: i64) -> Self {
        Self {
            project_id,
            project_name: project_name.to_string(),
            status: Some(status.to_string()),
            lead_id: Some(lead_id),
        }
    }
}
