use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    P1,
    P2,
    P3,
    Other(String),
}

impl Priority {
    /// Display rank: P1 < P2 < P3, anything else after.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::P1 => 0,
            Priority::P2 => 1,
            Priority::P3 => 2,
            Priority::Other(_) => 3,
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.as_str() {
            "P1" => Priority::P1,
            "P2" => Priority::P2,
            "P3" => Priority::P3,
            _ => Priority::Other(value),
        }
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::P1 => f.write_str("P1"),
            Priority::P2 => f.write_str("P2"),
            Priority::P3 => f.write_str("P3"),
            Priority::Other(label) => f.write_str(label),
        }
    }
}

/// A tracked operational issue, loaded once per session and immutable after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub issue: String,
    pub application_affected: String,
    pub start_date: String,
    pub priority: Priority,
}

/// Opaque change-request record, passed through to the backend verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeRequest(pub serde_json::Value);

/// Stable ordering for the incident list: ascending priority, catalog
/// order within a priority.
pub fn sort_for_display(incidents: &[Incident]) -> Vec<&Incident> {
    let mut ordered: Vec<&Incident> = incidents.iter().collect();
    ordered.sort_by_key(|incident| incident.priority.rank());
    ordered
}

pub fn detail_summary(incident: &Incident) -> String {
    format!(
        "Incident Details:\n\
         - Issue: {}\n\
         - Application Affected: {}\n\
         - Start Date: {}\n\
         - Priority: {}",
        incident.issue,
        incident.application_affected,
        localize_start_date(&incident.start_date),
        incident.priority,
    )
}

fn localize_start_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}
