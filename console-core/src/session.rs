use crate::catalog::{ChangeRequest, Incident};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Query,
    Heal,
    GenerateHealScript,
    GenerateRunbook,
    CrTracker,
    Rca,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Query => "query",
            ActionKind::Heal => "heal",
            ActionKind::GenerateHealScript => "generate_heal_script",
            ActionKind::GenerateRunbook => "generate_runbook",
            ActionKind::CrTracker => "cr_tracker",
            ActionKind::Rca => "rca",
        };
        f.write_str(label)
    }
}

/// One query (or synthesized detail/analysis) and the text folded back for
/// it. Never mutated once pushed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResponseEntry {
    pub id: u64,
    pub query: String,
    pub response: String,
    pub timestamp: String,
}

/// Audit-trail record, written the moment an action is initiated. A failed
/// backend call does not recant it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionHistoryEntry {
    pub id: u64,
    pub action: ActionKind,
    pub app: Option<String>,
    pub timestamp: String,
    pub user: String,
    pub details: Option<String>,
}

impl ActionHistoryEntry {
    pub fn summary(&self) -> String {
        match self.action {
            ActionKind::Query => format!(
                "Executed query: {}",
                self.details.as_deref().unwrap_or_default()
            ),
            _ => format!(
                "Started {} on {}",
                self.action,
                self.app.as_deref().unwrap_or("-")
            ),
        }
    }
}

/// All console state for one operator session. Memory-only: discarded when
/// the session ends. Mutated exclusively through the orchestrator.
pub struct Session {
    pub operator: String,
    pub incidents: Vec<Incident>,
    pub change_requests: Vec<ChangeRequest>,
    pub active_incident: Option<String>,
    pub input: String,
    pub responses: Vec<QueryResponseEntry>,
    pub history: Vec<ActionHistoryEntry>,
    pub selected_response: Option<String>,
    next_response_id: u64,
    next_action_id: u64,
}

impl Session {
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            incidents: Vec::new(),
            change_requests: Vec::new(),
            active_incident: None,
            input: String::new(),
            responses: Vec::new(),
            history: Vec::new(),
            selected_response: None,
            next_response_id: 1,
            next_action_id: 1,
        }
    }

    pub fn incident(&self, incident_id: &str) -> Option<&Incident> {
        self.incidents
            .iter()
            .find(|incident| incident.incident_id == incident_id)
    }

    /// Prepends a response entry (visible log is newest first).
    pub fn push_response(&mut self, query: String, response: String) {
        let entry = QueryResponseEntry {
            id: self.next_response_id,
            query,
            response,
            timestamp: wall_clock(),
        };
        self.next_response_id += 1;
        self.responses.insert(0, entry);
    }

    /// Prepends an action-history entry, attributed to the session operator.
    pub fn push_action(&mut self, action: ActionKind, app: Option<String>, details: Option<String>) {
        let entry = ActionHistoryEntry {
            id: self.next_action_id,
            action,
            app,
            timestamp: wall_clock(),
            user: self.operator.clone(),
            details,
        };
        self.next_action_id += 1;
        self.history.insert(0, entry);
    }
}

fn wall_clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
