use crate::catalog::{ChangeRequest, Incident};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reply to a free-text query. The backend may opportunistically generate a
/// runbook as a side effect and report it through the `runbook_*` fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueryReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_error: Option<String>,
}

/// A generated artifact (script or document) the backend wrote for us.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub file: String,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend answered and reported a failure of its own.
    #[error("{0}")]
    Backend(String),
    /// The request never completed: connection, IO, or protocol trouble.
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend answered with something we could not decode.
    #[error("malformed backend reply: {0}")]
    Decode(String),
}

/// The console's only door to the agent backend. One outstanding request
/// per call, no retry, no cancellation.
pub trait Gateway {
    fn query(&self, text: &str) -> Result<QueryReply, GatewayError>;
    fn heal(&self, issue_description: &str) -> Result<Artifact, GatewayError>;
    fn generate_heal_script(&self, issue_description: &str) -> Result<Artifact, GatewayError>;
    fn generate_runbook(&self, issue_description: &str) -> Result<Artifact, GatewayError>;
    fn cr_tracker(
        &self,
        incident: &Incident,
        change_requests: &[ChangeRequest],
    ) -> Result<String, GatewayError>;
    fn list_incidents(&self) -> Result<Vec<Incident>, GatewayError>;
    fn list_change_requests(&self) -> Result<Vec<ChangeRequest>, GatewayError>;
}
