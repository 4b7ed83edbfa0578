use crate::catalog::{ChangeRequest, Incident, Priority};
use crate::gateway::{Artifact, Gateway, GatewayError, QueryReply};

/// Offline stand-in for the agent backend: canned diagnostics keyed on
/// query keywords, fixed artifacts, and a built-in sample catalog. Selected
/// by configuration instead of the live HTTP gateway.
pub struct CannedGateway;

const CANNED_RESPONSES: &[(&str, &str)] = &[
    (
        "memory",
        "Current memory usage is at 78% with 3.2GB available. No memory leaks detected in the last 24 hours.",
    ),
    (
        "cpu",
        "CPU utilization at 45% with occasional spikes to 82% during peak traffic hours (14:00-16:00).",
    ),
    (
        "network",
        "Network throughput stable at 1.2Gbps. No packet loss detected on primary interfaces.",
    ),
    (
        "errors",
        "12 error events logged in the last hour. Most common: 'Connection timeout' (8 occurrences).",
    ),
    (
        "status",
        "The application is currently in a warning state with 4 instances running.",
    ),
    (
        "heal",
        "Initiated healing process. Memory optimization in progress.",
    ),
    (
        "rca",
        "Root Cause Analysis: Identified potential memory leak in worker threads.",
    ),
    (
        "pod",
        "The pod is killed due to Out Of Memory (OOM) errors in namespace ai_np, meaning the node doesn't have enough resources to run the pod",
    ),
];

const HELP_RESPONSE: &str = "Available commands: check memory, check cpu, check network, check errors, check status, heal application, run rca";

const FALLBACK_RESPONSE: &str =
    "Query processed. No specific information available for this request.";

pub fn canned_response(query: &str) -> &'static str {
    let lower = query.to_lowercase();

    let mut response = FALLBACK_RESPONSE;
    for &(keyword, text) in CANNED_RESPONSES {
        if lower.contains(keyword) {
            response = text;
            break;
        }
    }

    // "help" wins over any keyword hit.
    if lower.contains("help") {
        response = HELP_RESPONSE;
    }

    response
}

pub fn sample_incidents() -> Vec<Incident> {
    vec![
        Incident {
            incident_id: "INC-2041".into(),
            issue: "Checkout API returning 5xx for 12% of requests".into(),
            application_affected: "checkout-api".into(),
            start_date: "2025-03-01T08:14:00Z".into(),
            priority: Priority::P2,
        },
        Incident {
            incident_id: "INC-2042".into(),
            issue: "Payment workers crashlooping after 14:00 deploy".into(),
            application_affected: "payments-worker".into(),
            start_date: "2025-03-01T14:07:00Z".into(),
            priority: Priority::P1,
        },
        Incident {
            incident_id: "INC-2043".into(),
            issue: "Search index lag above 30 minutes".into(),
            application_affected: "search-indexer".into(),
            start_date: "2025-02-28T22:41:00Z".into(),
            priority: Priority::P3,
        },
        Incident {
            incident_id: "INC-2044".into(),
            issue: "Pod OOM-killed in namespace ai_np".into(),
            application_affected: "inference-serving".into(),
            start_date: "2025-03-01T11:52:00Z".into(),
            priority: Priority::P1,
        },
    ]
}

pub fn sample_change_requests() -> Vec<ChangeRequest> {
    vec![
        ChangeRequest(serde_json::json!({
            "cr_id": "CR-7781",
            "summary": "Bump payments-worker JVM heap from 2G to 3G",
            "application": "payments-worker",
            "scheduled": "2025-03-01T13:30:00Z",
            "status": "implemented"
        })),
        ChangeRequest(serde_json::json!({
            "cr_id": "CR-7790",
            "summary": "Rotate TLS certificates for checkout-api ingress",
            "application": "checkout-api",
            "scheduled": "2025-03-02T02:00:00Z",
            "status": "pending"
        })),
        ChangeRequest(serde_json::json!({
            "cr_id": "CR-7802",
            "summary": "Reindex search cluster onto new node pool",
            "application": "search-indexer",
            "scheduled": "2025-02-28T21:00:00Z",
            "status": "implemented"
        })),
    ]
}

impl Gateway for CannedGateway {
    fn query(&self, text: &str) -> Result<QueryReply, GatewayError> {
        Ok(QueryReply {
            response: canned_response(text).to_string(),
            ..QueryReply::default()
        })
    }

    fn heal(&self, _issue_description: &str) -> Result<Artifact, GatewayError> {
        Ok(Artifact {
            file: "heal_script.sh".into(),
            path: "/tmp/sre-console/heal_script.sh".into(),
        })
    }

    fn generate_heal_script(&self, _issue_description: &str) -> Result<Artifact, GatewayError> {
        Ok(Artifact {
            file: "heal_script.sh".into(),
            path: "/tmp/sre-console/heal_script.sh".into(),
        })
    }

    fn generate_runbook(&self, _issue_description: &str) -> Result<Artifact, GatewayError> {
        Ok(Artifact {
            file: "runbook.md".into(),
            path: "/tmp/sre-console/runbook.md".into(),
        })
    }

    fn cr_tracker(
        &self,
        incident: &Incident,
        change_requests: &[ChangeRequest],
    ) -> Result<String, GatewayError> {
        Ok(format!(
            "Impact analysis for {}: reviewed {} change request(s); the most recent implemented change against {} is the likely trigger.",
            incident.incident_id,
            change_requests.len(),
            incident.application_affected,
        ))
    }

    fn list_incidents(&self) -> Result<Vec<Incident>, GatewayError> {
        Ok(sample_incidents())
    }

    fn list_change_requests(&self) -> Result<Vec<ChangeRequest>, GatewayError> {
        Ok(sample_change_requests())
    }
}
