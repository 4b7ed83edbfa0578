use crate::catalog::{self, ChangeRequest, Incident};
use crate::gateway::{Artifact, Gateway, GatewayError, QueryReply};
use crate::reporter::Reporter;
use crate::session::{ActionKind, Session};
use thiserror::Error;

/// Validation failures: rejected before any gateway call, with no history
/// entry written.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("no response selected for {0}")]
    NoSelectedResponse(ActionKind),
    #[error("no incident selected; select an incident first")]
    NoActiveIncident,
    #[error("incident {0} not found in catalog")]
    UnknownIncident(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemediationKind {
    Heal,
    HealScript,
    Runbook,
    Rca,
}

impl RemediationKind {
    pub fn action(self) -> ActionKind {
        match self {
            RemediationKind::Heal => ActionKind::Heal,
            RemediationKind::HealScript => ActionKind::GenerateHealScript,
            RemediationKind::Runbook => ActionKind::GenerateRunbook,
            RemediationKind::Rca => ActionKind::Rca,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RemediationKind::Heal => "Heal",
            RemediationKind::HealScript => "Heal script generation",
            RemediationKind::Runbook => "Runbook generation",
            RemediationKind::Rca => "Root cause analysis",
        }
    }

    fn dispatch(self, gateway: &dyn Gateway, issue: &str) -> Result<Artifact, GatewayError> {
        match self {
            // RCA has no route of its own; it is a remediation request
            // over the selected context.
            RemediationKind::Heal | RemediationKind::Rca => gateway.heal(issue),
            RemediationKind::HealScript => gateway.generate_heal_script(issue),
            RemediationKind::Runbook => gateway.generate_runbook(issue),
        }
    }
}

/// In-flight operations. Holding one of these is the
/// awaiting-gateway-response state for its kind; dropping it without a
/// `complete_*` call abandons the operation (the initiation-time history
/// entry stays, matching the audit-trail contract).
pub struct PendingQuery {
    pub text: String,
}

pub struct PendingRemediation {
    pub kind: RemediationKind,
    pub issue_description: String,
}

pub struct PendingCrAnalysis {
    pub incident: Incident,
    pub change_requests: Vec<ChangeRequest>,
}

/// One-shot catalog fetch at session start. Either failure leaves that
/// list empty and is reported as a diagnostic; the console still starts.
pub fn load_catalog(session: &mut Session, gateway: &dyn Gateway, reporter: &dyn Reporter) {
    match gateway.list_incidents() {
        Ok(incidents) => session.incidents = incidents,
        Err(err) => reporter.diagnostic(&format!("failed to load incidents: {err}")),
    }
    match gateway.list_change_requests() {
        Ok(change_requests) => session.change_requests = change_requests,
        Err(err) => reporter.diagnostic(&format!("failed to load change requests: {err}")),
    }
}

/// Focuses an incident: synthesizes its detail summary into the response
/// log and makes that summary the selected response.
pub fn select_incident(session: &mut Session, incident_id: &str) -> Result<(), ConsoleError> {
    let Some(incident) = session.incident(incident_id).cloned() else {
        return Err(ConsoleError::UnknownIncident(incident_id.to_string()));
    };

    let details = catalog::detail_summary(&incident);
    session.active_incident = Some(incident.incident_id.clone());
    session.selected_response = Some(details.clone());
    session.push_response(format!("Incident Selected: {}", incident.incident_id), details);
    Ok(())
}

/// Initiates a query: rejects blank text, clears the input buffer, and
/// writes the audit entry before any network activity.
pub fn begin_query(session: &mut Session, text: &str) -> Result<PendingQuery, ConsoleError> {
    if text.trim().is_empty() {
        return Err(ConsoleError::EmptyQuery);
    }

    session.input.clear();
    let text = text.to_string();
    session.push_action(ActionKind::Query, None, Some(text.clone()));
    Ok(PendingQuery { text })
}

/// Folds a query result back into the session. Failures are alerted and
/// leave the response log untouched; the input buffer is not restored.
pub fn complete_query(
    session: &mut Session,
    pending: PendingQuery,
    result: Result<QueryReply, GatewayError>,
    reporter: &dyn Reporter,
) {
    match result {
        Ok(reply) => {
            match reply.runbook_status.as_deref() {
                Some("success") => {
                    if let Some(path) = reply.runbook_path.as_deref() {
                        reporter.diagnostic(&format!("query runbook generated at {path}"));
                    }
                }
                Some(_) => {
                    let cause = reply.runbook_error.as_deref().unwrap_or("unknown error");
                    reporter.diagnostic(&format!("query runbook generation failed: {cause}"));
                }
                None => {}
            }

            session.selected_response = Some(reply.response.clone());
            session.push_response(pending.text, reply.response);
        }
        Err(err) => reporter.alert(&format!("Query failed: {err}")),
    }
}

pub fn submit_query(
    session: &mut Session,
    gateway: &dyn Gateway,
    reporter: &dyn Reporter,
    text: &str,
) -> Result<(), ConsoleError> {
    let pending = begin_query(session, text)?;
    let result = gateway.query(&pending.text);
    complete_query(session, pending, result, reporter);
    Ok(())
}

/// Initiates heal / heal-script / runbook / rca. The issue description is
/// captured here and threaded through the pending token, so a completion
/// always acts on the text the operator saw when they clicked.
pub fn begin_remediation(
    session: &mut Session,
    kind: RemediationKind,
) -> Result<PendingRemediation, ConsoleError> {
    let Some(issue_description) = session.selected_response.clone() else {
        return Err(ConsoleError::NoSelectedResponse(kind.action()));
    };

    let app = session.active_incident.clone();
    session.push_action(kind.action(), app, None);
    Ok(PendingRemediation {
        kind,
        issue_description,
    })
}

/// Remediation outcomes only reach the operator channel; neither log gains
/// a response entry.
pub fn complete_remediation(
    pending: &PendingRemediation,
    result: Result<Artifact, GatewayError>,
    reporter: &dyn Reporter,
) {
    match result {
        Ok(artifact) => reporter.alert(&format!(
            "{} succeeded\nFile: {}\nPath: {}",
            pending.kind.label(),
            artifact.file,
            artifact.path,
        )),
        Err(err) => reporter.alert(&format!("{} failed: {err}", pending.kind.label())),
    }
}

pub fn run_remediation(
    session: &mut Session,
    gateway: &dyn Gateway,
    reporter: &dyn Reporter,
    kind: RemediationKind,
) -> Result<(), ConsoleError> {
    let pending = begin_remediation(session, kind)?;
    let result = pending.kind.dispatch(gateway, &pending.issue_description);
    complete_remediation(&pending, result, reporter);
    Ok(())
}

/// Initiates change-request impact analysis for the focused incident. The
/// incident record and the CR list ride in the pending token.
pub fn begin_cr_analysis(session: &mut Session) -> Result<PendingCrAnalysis, ConsoleError> {
    let Some(incident_id) = session.active_incident.clone() else {
        return Err(ConsoleError::NoActiveIncident);
    };
    let Some(incident) = session.incident(&incident_id).cloned() else {
        return Err(ConsoleError::UnknownIncident(incident_id));
    };

    session.push_action(ActionKind::CrTracker, Some(incident_id), None);
    Ok(PendingCrAnalysis {
        incident,
        change_requests: session.change_requests.clone(),
    })
}

/// The analysis text lands in the response log under a synthesized query
/// title. It does not overwrite the selected response.
pub fn complete_cr_analysis(
    session: &mut Session,
    pending: PendingCrAnalysis,
    result: Result<String, GatewayError>,
    reporter: &dyn Reporter,
) {
    match result {
        Ok(impact_analysis) => {
            session.push_response(
                format!(
                    "CR Tracker Analysis for Incident: {}",
                    pending.incident.incident_id
                ),
                impact_analysis,
            );
        }
        Err(err) => reporter.alert(&format!("Change request analysis failed: {err}")),
    }
}

pub fn run_cr_analysis(
    session: &mut Session,
    gateway: &dyn Gateway,
    reporter: &dyn Reporter,
) -> Result<(), ConsoleError> {
    let pending = begin_cr_analysis(session)?;
    let result = gateway.cr_tracker(&pending.incident, &pending.change_requests);
    complete_cr_analysis(session, pending, result, reporter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Priority;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubGateway {
        calls: Mutex<Vec<&'static str>>,
        query_error: Option<String>,
        artifact_error: Option<String>,
        cr_error: Option<String>,
        catalog_unavailable: bool,
    }

    impl StubGateway {
        fn record(&self, name: &'static str) {
            self.calls.lock().expect("lock").push(name);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().expect("lock").clone()
        }

        fn artifact(&self) -> Result<Artifact, GatewayError> {
            match &self.artifact_error {
                Some(message) => Err(GatewayError::Backend(message.clone())),
                None => Ok(Artifact {
                    file: "runbook.md".into(),
                    path: "/srv/agent/runbook.md".into(),
                }),
            }
        }
    }

    impl Gateway for StubGateway {
        fn query(&self, text: &str) -> Result<QueryReply, GatewayError> {
            self.record("query");
            match &self.query_error {
                Some(message) => Err(GatewayError::Backend(message.clone())),
                None => Ok(QueryReply {
                    response: format!("response to {text}"),
                    ..QueryReply::default()
                }),
            }
        }

        fn heal(&self, _issue_description: &str) -> Result<Artifact, GatewayError> {
            self.record("heal");
            self.artifact()
        }

        fn generate_heal_script(&self, _issue_description: &str) -> Result<Artifact, GatewayError> {
            self.record("generate_heal_script");
            self.artifact()
        }

        fn generate_runbook(&self, _issue_description: &str) -> Result<Artifact, GatewayError> {
            self.record("generate_runbook");
            self.artifact()
        }

        fn cr_tracker(
            &self,
            incident: &Incident,
            change_requests: &[ChangeRequest],
        ) -> Result<String, GatewayError> {
            self.record("cr_tracker");
            match &self.cr_error {
                Some(message) => Err(GatewayError::Backend(message.clone())),
                None => Ok(format!(
                    "impact for {} across {} CRs",
                    incident.incident_id,
                    change_requests.len()
                )),
            }
        }

        fn list_incidents(&self) -> Result<Vec<Incident>, GatewayError> {
            self.record("list_incidents");
            if self.catalog_unavailable {
                return Err(GatewayError::Transport("connection refused".into()));
            }
            Ok(vec![test_incident("INC-1"), test_incident("INC-2")])
        }

        fn list_change_requests(&self) -> Result<Vec<ChangeRequest>, GatewayError> {
            self.record("list_change_requests");
            if self.catalog_unavailable {
                return Err(GatewayError::Transport("connection refused".into()));
            }
            Ok(vec![ChangeRequest(serde_json::json!({"cr_id": "CR-9"}))])
        }
    }

    #[derive(Default)]
    struct CaptureReporter {
        alerts: Mutex<Vec<String>>,
        diagnostics: Mutex<Vec<String>>,
    }

    impl CaptureReporter {
        fn alerts(&self) -> Vec<String> {
            self.alerts.lock().expect("lock").clone()
        }

        fn diagnostics(&self) -> Vec<String> {
            self.diagnostics.lock().expect("lock").clone()
        }
    }

    impl Reporter for CaptureReporter {
        fn alert(&self, message: &str) {
            self.alerts.lock().expect("lock").push(message.to_string());
        }

        fn diagnostic(&self, message: &str) {
            self.diagnostics
                .lock()
                .expect("lock")
                .push(message.to_string());
        }
    }

    fn test_incident(id: &str) -> Incident {
        Incident {
            incident_id: id.into(),
            issue: "payments workers crashlooping".into(),
            application_affected: "payments-worker".into(),
            start_date: "2025-03-01T14:07:00Z".into(),
            priority: Priority::P1,
        }
    }

    fn session_with_catalog() -> Session {
        let mut session = Session::new("SRE Admin");
        session.incidents = vec![test_incident("INC-1"), test_incident("INC-2")];
        session
    }

    #[test]
    fn successful_query_grows_both_logs_by_one() {
        let mut session = Session::new("SRE Admin");
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        submit_query(&mut session, &gateway, &reporter, "check memory").expect("submit");
        submit_query(&mut session, &gateway, &reporter, "check cpu").expect("submit");

        assert_eq!(session.responses.len(), 2);
        assert_eq!(session.history.len(), 2);
        assert!(session.responses[0].id > session.responses[1].id);
        assert_eq!(session.responses[0].query, "check cpu");
        assert_eq!(
            session.selected_response.as_deref(),
            Some("response to check cpu")
        );
        assert!(reporter.alerts().is_empty());
    }

    #[test]
    fn blank_queries_touch_nothing() {
        let mut session = Session::new("SRE Admin");
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        assert_eq!(
            submit_query(&mut session, &gateway, &reporter, ""),
            Err(ConsoleError::EmptyQuery)
        );
        assert_eq!(
            submit_query(&mut session, &gateway, &reporter, "   "),
            Err(ConsoleError::EmptyQuery)
        );

        assert!(session.responses.is_empty());
        assert!(session.history.is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn failed_query_keeps_the_attempt_but_not_a_response() {
        let mut session = Session::new("SRE Admin");
        session.input = "check memory".into();
        let gateway = StubGateway {
            query_error: Some("backend unavailable".into()),
            ..StubGateway::default()
        };
        let reporter = CaptureReporter::default();

        submit_query(&mut session, &gateway, &reporter, "check memory").expect("submit");

        assert!(session.responses.is_empty());
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].action, ActionKind::Query);
        assert!(session.selected_response.is_none());
        assert!(session.input.is_empty());
        assert!(reporter.alerts()[0].contains("backend unavailable"));
    }

    #[test]
    fn selecting_an_unknown_incident_changes_nothing() {
        let mut session = session_with_catalog();

        let result = select_incident(&mut session, "INC-404");

        assert_eq!(result, Err(ConsoleError::UnknownIncident("INC-404".into())));
        assert!(session.active_incident.is_none());
        assert!(session.selected_response.is_none());
        assert!(session.responses.is_empty());
    }

    #[test]
    fn selecting_an_incident_synthesizes_its_detail_entry() {
        let mut session = session_with_catalog();

        select_incident(&mut session, "INC-1").expect("select");

        assert_eq!(session.active_incident.as_deref(), Some("INC-1"));
        assert_eq!(session.responses.len(), 1);
        let entry = &session.responses[0];
        assert_eq!(entry.query, "Incident Selected: INC-1");
        assert!(entry.response.contains("payments workers crashlooping"));
        assert!(entry.response.contains("payments-worker"));
        assert!(entry.response.contains("P1"));
        assert_eq!(session.selected_response.as_deref(), Some(entry.response.as_str()));
        assert!(session.history.is_empty());
    }

    #[test]
    fn remediation_without_a_selected_response_makes_no_calls() {
        let mut session = session_with_catalog();
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        let result = run_remediation(&mut session, &gateway, &reporter, RemediationKind::Heal);

        assert_eq!(
            result,
            Err(ConsoleError::NoSelectedResponse(ActionKind::Heal))
        );
        assert!(gateway.calls().is_empty());
        assert!(session.history.is_empty());
    }

    #[test]
    fn heal_backend_errors_reach_the_operator_verbatim() {
        let mut session = session_with_catalog();
        select_incident(&mut session, "INC-1").expect("select");
        let gateway = StubGateway {
            artifact_error: Some("disk full".into()),
            ..StubGateway::default()
        };
        let reporter = CaptureReporter::default();

        run_remediation(&mut session, &gateway, &reporter, RemediationKind::Heal)
            .expect("run heal");

        let alert = &reporter.alerts()[0];
        assert!(alert.contains("disk full"));
        assert!(!alert.contains("Path:"));
        assert_eq!(session.history[0].action, ActionKind::Heal);
        assert_eq!(session.history[0].app.as_deref(), Some("INC-1"));
    }

    #[test]
    fn successful_runbook_surfaces_file_and_path() {
        let mut session = session_with_catalog();
        select_incident(&mut session, "INC-1").expect("select");
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        run_remediation(&mut session, &gateway, &reporter, RemediationKind::Runbook)
            .expect("run runbook");

        assert_eq!(gateway.calls(), vec!["generate_runbook"]);
        let alert = &reporter.alerts()[0];
        assert!(alert.contains("File: runbook.md"));
        assert!(alert.contains("Path: /srv/agent/runbook.md"));
        assert_eq!(session.history[0].action, ActionKind::GenerateRunbook);
        assert_eq!(session.responses.len(), 1);
    }

    #[test]
    fn remediation_kinds_route_to_their_gateway_operations() {
        let mut session = session_with_catalog();
        select_incident(&mut session, "INC-2").expect("select");
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        for kind in [
            RemediationKind::Heal,
            RemediationKind::HealScript,
            RemediationKind::Rca,
        ] {
            run_remediation(&mut session, &gateway, &reporter, kind).expect("run");
        }

        assert_eq!(gateway.calls(), vec!["heal", "generate_heal_script", "heal"]);
        let kinds: Vec<ActionKind> = session.history.iter().map(|e| e.action).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::Rca,
                ActionKind::GenerateHealScript,
                ActionKind::Heal
            ]
        );
    }

    #[test]
    fn cr_analysis_requires_a_focused_incident() {
        let mut session = session_with_catalog();
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        let result = run_cr_analysis(&mut session, &gateway, &reporter);

        assert_eq!(result, Err(ConsoleError::NoActiveIncident));
        assert!(gateway.calls().is_empty());
        assert!(session.history.is_empty());
    }

    #[test]
    fn cr_analysis_logs_the_impact_without_touching_the_selection() {
        let mut session = session_with_catalog();
        session.change_requests = vec![ChangeRequest(serde_json::json!({"cr_id": "CR-9"}))];
        select_incident(&mut session, "INC-1").expect("select");
        let detail = session.selected_response.clone();
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        run_cr_analysis(&mut session, &gateway, &reporter).expect("run");

        assert_eq!(session.responses[0].query, "CR Tracker Analysis for Incident: INC-1");
        assert_eq!(session.responses[0].response, "impact for INC-1 across 1 CRs");
        assert_eq!(session.selected_response, detail);
        assert_eq!(session.history[0].action, ActionKind::CrTracker);
    }

    #[test]
    fn interleaved_queries_fold_in_completion_order() {
        let mut session = Session::new("SRE Admin");
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        let first = begin_query(&mut session, "slow query").expect("begin");
        let second = begin_query(&mut session, "fast query").expect("begin");
        assert_eq!(session.history.len(), 2);

        let second_reply = gateway.query(&second.text);
        complete_query(&mut session, second, second_reply, &reporter);
        let first_reply = gateway.query(&first.text);
        complete_query(&mut session, first, first_reply, &reporter);

        assert_eq!(session.responses[0].query, "slow query");
        assert_eq!(session.responses[1].query, "fast query");
        assert!(session.responses[0].id > session.responses[1].id);
    }

    #[test]
    fn catalog_load_failure_is_diagnostic_only() {
        let mut session = Session::new("SRE Admin");
        let gateway = StubGateway {
            catalog_unavailable: true,
            ..StubGateway::default()
        };
        let reporter = CaptureReporter::default();

        load_catalog(&mut session, &gateway, &reporter);

        assert!(session.incidents.is_empty());
        assert!(session.change_requests.is_empty());
        assert!(reporter.alerts().is_empty());
        assert_eq!(reporter.diagnostics().len(), 2);

        // The operator can still query with an empty catalog.
        submit_query(&mut session, &gateway, &reporter, "check status").expect("submit");
        assert_eq!(session.responses.len(), 1);
    }

    #[test]
    fn catalog_load_fills_both_lists() {
        let mut session = Session::new("SRE Admin");
        let gateway = StubGateway::default();
        let reporter = CaptureReporter::default();

        load_catalog(&mut session, &gateway, &reporter);

        assert_eq!(session.incidents.len(), 2);
        assert_eq!(session.change_requests.len(), 1);
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn query_runbook_side_channel_stays_out_of_the_visible_log() {
        let mut session = Session::new("SRE Admin");
        let reporter = CaptureReporter::default();

        let pending = begin_query(&mut session, "check pod").expect("begin");
        let reply = QueryReply {
            response: "pod was OOM-killed".into(),
            runbook_status: Some("success".into()),
            runbook_file: Some("runbook.md".into()),
            runbook_path: Some("/srv/agent/runbook.md".into()),
            runbook_error: None,
        };
        complete_query(&mut session, pending, Ok(reply), &reporter);

        assert_eq!(session.responses[0].response, "pod was OOM-killed");
        assert!(reporter.alerts().is_empty());
        assert!(reporter.diagnostics()[0].contains("/srv/agent/runbook.md"));
    }
}
