use console_core::catalog;
use console_core::gateway::Gateway;
use console_core::offline::CannedGateway;
use console_core::orchestrator::{self, RemediationKind};
use console_core::reporter::Reporter;
use console_core::session::Session;
use console_gateway::HttpGateway;
use std::io::BufRead;

struct ConsoleConfig {
    backend_url: String,
    operator: String,
    offline: bool,
}

fn config_from_env() -> ConsoleConfig {
    ConsoleConfig {
        backend_url: std::env::var("CONSOLE_BACKEND_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".into()),
        operator: std::env::var("CONSOLE_OPERATOR").unwrap_or_else(|_| "SRE Admin".into()),
        offline: std::env::var("CONSOLE_OFFLINE")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    }
}

struct StderrReporter;

impl Reporter for StderrReporter {
    fn alert(&self, message: &str) {
        eprintln!("ALERT: {message}");
    }

    fn diagnostic(&self, message: &str) {
        eprintln!("[console] {message}");
    }
}

fn build_gateway(config: &ConsoleConfig) -> Result<Box<dyn Gateway>, String> {
    if config.offline {
        return Ok(Box::new(CannedGateway));
    }
    HttpGateway::new(&config.backend_url)
        .map(|gateway| Box::new(gateway) as Box<dyn Gateway>)
        .map_err(|err| err.to_string())
}

fn main() {
    let config = config_from_env();
    let reporter = StderrReporter;
    let gateway = match build_gateway(&config) {
        Ok(gateway) => gateway,
        Err(err) => {
            eprintln!("cannot start console: {err}");
            std::process::exit(1);
        }
    };

    let mut session = Session::new(config.operator.clone());
    orchestrator::load_catalog(&mut session, &*gateway, &reporter);

    println!(
        "sre-console ({}) as {} - {} incident(s), {} change request(s) loaded",
        if config.offline { "offline" } else { config.backend_url.as_str() },
        config.operator,
        session.incidents.len(),
        session.change_requests.len(),
    );
    print_help();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if !dispatch(&line, &mut session, &*gateway, &reporter) {
            break;
        }
    }
}

/// Routes one operator command; returns false to end the session.
fn dispatch(line: &str, session: &mut Session, gateway: &dyn Gateway, reporter: &dyn Reporter) -> bool {
    let line = line.trim();
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" => print_help(),
        "incidents" => print_incidents(session),
        "crs" => print_change_requests(session),
        "select" => {
            if let Err(err) = orchestrator::select_incident(session, rest) {
                reporter.alert(&err.to_string());
            } else {
                print_latest_response(session);
            }
        }
        "query" => {
            session.input = rest.to_string();
            let text = session.input.clone();
            match orchestrator::submit_query(session, gateway, reporter, &text) {
                Ok(()) => print_latest_response(session),
                Err(err) => reporter.alert(&err.to_string()),
            }
        }
        "heal" => remediate(session, gateway, reporter, RemediationKind::Heal),
        "healscript" => remediate(session, gateway, reporter, RemediationKind::HealScript),
        "runbook" => remediate(session, gateway, reporter, RemediationKind::Runbook),
        "rca" => remediate(session, gateway, reporter, RemediationKind::Rca),
        "crtrack" => match orchestrator::run_cr_analysis(session, gateway, reporter) {
            Ok(()) => print_latest_response(session),
            Err(err) => reporter.alert(&err.to_string()),
        },
        "responses" => print_responses(session),
        "history" => print_history(session),
        "quit" | "exit" => return false,
        _ => println!("unknown command '{command}', try 'help'"),
    }

    true
}

fn remediate(
    session: &mut Session,
    gateway: &dyn Gateway,
    reporter: &dyn Reporter,
    kind: RemediationKind,
) {
    if let Err(err) = orchestrator::run_remediation(session, gateway, reporter, kind) {
        reporter.alert(&err.to_string());
    }
}

fn print_help() {
    println!("commands:");
    println!("  incidents            list open incidents (priority order)");
    println!("  select <id>          focus an incident and show its details");
    println!("  query <text>         send a free-text diagnostic query");
    println!("  heal                 request automated remediation for the selected response");
    println!("  healscript           generate a heal script for the selected response");
    println!("  runbook              generate a runbook for the selected response");
    println!("  rca                  request root-cause analysis for the selected response");
    println!("  crtrack              analyze change requests against the focused incident");
    println!("  crs                  list loaded change requests");
    println!("  responses            show the query/response log (newest first)");
    println!("  history              show the action history (newest first)");
    println!("  quit                 end the session");
}

fn print_incidents(session: &Session) {
    if session.incidents.is_empty() {
        println!("no incidents loaded");
        return;
    }
    for incident in catalog::sort_for_display(&session.incidents) {
        let marker = if session.active_incident.as_deref() == Some(&incident.incident_id) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {} [{}] {} ({})",
            incident.incident_id, incident.priority, incident.issue, incident.application_affected,
        );
    }
}

fn print_change_requests(session: &Session) {
    if session.change_requests.is_empty() {
        println!("no change requests loaded");
        return;
    }
    for change_request in &session.change_requests {
        println!("{}", change_request.0);
    }
}

fn print_latest_response(session: &Session) {
    if let Some(entry) = session.responses.first() {
        println!("[{}] > {}", entry.timestamp, entry.query);
        println!("{}", entry.response);
    }
}

fn print_responses(session: &Session) {
    if session.responses.is_empty() {
        println!("No queries executed yet. Type a query above to begin.");
        return;
    }
    for entry in &session.responses {
        println!("[{}] > {}", entry.timestamp, entry.query);
        println!("{}", entry.response);
        println!();
    }
}

fn print_history(session: &Session) {
    if session.history.is_empty() {
        println!("No actions recorded yet");
        return;
    }
    for entry in &session.history {
        println!("{} {} - {}", entry.timestamp, entry.user, entry.summary());
    }
}
