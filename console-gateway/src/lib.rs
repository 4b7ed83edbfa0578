use console_core::catalog::{ChangeRequest, Incident};
use console_core::gateway::{Artifact, Gateway, GatewayError, QueryReply};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Live backend gateway: HTTP+JSON against a fixed base URL. Each
/// operation is a single round trip with no retry and no client-side
/// deadline (a hung call is re-triggered manually by the operator).
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn get_json<R: DeserializeOwned>(&self, route: &str) -> Result<R, GatewayError> {
        let response = self
            .client
            .get(format!("{}{route}", self.base_url))
            .send()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        decode(response)
    }

    fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<R, GatewayError> {
        let response = self
            .client
            .post(format!("{}{route}", self.base_url))
            .json(body)
            .send()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        decode(response)
    }
}

fn decode<R: DeserializeOwned>(response: Response) -> Result<R, GatewayError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| GatewayError::Transport(err.to_string()))?;

    if !status.is_success() {
        return Err(GatewayError::Backend(error_message(&body, status.as_u16())));
    }

    serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
}

/// Failed replies usually still carry `{"status": "error", "error": ...}`;
/// mine that before falling back to the HTTP status.
fn error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| format!("backend returned HTTP {status}"))
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct IssueRequest<'a> {
    issue_description: &'a str,
}

#[derive(Serialize)]
struct CrTrackerRequest<'a> {
    incident: &'a Incident,
    change_requests: &'a [ChangeRequest],
}

#[derive(Deserialize)]
struct CrTrackerReply {
    impact_analysis: String,
}

/// Artifact replies on the wire: `{status, file, path}` on success,
/// `{status, error}` on failure.
#[derive(Debug, Deserialize)]
struct ArtifactReply {
    status: String,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ArtifactReply {
    fn into_result(self) -> Result<Artifact, GatewayError> {
        if self.status == "success" {
            match (self.file, self.path) {
                (Some(file), Some(path)) => Ok(Artifact { file, path }),
                _ => Err(GatewayError::Decode(
                    "success reply missing file or path".into(),
                )),
            }
        } else {
            Err(GatewayError::Backend(
                self.error
                    .unwrap_or_else(|| format!("backend reported status '{}'", self.status)),
            ))
        }
    }
}

impl Gateway for HttpGateway {
    fn query(&self, text: &str) -> Result<QueryReply, GatewayError> {
        self.post_json("/query", &QueryRequest { query: text })
    }

    fn heal(&self, issue_description: &str) -> Result<Artifact, GatewayError> {
        self.post_json::<_, ArtifactReply>("/heal", &IssueRequest { issue_description })?
            .into_result()
    }

    fn generate_heal_script(&self, issue_description: &str) -> Result<Artifact, GatewayError> {
        self.post_json::<_, ArtifactReply>(
            "/generate_heal_script",
            &IssueRequest { issue_description },
        )?
        .into_result()
    }

    fn generate_runbook(&self, issue_description: &str) -> Result<Artifact, GatewayError> {
        self.post_json::<_, ArtifactReply>(
            "/generate_runbook",
            &IssueRequest { issue_description },
        )?
        .into_result()
    }

    fn cr_tracker(
        &self,
        incident: &Incident,
        change_requests: &[ChangeRequest],
    ) -> Result<String, GatewayError> {
        let reply: CrTrackerReply = self.post_json(
            "/cr_tracker",
            &CrTrackerRequest {
                incident,
                change_requests,
            },
        )?;
        Ok(reply.impact_analysis)
    }

    fn list_incidents(&self) -> Result<Vec<Incident>, GatewayError> {
        self.get_json("/incidents")
    }

    fn list_change_requests(&self) -> Result<Vec<ChangeRequest>, GatewayError> {
        self.get_json("/change_requests")
    }
}
