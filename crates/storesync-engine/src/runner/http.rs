//! REST client for the pipeline runner service
//!
//! Endpoint shape:
//!
//! - `POST {endpoint}/jobs/{name}/runs` with the job spec body → `{ "run_id" }`
//! - `GET  {endpoint}/runs/{id}` → `{ "run_id", "status", "message", "started_at" }`
//! - `POST {endpoint}/runs/{id}/cancel`
//! - `GET  {endpoint}/runs?status=…&job=…` → `[ run state, … ]`
//! - `GET  {endpoint}/runs/{id}/activities` → `[ activity run, … ]`

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ActivityRun, PipelineRunner, RunFilter, RunState, RunStatus, RunnerError, RunnerResult};
use crate::pipeline::JobSpec;

/// Default request timeout against the runner service.
pub const DEFAULT_RUNNER_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the runner service.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base URL, without trailing slash.
    pub endpoint: String,
    /// Bearer token, when the service requires one.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl RunnerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var("RUNNER_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("RUNNER_ENDPOINT not set"))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: std::env::var("RUNNER_API_KEY").ok(),
            timeout_secs: std::env::var("RUNNER_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RUNNER_TIMEOUT_SECS),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    run_id: String,
}

/// Run state as returned on the wire; status arrives as a string so unknown
/// values surface as [`RunnerError::UnknownStatus`] instead of a decode error.
#[derive(Debug, Deserialize)]
struct RunStateBody {
    run_id: String,
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

impl RunStateBody {
    fn into_run_state(self) -> RunnerResult<RunState> {
        Ok(RunState {
            status: RunStatus::from_str(&self.status)?,
            run_id: self.run_id,
            message: self.message,
            started_at: self.started_at,
        })
    }
}

/// HTTP implementation of [`PipelineRunner`].
#[derive(Clone)]
pub struct HttpPipelineRunner {
    http: reqwest::Client,
    config: RunnerConfig,
}

impl HttpPipelineRunner {
    pub fn new(config: RunnerConfig) -> RunnerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Map non-success responses to [`RunnerError::Api`] with the body text.
    async fn check(response: reqwest::Response) -> RunnerResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(RunnerError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PipelineRunner for HttpPipelineRunner {
    async fn submit(&self, spec: &JobSpec) -> RunnerResult<String> {
        let url = self.url(&format!("/jobs/{}/runs", spec.name));
        debug!(job = %spec.name, url = %url, "Submitting pipeline run");

        let response = self.request(self.http.post(&url)).json(spec).send().await?;
        let body: SubmitResponse = Self::check(response).await?.json().await?;

        Ok(body.run_id)
    }

    async fn get_status(&self, run_id: &str) -> RunnerResult<RunState> {
        let url = self.url(&format!("/runs/{run_id}"));
        let response = self.request(self.http.get(&url)).send().await?;
        let body: RunStateBody = Self::check(response).await?.json().await?;

        body.into_run_state()
    }

    async fn cancel(&self, run_id: &str) -> RunnerResult<()> {
        let url = self.url(&format!("/runs/{run_id}/cancel"));
        debug!(run_id = %run_id, "Cancelling pipeline run");

        let response = self.request(self.http.post(&url)).send().await?;
        Self::check(response).await?;

        Ok(())
    }

    async fn list_runs(&self, filter: &RunFilter) -> RunnerResult<Vec<RunState>> {
        let url = self.url("/runs");
        let mut request = self.request(self.http.get(&url));

        if let Some(status) = filter.status {
            request = request.query(&[("status", status.to_string())]);
        }
        if let Some(job) = &filter.job_name {
            request = request.query(&[("job", job.as_str())]);
        }

        let response = request.send().await?;
        let bodies: Vec<RunStateBody> = Self::check(response).await?.json().await?;

        bodies.into_iter().map(RunStateBody::into_run_state).collect()
    }

    async fn activity_runs(&self, run_id: &str) -> RunnerResult<Vec<ActivityRun>> {
        let url = self.url(&format!("/runs/{run_id}/activities"));
        let response = self.request(self.http.get(&url)).send().await?;
        let activities: Vec<ActivityRun> = Self::check(response).await?.json().await?;

        Ok(activities)
    }
}
