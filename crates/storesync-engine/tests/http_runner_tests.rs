//! HTTP runner client tests against a mock server

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storesync_engine::pipeline::build_job_spec;
use storesync_engine::runner::{
    HttpPipelineRunner, PipelineRunner, RunFilter, RunStatus, RunnerConfig, RunnerError,
};
use storesync_engine::EntityKind;

fn runner_for(server: &MockServer) -> HttpPipelineRunner {
    HttpPipelineRunner::new(RunnerConfig {
        endpoint: server.uri(),
        api_key: None,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn submit_posts_the_job_spec_and_returns_the_run_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/category-pipeline/runs"))
        .and(body_partial_json(json!({
            "source_location": "categories.json",
            "sink_table": "categories_staging",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"run_id": "abc-123"})))
        .expect(1)
        .mount(&server)
        .await;

    let runner = runner_for(&server);
    let spec = build_job_spec(EntityKind::Category);
    let run_id = runner.submit(&spec).await.unwrap();

    assert_eq!(run_id, "abc-123");
}

#[tokio::test]
async fn get_status_parses_the_run_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runs/abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "run_id": "abc-123",
            "status": "InProgress",
            "started_at": "2024-03-10T14:05:00Z",
        })))
        .mount(&server)
        .await;

    let runner = runner_for(&server);
    let state = runner.get_status("abc-123").await.unwrap();

    assert_eq!(state.status, RunStatus::InProgress);
    assert_eq!(state.run_id, "abc-123");
    assert!(state.started_at.is_some());
    assert!(state.message.is_none());
}

#[tokio::test]
async fn unknown_status_string_surfaces_as_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runs/weird"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "run_id": "weird",
            "status": "Hibernating",
        })))
        .mount(&server)
        .await;

    let runner = runner_for(&server);
    let err = runner.get_status("weird").await.unwrap_err();

    assert!(matches!(err, RunnerError::UnknownStatus(s) if s == "Hibernating"));
}

#[tokio::test]
async fn cancel_posts_to_the_cancel_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/runs/abc-123/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let runner = runner_for(&server);
    runner.cancel("abc-123").await.unwrap();
}

#[tokio::test]
async fn list_runs_sends_the_status_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runs"))
        .and(query_param("status", "Queued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"run_id": "r1", "status": "Queued"},
            {"run_id": "r2", "status": "Queued"},
        ])))
        .mount(&server)
        .await;

    let runner = runner_for(&server);
    let filter = RunFilter {
        status: Some(RunStatus::Queued),
        job_name: None,
    };
    let runs = runner.list_runs(&filter).await.unwrap();

    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status == RunStatus::Queued));
}

#[tokio::test]
async fn api_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/order-pipeline/runs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("runner exploded"))
        .mount(&server)
        .await;

    let runner = runner_for(&server);
    let spec = build_job_spec(EntityKind::Order);
    let err = runner.submit(&spec).await.unwrap_err();

    match err {
        RunnerError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "runner exploded");
        },
        other => panic!("expected API error, got {other:?}"),
    }
}
