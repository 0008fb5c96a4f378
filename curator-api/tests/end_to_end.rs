//! Submission through the HTTP router, execution by embedded worker loops
//! over the in-memory backends, with scripted generation and tools.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use curator_api::{AppState, create_router};
use curator_store::{Backends, InMemoryJobQueue, InMemoryJobStore};
use curator_worker::generation::{
    ContentBlock, GenerationBackend, GenerationError, GenerationRequest, GenerationResponse,
    RetryPolicy, Retrying,
};
use curator_worker::pipeline::{PipelineExecutor, WorkflowExecutor};
use curator_worker::scheduler::{WorkerError, drain_workers, spawn_workers};
use curator_worker::tools::{Tool, ToolError, ToolRegistry};

// =============================================================================
// Scripted collaborators
// =============================================================================

/// Answers every stage with text; asks for `tool` once per stage when given
struct ScriptedModel {
    tool: Option<&'static str>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(tool: Option<&'static str>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            tool,
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl GenerationBackend for ScriptedModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;

        let first_turn = request.messages.len() == 1;
        let content = match self.tool {
            Some(tool) if first_turn && request.allow_tool_use => vec![ContentBlock::ToolUse {
                id: format!("toolu_{}", call),
                name: tool.to_string(),
                input: json!({"prompt": "bottle on a mountain"}),
            }],
            _ => vec![ContentBlock::text(format!(
                "Clear water, clear conscience. Carry less, care more. (call {})",
                call
            ))],
        };

        Ok(GenerationResponse {
            content,
            stop_reason: Some("end_turn".to_string()),
        })
    }
}

/// A model endpoint that is never reachable
struct DownModel;

#[async_trait]
impl GenerationBackend for DownModel {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        Err(GenerationError::Connection(
            "connection refused\n(os error 111)".to_string(),
        ))
    }
}

/// An image server that always errors
struct BrokenImageTool;

#[async_trait]
impl Tool for BrokenImageTool {
    fn name(&self) -> &str {
        "generate_image"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt"
    }

    fn input_schema(&self) -> JsonValue {
        json!({"type": "object", "properties": {"prompt": {"type": "string"}}})
    }

    async fn call(&self, _parameters: JsonValue) -> Result<JsonValue, ToolError> {
        Err(ToolError::Unavailable(
            "No image generation server available".to_string(),
        ))
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    router: Router,
    shutdown: CancellationToken,
    workers: JoinSet<Result<(), WorkerError>>,
}

impl Harness {
    fn start(
        backend: Arc<dyn GenerationBackend>,
        tools: ToolRegistry,
        workers: usize,
        visibility_timeout: Duration,
    ) -> Self {
        let backends = Backends {
            store: Arc::new(InMemoryJobStore::new(Duration::from_secs(3600))),
            queue: Arc::new(InMemoryJobQueue::new(
                visibility_timeout,
                Duration::from_millis(5),
                false,
            )),
        };

        let tools = Arc::new(tools);
        let executor: Arc<dyn WorkflowExecutor> =
            Arc::new(PipelineExecutor::new(backend, Arc::clone(&tools), 4));
        let names = (1..=workers).map(|n| format!("e2e-{}", n));
        let shutdown = CancellationToken::new();
        let workers = spawn_workers(names, &backends, executor, &shutdown);

        Self {
            router: create_router(AppState::new(backends, tools)),
            shutdown,
            workers,
        }
    }

    async fn request(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn submit(&self, payload: JsonValue) -> String {
        let (status, body) = self
            .request(
                Request::post("/api/v1/workflow/submit")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        body["job_id"].as_str().unwrap().to_string()
    }

    async fn status(&self, job_id: &str) -> JsonValue {
        let (status, body) = self
            .request(
                Request::get(format!("/api/v1/workflow/status/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn wait_for_terminal(&self, job_id: &str) -> JsonValue {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let job = self.status(job_id).await;
                if job["status"] == "completed" || job["status"] == "failed" {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("job did not reach a terminal state")
    }

    /// Stops the worker loops, waiting for running jobs to finish
    async fn shutdown(&mut self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(10), drain_workers(&mut self.workers))
            .await
            .expect("workers did not stop")
            .unwrap();
    }

    async fn list(&self, query: &str) -> JsonValue {
        let (status, body) = self
            .request(
                Request::get(format!("/api/v1/workflow/jobs{}", query))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

fn no_tools() -> ToolRegistry {
    ToolRegistry::new(Duration::from_secs(1))
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_tagline_job_completes() {
    let model = ScriptedModel::new(None, Duration::ZERO);
    let harness = Harness::start(model.clone(), no_tools(), 1, Duration::from_secs(60));

    let job_id = harness
        .submit(json!({"task_description": "Write a 2-line product tagline", "priority": 5}))
        .await;
    let job = harness.wait_for_terminal(&job_id).await;

    assert_eq!(job["status"], "completed");
    assert!(job["error_message"].is_null());
    assert!(!job["result"]["output"].as_str().unwrap().is_empty());
    assert_eq!(job["result"]["task_count"], 3);
    assert_eq!(job["result"]["agent_count"], 3);
    assert_eq!(job["result"]["stages"][0]["stage"], "strategy");
    assert_eq!(job["result"]["stages"][2]["agent_role"], "Quality Reviewer");
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_generation_failure_fails_job() {
    let backend = Retrying::new(
        DownModel,
        RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
    );
    let harness = Harness::start(Arc::new(backend), no_tools(), 1, Duration::from_secs(60));

    let job_id = harness
        .submit(json!({"task_description": "Write a 2-line product tagline"}))
        .await;
    let job = harness.wait_for_terminal(&job_id).await;

    assert_eq!(job["status"], "failed");
    assert!(job["result"].is_null());
    let message = job["error_message"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(!message.contains('\n'));
    assert!(message.starts_with("strategy stage failed: generation failed after 3 attempts"));
}

#[tokio::test]
async fn test_failing_tool_still_completes() {
    let model = ScriptedModel::new(Some("generate_image"), Duration::ZERO);
    let tools = no_tools().with_tool(Arc::new(BrokenImageTool));
    let harness = Harness::start(model, tools, 1, Duration::from_secs(60));

    let job_id = harness
        .submit(json!({
            "task_description": "Design a launch poster",
            "project_context": "Eco-friendly water bottles",
            "requirements": {"tone": "playful"}
        }))
        .await;
    let job = harness.wait_for_terminal(&job_id).await;

    assert_eq!(job["status"], "completed");
    assert!(job["error_message"].is_null());
    assert_eq!(job["result"]["tool_invocation_count"], 3);

    let invocation = &job["result"]["stages"][0]["tool_invocations"][0];
    assert_eq!(invocation["tool"], "generate_image");
    assert_eq!(invocation["outcome"]["success"], false);
    assert_eq!(
        invocation["outcome"]["error"],
        "No image generation server available"
    );
}

#[tokio::test]
async fn test_redelivered_job_keeps_single_result() {
    // Each stage takes longer than the visibility timeout, so the second
    // worker picks up the same task while the first is still running it
    let model = ScriptedModel::new(None, Duration::from_millis(60));
    let harness = Harness::start(model.clone(), no_tools(), 2, Duration::from_millis(20));

    let job_id = harness
        .submit(json!({"task_description": "Write a 2-line product tagline"}))
        .await;
    let job = harness.wait_for_terminal(&job_id).await;

    // Let the slower run finish its terminal write too
    tokio::time::sleep(Duration::from_millis(400)).await;
    let job_after = harness.status(&job_id).await;

    assert!(model.calls.load(Ordering::SeqCst) >= 6);
    assert_eq!(job["status"], "completed");
    assert_eq!(job_after["status"], "completed");
    assert!(job_after["error_message"].is_null());

    let result = &job_after["result"];
    assert_eq!(result["stages"].as_array().unwrap().len(), 3);
    assert_eq!(result["output"].as_str().unwrap().matches("Clear water").count(), 1);
}

#[tokio::test]
async fn test_listing_is_stable() {
    let model = ScriptedModel::new(None, Duration::ZERO);
    let harness = Harness::start(model, no_tools(), 2, Duration::from_secs(60));

    let mut ids = Vec::new();
    for n in 0..4 {
        ids.push(
            harness
                .submit(json!({"task_description": format!("Tagline #{}", n)}))
                .await,
        );
    }
    for id in &ids {
        harness.wait_for_terminal(id).await;
    }

    let first = harness.list("?limit=3").await;
    let second = harness.list("?limit=3").await;
    assert_eq!(first, second);
    assert_eq!(first["total"], 3);

    let listed: Vec<&str> = first["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["job_id"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec![ids[3].as_str(), ids[2].as_str(), ids[1].as_str()]);

    let completed = harness.list("?status=completed").await;
    assert_eq!(completed["total"], 4);
    let failed = harness.list("?status=failed").await;
    assert_eq!(failed["total"], 0);
}

#[tokio::test]
async fn test_shutdown_finishes_running_job() {
    let model = ScriptedModel::new(None, Duration::from_millis(100));
    let mut harness = Harness::start(model.clone(), no_tools(), 1, Duration::from_secs(60));

    let job_id = harness
        .submit(json!({"task_description": "Write a 2-line product tagline"}))
        .await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.status(&job_id).await["status"] != "processing" {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    harness.shutdown().await;

    let job = harness.status(&job_id).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);

    let health = harness
        .request(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .1;
    assert_eq!(health["queue_depth"], 0);
}
