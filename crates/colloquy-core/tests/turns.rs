//! End-to-end turn scenarios against a scripted gateway
//!
//! Every test drives the real orchestrator, registry and session store; only
//! the model is replaced by a queued script, so the assertions cover exactly
//! what a live deployment would record and return.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use colloquy_core::config::{OrchestratorConfig, SessionConfig};
use colloquy_core::gateway::{
    GatewayError, GatewayReply, GatewayResult, LlmGateway, MockGateway,
};
use colloquy_core::orchestrator::{Orchestrator, TurnError};
use colloquy_core::session::SessionStore;
use colloquy_core::tools::{BoxError, ToolRegistry};
use colloquy_core::types::{
    FieldType, InputSchema, Message, MessageRole, ToolCallRequest, ToolDeclaration,
};

// ── Fixtures ────────────────────────────────────────────────────────────────

struct Harness {
    mock: Arc<MockGateway>,
    registry: Arc<ToolRegistry>,
    store: Arc<SessionStore>,
    orchestrator: Arc<Orchestrator>,
}

fn harness() -> Harness {
    harness_with(ToolRegistry::new(), OrchestratorConfig::default())
}

fn harness_with(registry: ToolRegistry, config: OrchestratorConfig) -> Harness {
    let mock = Arc::new(MockGateway::new());
    let registry = Arc::new(registry);
    let store = Arc::new(SessionStore::new(SessionConfig::default()));
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&mock) as Arc<dyn LlmGateway>,
        Arc::clone(&registry),
        Arc::clone(&store),
        config,
    ));
    Harness {
        mock,
        registry,
        store,
        orchestrator,
    }
}

fn weather_declaration() -> ToolDeclaration {
    ToolDeclaration::new(
        "get_weather",
        "Get the current weather for a city.",
        InputSchema::new().required("city", FieldType::String),
    )
}

async fn weather_handler(arguments: Value) -> Result<Value, BoxError> {
    let city = arguments["city"].as_str().unwrap_or("nowhere");
    Ok(json!({ "city": city, "temp_c": 24, "condition": "Partly cloudy" }))
}

fn echo_declaration() -> ToolDeclaration {
    ToolDeclaration::new("echo", "Echo the arguments back.", InputSchema::new())
}

async fn echo_handler(arguments: Value) -> Result<Value, BoxError> {
    Ok(arguments)
}

// ── Single rounds ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tool_round_reaches_final_answer() {
    let h = harness();
    h.registry
        .register(weather_declaration(), weather_handler)
        .unwrap();
    h.mock.queue_tool_calls(vec![ToolCallRequest::new(
        "call_1",
        "get_weather",
        json!({"city": "Nairobi"}),
    )]);
    h.mock.queue_text("It is 24C and partly cloudy in Nairobi.");

    let output = h
        .orchestrator
        .run_turn("s1", "weather in Nairobi?")
        .await
        .unwrap();
    assert_eq!(output, "It is 24C and partly cloudy in Nairobi.");

    // user, announcement, tool result, final answer
    let history = h.store.snapshot("s1").unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, MessageRole::User);
    assert!(history[1].announces_tool_calls());
    assert_eq!(history[2].role, MessageRole::Tool);
    assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
    assert!(history[2].content.contains("Nairobi"));
    assert_eq!(history[3].role, MessageRole::Assistant);

    // the follow-up model call saw the declarations and the tool result
    let calls = h.mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].tools.len(), 1);
    assert_eq!(calls[1].history.last().unwrap().role, MessageRole::Tool);
}

#[tokio::test]
async fn test_empty_tool_call_list_ends_turn_as_empty_text() {
    let h = harness();
    h.mock.queue_tool_calls(Vec::new());

    let output = h.orchestrator.run_turn("s1", "hello").await.unwrap();
    assert_eq!(output, "");
    assert_eq!(h.mock.call_count(), 1);

    let history = h.store.snapshot("s1").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert!(history[1].content.is_empty());
    assert!(!history[1].announces_tool_calls());
}

#[tokio::test]
async fn test_followup_turn_replays_full_history() {
    let h = harness();
    h.mock.queue_text("four");
    h.mock.queue_text("six");

    h.orchestrator.run_turn("s1", "2+2?").await.unwrap();
    h.orchestrator
        .run_turn("s1", "and two more?")
        .await
        .unwrap();

    let replay = &h.mock.calls()[1].history;
    // system prompt, first exchange, then the new input
    assert_eq!(replay.len(), 4);
    assert_eq!(replay[0].role, MessageRole::System);
    assert_eq!(replay[1].content, "2+2?");
    assert_eq!(replay[2].content, "four");
    assert_eq!(replay[3].content, "and two more?");
}

// ── Tool failures stay inside the turn ──────────────────────────────────────

#[tokio::test]
async fn test_unknown_tool_does_not_abort_the_round() {
    let h = harness();
    h.registry
        .register(weather_declaration(), weather_handler)
        .unwrap();
    h.mock.queue_tool_calls(vec![
        ToolCallRequest::new("call_1", "ghost_tool", json!({})),
        ToolCallRequest::new("call_2", "get_weather", json!({"city": "Oslo"})),
    ]);
    h.mock.queue_text("got what I could");

    let output = h.orchestrator.run_turn("s1", "go").await.unwrap();
    assert_eq!(output, "got what I could");

    let history = h.store.snapshot("s1").unwrap();
    assert_eq!(history.len(), 5);
    let ghost: Value = serde_json::from_str(&history[2].content).unwrap();
    assert_eq!(ghost["error"], "unknown_tool");
    assert!(history[3].content.contains("Oslo"));
}

#[tokio::test]
async fn test_invalid_arguments_are_folded_not_fatal() {
    let h = harness();
    h.registry
        .register(weather_declaration(), weather_handler)
        .unwrap();
    h.mock.queue_tool_calls(vec![ToolCallRequest::new(
        "call_1",
        "get_weather",
        json!({"town": "Oslo"}),
    )]);
    h.mock.queue_text("asked again with better arguments");

    let output = h.orchestrator.run_turn("s1", "go").await.unwrap();
    assert_eq!(output, "asked again with better arguments");

    let folded: Value =
        serde_json::from_str(&h.store.snapshot("s1").unwrap()[2].content).unwrap();
    assert_eq!(folded["error"], "schema_validation");
    assert!(folded["detail"].as_str().unwrap().contains("city"));
}

#[tokio::test(start_paused = true)]
async fn test_tool_timeout_is_folded_and_turn_completes() {
    let registry = ToolRegistry::new().with_timeout(Duration::from_secs(2));
    let h = harness_with(registry, OrchestratorConfig::default());
    h.registry
        .register(
            ToolDeclaration::new("stall", "Never answers in time.", InputSchema::new()),
            |_args: Value| async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok::<Value, BoxError>(json!("too late"))
            },
        )
        .unwrap();
    h.mock
        .queue_tool_calls(vec![ToolCallRequest::new("call_1", "stall", json!({}))]);
    h.mock.queue_text("done without the tool");

    let output = h.orchestrator.run_turn("s1", "go").await.unwrap();
    assert_eq!(output, "done without the tool");

    let folded: Value =
        serde_json::from_str(&h.store.snapshot("s1").unwrap()[2].content).unwrap();
    assert_eq!(folded["error"], "timeout");
}

// ── Round budget ────────────────────────────────────────────────────────────

fn echo_call(id: &str) -> ToolCallRequest {
    ToolCallRequest::new(id, "echo", json!({"round": id}))
}

#[tokio::test]
async fn test_budget_allows_rounds_up_to_the_limit() {
    let h = harness_with(
        ToolRegistry::new(),
        OrchestratorConfig::default().with_turn_budget(2),
    );
    h.registry.register(echo_declaration(), echo_handler).unwrap();
    h.mock.queue_tool_calls(vec![echo_call("call_1")]);
    h.mock.queue_tool_calls(vec![echo_call("call_2")]);
    h.mock.queue_text("made it");

    let output = h.orchestrator.run_turn("s1", "go").await.unwrap();
    assert_eq!(output, "made it");
    assert_eq!(h.mock.call_count(), 3);
}

#[tokio::test]
async fn test_budget_exhaustion_records_the_final_round_then_fails() {
    let h = harness_with(
        ToolRegistry::new(),
        OrchestratorConfig::default().with_turn_budget(2),
    );
    h.registry.register(echo_declaration(), echo_handler).unwrap();
    for id in ["call_1", "call_2", "call_3"] {
        h.mock.queue_tool_calls(vec![echo_call(id)]);
    }

    let err = h.orchestrator.run_turn("s1", "go").await.unwrap_err();
    assert!(matches!(err, TurnError::ToolLoopExceeded { rounds: 3 }));
    // the model never gets a fourth call
    assert_eq!(h.mock.call_count(), 3);

    // user plus three announcement/result pairs, including the round that
    // crossed the line
    let history = h.store.snapshot("s1").unwrap();
    assert_eq!(history.len(), 7);
    assert_eq!(history[6].role, MessageRole::Tool);
    assert_eq!(history[6].tool_call_id.as_deref(), Some("call_3"));
}

// ── Gateway retries ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_transient_gateway_failures_are_retried() {
    let h = harness();
    h.mock
        .queue_error(GatewayError::rate_limited("mock", "slow down"));
    h.mock
        .queue_error(GatewayError::upstream("mock", 503, "unavailable"));
    h.mock.queue_text("recovered");

    let output = h.orchestrator.run_turn("s1", "hi").await.unwrap();
    assert_eq!(output, "recovered");
    assert_eq!(h.mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhaust_into_a_turn_error() {
    let h = harness();
    for _ in 0..3 {
        h.mock.queue_error(GatewayError::rate_limited("mock", "busy"));
    }

    let err = h.orchestrator.run_turn("s1", "hi").await.unwrap_err();
    assert!(matches!(err, TurnError::Gateway { attempts: 3, .. }));
    assert_eq!(h.mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_timeout_is_retried_then_surfaced() {
    let mock = Arc::new(MockGateway::with_delay(Duration::from_secs(120)));
    let store = Arc::new(SessionStore::new(SessionConfig::default()));
    let orchestrator = Orchestrator::new(
        Arc::clone(&mock) as Arc<dyn LlmGateway>,
        Arc::new(ToolRegistry::new()),
        Arc::clone(&store),
        OrchestratorConfig::default().with_gateway_timeout(Duration::from_secs(1)),
    );

    let err = orchestrator.run_turn("s1", "hi").await.unwrap_err();
    match err {
        TurnError::Gateway { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, GatewayError::Timeout { .. }));
        }
        other => panic!("expected a gateway timeout, got {other}"),
    }
    // each attempt reached the gateway before its deadline cut it off
    assert_eq!(mock.call_count(), 3);

    // the user input stays recorded even though no answer was produced
    assert_eq!(store.snapshot("s1").unwrap().len(), 1);
}

#[tokio::test]
async fn test_fatal_gateway_error_fails_without_retry() {
    let h = harness();
    h.mock.queue_error(GatewayError::auth("mock", 401));

    let err = h.orchestrator.run_turn("s1", "hi").await.unwrap_err();
    match err {
        TurnError::Gateway { attempts, source } => {
            assert_eq!(attempts, 1);
            assert!(!source.is_retryable());
        }
        other => panic!("expected a gateway error, got {other}"),
    }
    assert_eq!(h.mock.call_count(), 1);

    // the user input stays recorded even though the turn failed
    assert_eq!(h.store.snapshot("s1").unwrap().len(), 1);
}

// ── Session lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_eviction_mid_turn_surfaces_as_session_expired() {
    let h = harness();
    {
        let store = Arc::clone(&h.store);
        h.registry
            .register(
                ToolDeclaration::new(
                    "self_destruct",
                    "Evicts its own session.",
                    InputSchema::new(),
                ),
                move |_args: Value| {
                    let store = Arc::clone(&store);
                    async move {
                        store.evict("doomed");
                        Ok::<Value, BoxError>(json!({}))
                    }
                },
            )
            .unwrap();
    }
    h.mock.queue_tool_calls(vec![ToolCallRequest::new(
        "call_1",
        "self_destruct",
        json!({}),
    )]);

    let err = h.orchestrator.run_turn("doomed", "go").await.unwrap_err();
    assert!(matches!(err, TurnError::SessionExpired { ref id } if id == "doomed"));
    assert!(err.user_message().contains("expired"));
    assert!(!h.store.contains("doomed"));
}

#[tokio::test]
async fn test_recreated_session_does_not_absorb_the_evicted_turn() {
    let h = harness();
    {
        let store = Arc::clone(&h.store);
        h.registry
            .register(
                ToolDeclaration::new(
                    "usurper",
                    "Evicts and recreates its own session.",
                    InputSchema::new(),
                ),
                move |_args: Value| {
                    let store = Arc::clone(&store);
                    async move {
                        // sweep races a fresh request for the same id
                        store.evict("victim");
                        store.get_or_create("victim");
                        Ok::<Value, BoxError>(json!({}))
                    }
                },
            )
            .unwrap();
    }
    h.mock.queue_tool_calls(vec![ToolCallRequest::new(
        "call_1",
        "usurper",
        json!({}),
    )]);

    let err = h.orchestrator.run_turn("victim", "go").await.unwrap_err();
    assert!(matches!(err, TurnError::SessionExpired { ref id } if id == "victim"));

    // the recreated session exists but carries none of the dead turn's
    // messages; in particular no orphaned tool result
    assert!(h.store.contains("victim"));
    assert!(h.store.snapshot("victim").unwrap().is_empty());
}

// ── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_session_turns_never_overlap() {
    let h = harness();
    let in_flight = Arc::new(AtomicBool::new(false));
    let overlapped = Arc::new(AtomicBool::new(false));
    {
        let in_flight = Arc::clone(&in_flight);
        let overlapped = Arc::clone(&overlapped);
        h.registry
            .register(
                ToolDeclaration::new("probe", "Detects overlapping rounds.", InputSchema::new()),
                move |_args: Value| {
                    let in_flight = Arc::clone(&in_flight);
                    let overlapped = Arc::clone(&overlapped);
                    async move {
                        if in_flight.swap(true, Ordering::SeqCst) {
                            overlapped.store(true, Ordering::SeqCst);
                        }
                        tokio::time::sleep(Duration::from_millis(25)).await;
                        in_flight.store(false, Ordering::SeqCst);
                        Ok::<Value, BoxError>(json!({}))
                    }
                },
            )
            .unwrap();
    }
    h.mock
        .queue_tool_calls(vec![ToolCallRequest::new("call_1", "probe", json!({}))]);
    h.mock.queue_text("first");
    h.mock
        .queue_tool_calls(vec![ToolCallRequest::new("call_2", "probe", json!({}))]);
    h.mock.queue_text("second");

    let a = tokio::spawn({
        let o = Arc::clone(&h.orchestrator);
        async move { o.run_turn("shared", "one").await }
    });
    let b = tokio::spawn({
        let o = Arc::clone(&h.orchestrator);
        async move { o.run_turn("shared", "two").await }
    });

    let mut outputs = vec![a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
    outputs.sort();
    assert_eq!(outputs, vec!["first", "second"]);
    assert!(!overlapped.load(Ordering::SeqCst));

    // both turns recorded in full: two of each of user, announcement,
    // tool result, final answer
    assert_eq!(h.store.snapshot("shared").unwrap().len(), 8);
}

struct BarrierGateway {
    barrier: tokio::sync::Barrier,
}

#[async_trait::async_trait]
impl LlmGateway for BarrierGateway {
    fn name(&self) -> &str {
        "barrier"
    }

    async fn complete(
        &self,
        _history: &[Message],
        _tools: &[ToolDeclaration],
    ) -> GatewayResult<GatewayReply> {
        // both turns must be inside a model call at once to get past this
        self.barrier.wait().await;
        Ok(GatewayReply::Text("crossed".to_string()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_sessions_run_in_parallel() {
    let gateway = Arc::new(BarrierGateway {
        barrier: tokio::sync::Barrier::new(2),
    });
    let store = Arc::new(SessionStore::new(SessionConfig::default()));
    let orchestrator = Arc::new(Orchestrator::new(
        gateway,
        Arc::new(ToolRegistry::new()),
        Arc::clone(&store),
        OrchestratorConfig::default(),
    ));

    let a = tokio::spawn({
        let o = Arc::clone(&orchestrator);
        async move { o.run_turn("left", "hello").await }
    });
    let b = tokio::spawn({
        let o = Arc::clone(&orchestrator);
        async move { o.run_turn("right", "hello").await }
    });

    let (a, b) = tokio::time::timeout(Duration::from_secs(5), async { (a.await, b.await) })
        .await
        .expect("parallel turns deadlocked");
    assert_eq!(a.unwrap().unwrap(), "crossed");
    assert_eq!(b.unwrap().unwrap(), "crossed");
}
