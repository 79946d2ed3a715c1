use super::*;
use crate::contracts::storage::CheckpointStore;
use crate::contracts::tool::{tool_map, Tool, ToolError, ToolResult};
use crate::contracts::{
    Decision, DecisionEngine, EngineError, EngineOutcome, Message, Role, RunInput, SessionKey,
    ToolDescriptor,
};
use async_trait::async_trait;
use hitl_extension_escalation::{ActionGateRegistry, EscalationPolicy, GatedAction};
use hitl_store_adapters::MemoryCheckpointStore;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct ScriptedPlanner {
    steps: Mutex<VecDeque<PlannerStep>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedPlanner {
    fn new(steps: impl IntoIterator<Item = PlannerStep>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn last_seen(&self) -> Vec<Message> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn next_step(
        &self,
        transcript: &[Message],
        _tools: &[ToolDescriptor],
    ) -> Result<PlannerStep, PlannerError> {
        self.seen.lock().unwrap().push(transcript.to_vec());
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PlannerError::Backend("script exhausted".into()))
    }
}

struct RefundTool {
    calls: Mutex<Vec<Value>>,
}

#[async_trait]
impl Tool for RefundTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("refund", "Refund", "Issue a refund")
    }

    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError> {
        self.calls.lock().unwrap().push(args.clone());
        Ok(ToolResult::success("refund", json!(format!("refunded {}", args["amount"]))))
    }
}

struct Fixture {
    engine: ToolLoopEngine,
    planner: Arc<ScriptedPlanner>,
    refund: Arc<RefundTool>,
    checkpoints: Arc<MemoryCheckpointStore>,
}

fn fixture(steps: impl IntoIterator<Item = PlannerStep>) -> Fixture {
    let planner = ScriptedPlanner::new(steps);
    let refund = Arc::new(RefundTool {
        calls: Mutex::new(Vec::new()),
    });
    let checkpoints = Arc::new(MemoryCheckpointStore::new());
    let gates = ActionGateRegistry::new(EscalationPolicy::default())
        .with_gate("refund", GatedAction::new("amount"));
    let engine = ToolLoopEngine::new(
        planner.clone(),
        tool_map([refund.clone() as Arc<dyn Tool>]),
        gates,
        checkpoints.clone(),
    );
    Fixture {
        engine,
        planner,
        refund,
        checkpoints,
    }
}

fn s1() -> SessionKey {
    SessionKey::new("u1", "s1")
}

fn input(query: &str) -> RunInput {
    RunInput {
        system: "You handle refunds.".into(),
        query: query.into(),
    }
}

fn messages(outcome: &EngineOutcome) -> Vec<Message> {
    let EngineOutcome::Completed { result } = outcome else {
        panic!("expected completed, got {outcome:?}");
    };
    serde_json::from_value(result["messages"].clone()).unwrap()
}

#[tokio::test]
async fn auto_tier_call_executes_without_pausing() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 50})),
        PlannerStep::finish("refund done"),
    ]);

    let outcome = fx.engine.run(&s1(), input("refund 50")).await.unwrap();

    let transcript = messages(&outcome);
    assert_eq!(transcript.first().map(|m| m.role), Some(Role::System));
    assert_eq!(transcript.last().unwrap().content, "refund done");
    assert_eq!(*fx.refund.calls.lock().unwrap(), vec![json!({"amount": 50})]);
}

#[tokio::test]
async fn gated_call_suspends_then_accept_executes() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 300})),
        PlannerStep::finish("approved refund issued"),
    ]);

    let outcome = fx.engine.run(&s1(), input("refund 300")).await.unwrap();
    let EngineOutcome::Interrupted(interrupt) = outcome else {
        panic!("expected interrupt");
    };
    assert_eq!(interrupt.action_request.args, json!({"amount": 300}));
    assert!(fx.refund.calls.lock().unwrap().is_empty());
    assert!(fx.checkpoints.load(&s1()).await.unwrap().unwrap().pending.is_some());

    let outcome = fx.engine.resume(&s1(), Decision::Accept).await.unwrap();
    assert_eq!(messages(&outcome).last().unwrap().content, "approved refund issued");
    assert_eq!(*fx.refund.calls.lock().unwrap(), vec![json!({"amount": 300})]);

    let tool_message = fx.planner.last_seen().pop().unwrap();
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.content, "refunded 300");
    assert!(fx.checkpoints.load(&s1()).await.unwrap().unwrap().pending.is_none());
}

#[tokio::test]
async fn edit_executes_replacement_args() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 300})),
        PlannerStep::finish("done"),
    ]);
    fx.engine.run(&s1(), input("refund 300")).await.unwrap();

    fx.engine
        .resume(
            &s1(),
            Decision::Edit {
                args: json!({"amount": 120}),
            },
        )
        .await
        .unwrap();

    assert_eq!(*fx.refund.calls.lock().unwrap(), vec![json!({"amount": 120})]);
}

#[tokio::test]
async fn response_text_becomes_tool_result() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 300})),
        PlannerStep::finish("asked the customer"),
    ]);
    fx.engine.run(&s1(), input("refund 300")).await.unwrap();

    fx.engine
        .resume(
            &s1(),
            Decision::Response {
                args: "need a photo of the damage".into(),
            },
        )
        .await
        .unwrap();

    let tool_message = fx.planner.last_seen().pop().unwrap();
    assert_eq!(tool_message.content, "need a photo of the damage");
    assert!(fx.refund.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn chained_interrupts_pause_again_after_resume() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 300})),
        PlannerStep::call("refund", json!({"amount": 800})),
        PlannerStep::finish("both handled"),
    ]);
    fx.engine.run(&s1(), input("two refunds")).await.unwrap();

    let second = fx
        .engine
        .resume(&s1(), Decision::Reject { reason: None })
        .await
        .unwrap();
    let EngineOutcome::Interrupted(interrupt) = second else {
        panic!("expected second interrupt");
    };
    assert_eq!(interrupt.action_request.args, json!({"amount": 800}));

    let done = fx.engine.resume(&s1(), Decision::Accept).await.unwrap();
    assert_eq!(messages(&done).last().unwrap().content, "both handled");
    assert_eq!(*fx.refund.calls.lock().unwrap(), vec![json!({"amount": 800})]);
}

#[tokio::test]
async fn resume_without_pending_action_fails() {
    let fx = fixture([]);
    let err = fx.engine.resume(&s1(), Decision::Accept).await.unwrap_err();
    assert!(matches!(err, EngineError::NoPendingAction(id) if id == "u1:s1"));
}

#[tokio::test]
async fn fresh_run_discards_pending_action() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 300})),
        PlannerStep::finish("moved on"),
    ]);
    fx.engine.run(&s1(), input("refund 300")).await.unwrap();

    let outcome = fx.engine.run(&s1(), input("never mind")).await.unwrap();
    assert_eq!(messages(&outcome).last().unwrap().content, "moved on");
    assert!(fx.refund.calls.lock().unwrap().is_empty());

    let err = fx.engine.resume(&s1(), Decision::Accept).await.unwrap_err();
    assert!(matches!(err, EngineError::NoPendingAction(_)));

    let systems = messages(&outcome)
        .iter()
        .filter(|m| m.role == Role::System)
        .count();
    assert_eq!(systems, 1);
}

#[tokio::test]
async fn step_limit_surfaces_engine_error() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 1})),
        PlannerStep::call("refund", json!({"amount": 2})),
        PlannerStep::call("refund", json!({"amount": 3})),
    ]);
    let engine = fx.engine.with_max_steps(2);

    let err = engine.run(&s1(), input("loop")).await.unwrap_err();
    assert!(matches!(err, EngineError::StepLimit(2)));
}

#[tokio::test]
async fn planner_failure_surfaces_engine_error() {
    let fx = fixture([]);
    let err = fx.engine.run(&s1(), input("hi")).await.unwrap_err();
    assert!(matches!(err, EngineError::Planner(msg) if msg.contains("script exhausted")));
}

#[tokio::test]
async fn unknown_tool_result_is_fed_back() {
    let fx = fixture([
        PlannerStep::call("teleport", json!({})),
        PlannerStep::finish("could not"),
    ]);
    fx.engine.run(&s1(), input("teleport me")).await.unwrap();

    let tool_message = fx.planner.last_seen().pop().unwrap();
    assert_eq!(tool_message.content, "Tool 'teleport' not found");
}

#[tokio::test]
async fn same_session_id_is_isolated_per_user() {
    let fx = fixture([
        PlannerStep::call("refund", json!({"amount": 300})),
        PlannerStep::finish("order details"),
        PlannerStep::finish("alice refund issued"),
    ]);
    let alice = SessionKey::new("alice", "s1");
    let bob = SessionKey::new("bob", "s1");

    let outcome = fx.engine.run(&alice, input("refund 300")).await.unwrap();
    assert!(matches!(outcome, EngineOutcome::Interrupted(_)));

    let outcome = fx.engine.run(&bob, input("show my order")).await.unwrap();
    let bob_transcript = messages(&outcome);
    assert!(bob_transcript.iter().all(|m| m.content != "refund 300"));
    assert!(bob_transcript.iter().all(|m| m.role != Role::Tool));

    let done = fx.engine.resume(&alice, Decision::Accept).await.unwrap();
    assert_eq!(messages(&done).last().unwrap().content, "alice refund issued");
    assert_eq!(*fx.refund.calls.lock().unwrap(), vec![json!({"amount": 300})]);

    let err = fx.engine.resume(&bob, Decision::Accept).await.unwrap_err();
    assert!(matches!(err, EngineError::NoPendingAction(id) if id == "bob:s1"));
}

#[tokio::test]
async fn each_run_carries_latest_system_instruction() {
    let fx = fixture([PlannerStep::finish("first"), PlannerStep::finish("second")]);
    fx.engine.run(&s1(), input("hello")).await.unwrap();

    let outcome = fx
        .engine
        .run(
            &s1(),
            RunInput {
                system: "You handle refunds. Additional information about me: vip".into(),
                query: "again".into(),
            },
        )
        .await
        .unwrap();

    let systems: Vec<_> = messages(&outcome)
        .into_iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content)
        .collect();
    assert_eq!(
        systems,
        vec!["You handle refunds. Additional information about me: vip".to_string()]
    );
    assert_eq!(fx.planner.last_seen()[0].role, Role::System);
}
