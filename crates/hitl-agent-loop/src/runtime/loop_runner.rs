use super::planner::{Planner, PlannerStep};
use crate::contracts::storage::CheckpointStore;
use crate::contracts::tool::ToolMap;
use crate::contracts::{
    gen_call_id, Checkpoint, Decision, DecisionEngine, EngineError, EngineOutcome, Message,
    PendingAction, Role, RunInput, SessionKey, ToolCall, ToolDescriptor,
};
use crate::engine::protocol::resolve_decision;
use crate::engine::tool_execution::execute_call;
use async_trait::async_trait;
use hitl_extension_escalation::{ActionGateRegistry, GateDecision};
use serde_json::json;
use std::sync::Arc;

/// Planner steps allowed per `run`/`resume` call.
pub const DEFAULT_MAX_STEPS: usize = 16;

/// Tool-using engine that parks gated calls until a decision arrives.
///
/// Step budget is per call: a run may chain any number of interrupts across
/// resumes.
pub struct ToolLoopEngine {
    planner: Arc<dyn Planner>,
    tools: ToolMap,
    gates: ActionGateRegistry,
    checkpoints: Arc<dyn CheckpointStore>,
    max_steps: usize,
}

impl ToolLoopEngine {
    pub fn new(
        planner: Arc<dyn Planner>,
        tools: ToolMap,
        gates: ActionGateRegistry,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            planner,
            tools,
            gates,
            checkpoints,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|t| t.descriptor()).collect();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }

    async fn drive(
        &self,
        key: &SessionKey,
        mut checkpoint: Checkpoint,
    ) -> Result<EngineOutcome, EngineError> {
        let descriptors = self.descriptors();
        for _ in 0..self.max_steps {
            let step = self
                .planner
                .next_step(&checkpoint.messages, &descriptors)
                .await
                .map_err(|e| EngineError::Planner(e.to_string()))?;

            match step {
                PlannerStep::Finish(answer) => {
                    checkpoint.messages.push(Message::assistant(answer));
                    self.checkpoints.save(key, &checkpoint).await?;
                    log_transcript(key, &checkpoint.messages);
                    return Ok(EngineOutcome::Completed {
                        result: json!({ "messages": checkpoint.messages }),
                    });
                }
                PlannerStep::CallTool { name, arguments } => {
                    let call = ToolCall::new(gen_call_id(), name, arguments);
                    checkpoint
                        .messages
                        .push(Message::assistant_tool_call(call.clone()));

                    match self.gates.evaluate(&call) {
                        GateDecision::Proceed => {
                            let execution = execute_call(&self.tools, &call).await;
                            checkpoint
                                .messages
                                .push(Message::tool(execution.result.to_text(), call.id));
                        }
                        GateDecision::Suspend(interrupt) => {
                            checkpoint.pending =
                                Some(PendingAction::awaiting(call, interrupt.clone()));
                            self.checkpoints.save(key, &checkpoint).await?;
                            tracing::info!(
                                user_id = %key.user_id,
                                session_id = %key.session_id,
                                action = %interrupt.action_request.action,
                                "run suspended awaiting decision"
                            );
                            return Ok(EngineOutcome::Interrupted(interrupt));
                        }
                    }
                }
            }
        }

        self.checkpoints.save(key, &checkpoint).await?;
        Err(EngineError::StepLimit(self.max_steps))
    }
}

#[async_trait]
impl DecisionEngine for ToolLoopEngine {
    async fn run(&self, key: &SessionKey, input: RunInput) -> Result<EngineOutcome, EngineError> {
        let mut checkpoint = self.checkpoints.load(key).await?.unwrap_or_default();

        if let Some(stale) = checkpoint.pending.take() {
            tracing::info!(
                user_id = %key.user_id,
                session_id = %key.session_id,
                action = %stale.call.name,
                "fresh run discards pending action"
            );
            checkpoint.messages.push(Message::tool(
                "Request superseded by a new query; not executed.",
                stale.call.id,
            ));
        }
        refresh_system(&mut checkpoint.messages, input.system);
        checkpoint.messages.push(Message::user(input.query));

        self.drive(key, checkpoint).await
    }

    async fn resume(
        &self,
        key: &SessionKey,
        decision: Decision,
    ) -> Result<EngineOutcome, EngineError> {
        let mut checkpoint = self.checkpoints.load(key).await?.unwrap_or_default();
        let pending = checkpoint
            .pending
            .take()
            .ok_or_else(|| EngineError::NoPendingAction(key.to_string()))?;

        let kind = decision.kind();
        let resolution = resolve_decision(&pending, decision, &self.tools).await;
        tracing::info!(
            user_id = %key.user_id,
            session_id = %key.session_id,
            action = %pending.call.name,
            decision = kind,
            executed = resolution.executed.is_some(),
            "pending action resolved"
        );
        checkpoint
            .messages
            .push(Message::tool(resolution.content, pending.call.id));

        self.drive(key, checkpoint).await
    }

    async fn discard(&self, key: &SessionKey) -> Result<(), EngineError> {
        self.checkpoints.delete(key).await?;
        Ok(())
    }
}

/// The leading system message always carries the instruction of the latest run.
fn refresh_system(messages: &mut Vec<Message>, system: String) {
    match messages.first_mut() {
        Some(first) if first.role == Role::System => first.content = system,
        _ => messages.insert(0, Message::system(system)),
    }
}

fn log_transcript(key: &SessionKey, messages: &[Message]) {
    for (index, message) in messages.iter().enumerate() {
        match message.tool_calls.first() {
            Some(call) => tracing::debug!(
                session = %key,
                index,
                role = ?message.role,
                tool = %call.name,
                arguments = %call.arguments,
                "transcript"
            ),
            None => tracing::debug!(
                session = %key,
                index,
                role = ?message.role,
                content = %message.content,
                "transcript"
            ),
        }
    }
}
