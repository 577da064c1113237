use async_trait::async_trait;
use note_flow::{Context, GraphError, NextAction, Result, Task, TaskResult};
use tracing::{debug, info};

use super::{PromptRunner, session_keys};
use crate::{models::MedicalVerdict, prompts::PromptTemplate};

/// First stage of entity extraction: decides whether the conversation is medical.
///
/// The verdict is stored once in the context; the graph routes on it and the
/// pipeline reads it to build the final result.
pub struct MedicalValidatorTask {
    runner: PromptRunner,
}

impl MedicalValidatorTask {
    pub const ID: &'static str = "medical_validator";

    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Task for MedicalValidatorTask {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let conversation: String = context.require(session_keys::CONVERSATION).await?;
        info!(task_id = %self.id(), chars = conversation.len(), "validating conversation topic");

        let output = self
            .runner
            .complete(
                PromptTemplate::MedicalValidator,
                &[("conversation", conversation.as_str())],
            )
            .await
            .map_err(|e| GraphError::TaskExecutionFailed(format!("Medical validation failed: {e}")))?;

        let verdict = MedicalVerdict::from_validator_output(&output);
        debug!(task_id = %self.id(), output = %output.trim(), "validator replied");
        info!(task_id = %self.id(), verdict = ?verdict, "conversation classified");

        context.set(session_keys::VERDICT, verdict).await?;

        Ok(TaskResult::new(None, NextAction::ContinueAndExecute))
    }
}
