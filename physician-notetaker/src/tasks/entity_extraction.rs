use async_trait::async_trait;
use note_flow::{Context, GraphError, NextAction, Result, Task, TaskResult};
use tracing::info;

use super::{PromptRunner, session_keys};
use crate::prompts::PromptTemplate;

/// First-pass entity extraction. The output is kept as raw text for the corrector.
pub struct EntityExtractionTask {
    runner: PromptRunner,
}

impl EntityExtractionTask {
    pub const ID: &'static str = "entity_extraction";

    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Task for EntityExtractionTask {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let conversation: String = context.require(session_keys::CONVERSATION).await?;
        info!(task_id = %self.id(), "extracting medical entities");

        let extracted = self
            .runner
            .complete(
                PromptTemplate::EntityExtraction,
                &[("conversation", conversation.as_str())],
            )
            .await
            .map_err(|e| GraphError::TaskExecutionFailed(format!("Entity extraction failed: {e}")))?;

        info!(task_id = %self.id(), chars = extracted.len(), "first-pass extraction complete");
        context.set(session_keys::EXTRACTED_ENTITIES, &extracted).await?;

        Ok(TaskResult::new(None, NextAction::ContinueAndExecute))
    }
}
