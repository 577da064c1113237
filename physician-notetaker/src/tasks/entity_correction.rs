use async_trait::async_trait;
use note_flow::{Context, GraphError, NextAction, Result, Task, TaskResult};
use tracing::info;

use super::{PromptRunner, session_keys};
use crate::prompts::PromptTemplate;

/// Checks the first-pass extraction against the conversation, removing
/// hallucinated entities and adding missed ones.
pub struct EntityCorrectionTask {
    runner: PromptRunner,
}

impl EntityCorrectionTask {
    pub const ID: &'static str = "entity_correction";

    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Task for EntityCorrectionTask {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let conversation: String = context.require(session_keys::CONVERSATION).await?;
        let extracted: String = context.require(session_keys::EXTRACTED_ENTITIES).await?;
        info!(task_id = %self.id(), "correcting extracted entities");

        let corrected = self
            .runner
            .complete(
                PromptTemplate::EntityCorrection,
                &[
                    ("conversation", conversation.as_str()),
                    ("extracted_data", extracted.as_str()),
                ],
            )
            .await
            .map_err(|e| GraphError::TaskExecutionFailed(format!("Entity correction failed: {e}")))?;

        context.set(session_keys::FINAL_ENTITIES, &corrected).await?;

        Ok(TaskResult::new(Some(corrected), NextAction::End))
    }
}
