use std::sync::Arc;

use tracing::debug;

use crate::{
    completion::{CompletionClient, CompletionOptions},
    error::Result,
    prompts::{PromptStore, PromptTemplate},
};

/// Renders a prompt template and sends it to the shared completion client.
///
/// Cheap to clone; every pipeline and task holds its own copy of the handles.
#[derive(Clone)]
pub struct PromptRunner {
    client: Arc<dyn CompletionClient>,
    prompts: Arc<PromptStore>,
    options: CompletionOptions,
}

impl PromptRunner {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        prompts: Arc<PromptStore>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            client,
            prompts,
            options,
        }
    }

    pub async fn complete(
        &self,
        template: PromptTemplate,
        variables: &[(&str, &str)],
    ) -> Result<String> {
        let prompt = self.prompts.render(template, variables)?;
        debug!(template = template.name(), prompt_chars = prompt.len(), "prompt rendered");
        let response = self.client.complete(&prompt, &self.options).await?;
        Ok(response)
    }
}
