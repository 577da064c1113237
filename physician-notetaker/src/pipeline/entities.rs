use std::sync::Arc;

use note_flow::{Context, Graph};
use tracing::{info, warn};

use crate::{
    error::Result,
    models::{Conversation, EntityExtraction, MedicalEntities, MedicalVerdict},
    parser::parse_json,
    tasks::{PromptRunner, session_keys},
    workflow::build_entity_workflow,
};

/// Three-stage entity extraction run as a task graph
pub struct EntityExtractionPipeline {
    graph: Arc<Graph>,
}

impl EntityExtractionPipeline {
    pub fn new(runner: PromptRunner) -> Self {
        Self {
            graph: Arc::new(build_entity_workflow(runner)),
        }
    }

    pub async fn process(&self, conversation: &Conversation) -> Result<EntityExtraction> {
        let context = Context::new();
        context
            .set(session_keys::CONVERSATION, conversation.as_str())
            .await?;

        let execution = self.graph.execute(context.clone()).await?;
        info!(pipeline = "ner", path = ?execution.path, "entity workflow finished");

        let verdict: MedicalVerdict = context.require(session_keys::VERDICT).await?;
        if verdict == MedicalVerdict::NonMedical {
            info!(pipeline = "ner", "conversation rejected as non-medical");
            return Ok(EntityExtraction::rejected());
        }

        let raw_extraction: String = context.require(session_keys::EXTRACTED_ENTITIES).await?;
        let final_text: Option<String> = context.get(session_keys::FINAL_ENTITIES).await;

        let data = parse_json::<MedicalEntities>(final_text.as_deref()).unwrap_or_else(|fallback| {
            warn!(pipeline = "ner", reason = %fallback.reason, "corrected entities unparseable, using empty lists");
            MedicalEntities::fallback(fallback.raw)
        });

        Ok(EntityExtraction::Extracted {
            data,
            raw_extraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        completion::CompletionError,
        error::NotetakerError,
        models::NON_MEDICAL_MESSAGE,
        prompts::{ENTITY_EXAMPLE_OUTPUT, PromptStore},
        testing::*,
    };
    use serde_json::json;

    fn pipeline(client: &Arc<ScriptedCompletionClient>) -> EntityExtractionPipeline {
        let runner = PromptRunner::new(
            client.clone(),
            Arc::new(PromptStore::new().unwrap()),
            test_options(),
        );
        EntityExtractionPipeline::new(runner)
    }

    fn conversation(text: &str) -> Conversation {
        Conversation::new(text).unwrap()
    }

    #[tokio::test]
    async fn non_medical_conversation_stops_after_validation() {
        let client = Arc::new(ScriptedCompletionClient::medical().respond(VALIDATOR, "NON_MEDICAL"));
        let result = pipeline(&client)
            .process(&conversation(
                "I have no idea what you mean, let's talk about cars",
            ))
            .await
            .unwrap();

        assert_eq!(result, EntityExtraction::rejected());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["error"], true);
        assert_eq!(value["message"], NON_MEDICAL_MESSAGE);
        assert!(value.get("data").is_none());

        assert_eq!(client.calls(), 1);
        assert_eq!(client.calls_matching(EXTRACTOR), 0);
    }

    #[tokio::test]
    async fn example_output_passes_through_unchanged() {
        let client = Arc::new(
            ScriptedCompletionClient::medical()
                .respond(EXTRACTOR, ENTITY_EXAMPLE_OUTPUT)
                .respond(CORRECTOR, ENTITY_EXAMPLE_OUTPUT),
        );
        let result = pipeline(&client)
            .process(&conversation(MEDICAL_CONVERSATION))
            .await
            .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["error"], false);
        assert_eq!(value["validation_status"], "MEDICAL");
        assert_eq!(value["raw_extraction"], ENTITY_EXAMPLE_OUTPUT);
        assert_eq!(
            value["data"],
            serde_json::from_str::<serde_json::Value>(ENTITY_EXAMPLE_OUTPUT).unwrap()
        );
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn corrector_sees_conversation_and_first_pass() {
        let first_pass = r#"{"Symptoms": ["headache"]}"#;
        let client = Arc::new(ScriptedCompletionClient::medical().respond(EXTRACTOR, first_pass));
        pipeline(&client)
            .process(&conversation(MEDICAL_CONVERSATION))
            .await
            .unwrap();

        let prompts = client.prompts();
        let corrector_prompt = prompts
            .iter()
            .find(|p| p.contains(CORRECTOR))
            .expect("corrector was called");
        assert!(corrector_prompt.contains(MEDICAL_CONVERSATION));
        assert!(corrector_prompt.contains(first_pass));
    }

    #[tokio::test]
    async fn unparseable_correction_falls_back_to_empty_lists() {
        let client = Arc::new(
            ScriptedCompletionClient::medical().respond(CORRECTOR, "Here are the entities: neck pain"),
        );
        let result = pipeline(&client)
            .process(&conversation(MEDICAL_CONVERSATION))
            .await
            .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["error"], false);
        assert_eq!(
            value["data"],
            json!({
                "Symptoms": [],
                "Treatment": [],
                "Diagnosis": [],
                "Prognosis": [],
                "raw_text": "Here are the entities: neck pain"
            })
        );
    }

    #[tokio::test]
    async fn missing_lists_are_filled_in() {
        let client = Arc::new(
            ScriptedCompletionClient::medical().respond(CORRECTOR, r#"{"Symptoms": ["back pain"]}"#),
        );
        let result = pipeline(&client)
            .process(&conversation(MEDICAL_CONVERSATION))
            .await
            .unwrap();

        match result {
            EntityExtraction::Extracted { data, .. } => {
                assert_eq!(data.symptoms, vec!["back pain"]);
                assert!(data.treatment.is_empty());
                assert!(data.prognosis.is_empty());
                assert_eq!(data.raw_text, None);
            }
            other => panic!("expected extraction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let client = Arc::new(
            ScriptedCompletionClient::medical()
                .fail(EXTRACTOR, CompletionError::Transport("connection reset".into())),
        );
        let err = pipeline(&client)
            .process(&conversation(MEDICAL_CONVERSATION))
            .await
            .unwrap_err();

        assert!(matches!(err, NotetakerError::Workflow(_)));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(client.calls_matching(CORRECTOR), 0);
    }
}
