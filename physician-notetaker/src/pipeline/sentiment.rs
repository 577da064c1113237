use tracing::{info, warn};

use crate::{
    error::Result,
    models::{Conversation, DegradedSentiment, SentimentAnalysis, SentimentData, SentimentReport},
    parser::parse_json,
    prompts::PromptTemplate,
    tasks::PromptRunner,
};

pub struct SentimentPipeline {
    runner: PromptRunner,
}

impl SentimentPipeline {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }

    pub async fn process(&self, conversation: &Conversation) -> Result<SentimentAnalysis> {
        let raw = self
            .runner
            .complete(
                PromptTemplate::SentimentAnalysis,
                &[("conversation", conversation.as_str())],
            )
            .await?;

        let data = match parse_json::<SentimentReport>(Some(raw.as_str())) {
            Ok(report) => {
                info!(pipeline = "sentiment", sentiment = ?report.sentiment, "sentiment classified");
                SentimentData::Report(report)
            }
            Err(fallback) => {
                warn!(pipeline = "sentiment", reason = %fallback.reason, "sentiment output unparseable");
                SentimentData::Degraded(DegradedSentiment::new(raw))
            }
        };

        Ok(SentimentAnalysis::success(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        completion::CompletionError,
        error::NotetakerError,
        models::SentimentLabel,
        prompts::PromptStore,
        testing::*,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn pipeline(client: &Arc<ScriptedCompletionClient>) -> SentimentPipeline {
        SentimentPipeline::new(PromptRunner::new(
            client.clone(),
            Arc::new(PromptStore::new().unwrap()),
            test_options(),
        ))
    }

    fn conversation() -> Conversation {
        Conversation::new(MEDICAL_CONVERSATION).unwrap()
    }

    #[tokio::test]
    async fn parses_well_formed_report() {
        let client = Arc::new(ScriptedCompletionClient::medical());
        let result = pipeline(&client).process(&conversation()).await.unwrap();

        assert!(!result.error);
        match result.data {
            SentimentData::Report(report) => {
                assert_eq!(report.sentiment, SentimentLabel::Reassured);
                assert_eq!(report.patient_quotes, vec!["That's a relief!"]);
            }
            other => panic!("expected a report, got {other:?}"),
        }
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn not_json_degrades_to_neutral() {
        let client = Arc::new(ScriptedCompletionClient::new().respond(SENTIMENT, "not json"));
        let result = pipeline(&client).process(&conversation()).await.unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "error": false,
                "data": {
                    "Sentiment": "Neutral",
                    "Intent": ["Unable to parse"],
                    "raw_output": "not json"
                }
            })
        );
    }

    #[tokio::test]
    async fn label_outside_vocabulary_degrades() {
        let client = Arc::new(
            ScriptedCompletionClient::new()
                .respond(SENTIMENT, r#"{"Sentiment": "Anxious OR Neutral", "Intent": []}"#),
        );
        let result = pipeline(&client).process(&conversation()).await.unwrap();
        assert!(matches!(result.data, SentimentData::Degraded(_)));
    }

    #[tokio::test]
    async fn completion_failure_is_an_error() {
        let client = Arc::new(
            ScriptedCompletionClient::new()
                .fail(SENTIMENT, CompletionError::Service("invalid api key".into())),
        );
        let err = pipeline(&client).process(&conversation()).await.unwrap_err();
        assert!(matches!(err, NotetakerError::Completion(CompletionError::Service(_))));
    }
}
