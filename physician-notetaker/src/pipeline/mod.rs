//! The three analysis pipelines and the [`NoteTaker`] that runs them.

pub mod entities;
pub mod sentiment;
pub mod soap;

pub use entities::EntityExtractionPipeline;
pub use sentiment::SentimentPipeline;
pub use soap::SoapNotePipeline;

use std::sync::Arc;

use tracing::info;

use crate::{
    completion::{CompletionClient, CompletionOptions, RigCompletionClient},
    config::LlmConfig,
    error::Result,
    models::{
        AnalysisType, Conversation, EntityExtraction, FullAnalysis, QuickAnalysis,
        SentimentAnalysis, SoapNoteAnalysis,
    },
    prompts::PromptStore,
    tasks::PromptRunner,
};

/// Runs the pipelines against one shared completion client.
///
/// Built once at startup. Holds no per-request state, so a single instance
/// serves concurrent requests.
pub struct NoteTaker {
    entities: EntityExtractionPipeline,
    sentiment: SentimentPipeline,
    soap: SoapNotePipeline,
}

impl NoteTaker {
    pub fn new(client: Arc<dyn CompletionClient>, options: CompletionOptions) -> Result<Self> {
        let prompts = Arc::new(PromptStore::new()?);
        let runner = PromptRunner::new(client, prompts, options);

        Ok(Self {
            entities: EntityExtractionPipeline::new(runner.clone()),
            sentiment: SentimentPipeline::new(runner.clone()),
            soap: SoapNotePipeline::new(runner),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = RigCompletionClient::from_config(config)?;
        info!(provider = %config.provider, model = %config.model, "completion client ready");
        Self::new(Arc::new(client), CompletionOptions::from(config))
    }

    pub async fn extract_entities(&self, conversation: &Conversation) -> Result<EntityExtraction> {
        self.entities.process(conversation).await
    }

    pub async fn analyze_sentiment(&self, conversation: &Conversation) -> Result<SentimentAnalysis> {
        self.sentiment.process(conversation).await
    }

    pub async fn generate_soap_note(&self, conversation: &Conversation) -> Result<SoapNoteAnalysis> {
        self.soap.process(conversation).await
    }

    /// Run all three pipelines concurrently and fold them into response sections
    pub async fn full_analysis(&self, conversation: &Conversation) -> Result<FullAnalysis> {
        info!(chars = conversation.len(), "running full analysis");

        let (ner, sentiment, soap) = tokio::try_join!(
            self.extract_entities(conversation),
            self.analyze_sentiment(conversation),
            self.generate_soap_note(conversation),
        )?;

        Ok(FullAnalysis {
            ner_extraction: ner.section(),
            sentiment_analysis: sentiment.section(),
            soap_note: soap.section(),
        })
    }

    /// Run only the selected pipelines, returning their raw outputs
    pub async fn quick_analysis(
        &self,
        conversation: &Conversation,
        analysis_type: AnalysisType,
    ) -> Result<QuickAnalysis> {
        info!(chars = conversation.len(), analysis_type = %analysis_type, "running quick analysis");

        let ner = async {
            if analysis_type.includes_ner() {
                self.extract_entities(conversation).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let sentiment = async {
            if analysis_type.includes_sentiment() {
                self.analyze_sentiment(conversation).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let soap = async {
            if analysis_type.includes_soap() {
                self.generate_soap_note(conversation).await.map(Some)
            } else {
                Ok(None)
            }
        };

        let (ner, sentiment, soap) = tokio::try_join!(ner, sentiment, soap)?;
        Ok(QuickAnalysis {
            ner,
            sentiment,
            soap,
        })
    }
}
