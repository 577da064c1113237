use tracing::{info, warn};

use crate::{
    error::Result,
    models::{Conversation, DegradedSoapNote, SoapNote, SoapNoteAnalysis, SoapNoteData},
    parser::parse_json,
    prompts::PromptTemplate,
    tasks::PromptRunner,
};

pub struct SoapNotePipeline {
    runner: PromptRunner,
}

impl SoapNotePipeline {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }

    pub async fn process(&self, conversation: &Conversation) -> Result<SoapNoteAnalysis> {
        let raw = self
            .runner
            .complete(
                PromptTemplate::SoapNote,
                &[("conversation", conversation.as_str())],
            )
            .await?;

        let data = match parse_json::<SoapNote>(Some(raw.as_str())) {
            Ok(note) => {
                info!(pipeline = "soap", "SOAP note generated");
                SoapNoteData::Note(note)
            }
            Err(fallback) => {
                warn!(pipeline = "soap", reason = %fallback.reason, "SOAP output unparseable");
                SoapNoteData::Degraded(DegradedSoapNote::new(raw))
            }
        };

        Ok(SoapNoteAnalysis::success(data))
    }
}
