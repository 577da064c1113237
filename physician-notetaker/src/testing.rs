//! Test doubles shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    completion::{CompletionClient, CompletionError, CompletionOptions},
    pipeline::NoteTaker,
};

// Phrases that identify each prompt template.
pub const VALIDATOR: &str = "medical conversation validator";
pub const EXTRACTOR: &str = "medical NER extraction system";
pub const CORRECTOR: &str = "medical data validator";
pub const SENTIMENT: &str = "medical sentiment analysis expert";
pub const SOAP: &str = "medical documentation specialist";

pub const MEDICAL_CONVERSATION: &str = "Physician: How are you feeling today?\n\
Patient: My neck and back still hurt since the car accident, I had ten physiotherapy sessions.\n\
Physician: Your range of motion is good, I expect a full recovery within six months.\n\
Patient: That's a relief!";

pub const CORRECTED_ENTITIES: &str = r#"{
  "Symptoms": ["neck pain", "back pain"],
  "Treatment": ["physiotherapy"],
  "Diagnosis": ["whiplash injury"],
  "Prognosis": ["full recovery expected"]
}"#;

pub const SENTIMENT_REPORT: &str = r#"{
  "Sentiment": "Reassured",
  "Intent": ["Reporting symptoms", "Acknowledging improvement"],
  "Confidence": "High",
  "Patient_Quotes": ["That's a relief!"]
}"#;

pub const SOAP_REPORT: &str = r#"{
  "Subjective": {"Chief_Complaint": "Neck and back pain"},
  "Objective": {"Physical_Exam": "Full range of motion"},
  "Assessment": {"Diagnosis": "Whiplash injury"},
  "Plan": {"Follow_Up": "Return if symptoms worsen"}
}"#;

/// Completion client that answers by matching phrases in the prompt and
/// records every prompt it receives.
#[derive(Default)]
pub struct ScriptedCompletionClient {
    rules: Vec<(String, Result<String, CompletionError>)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that answers every template with a well-formed medical reply
    pub fn medical() -> Self {
        Self::new()
            .respond(VALIDATOR, "MEDICAL")
            .respond(EXTRACTOR, r#"{"Symptoms": ["neck pain"], "Treatment": [], "Diagnosis": [], "Prognosis": []}"#)
            .respond(CORRECTOR, CORRECTED_ENTITIES)
            .respond(SENTIMENT, SENTIMENT_REPORT)
            .respond(SOAP, SOAP_REPORT)
    }

    /// Rules are checked in insertion order, so replace an existing rule
    /// rather than adding a second one for the same phrase.
    pub fn respond(mut self, needle: &str, reply: &str) -> Self {
        self.set_rule(needle, Ok(reply.to_string()));
        self
    }

    pub fn fail(mut self, needle: &str, error: CompletionError) -> Self {
        self.set_rule(needle, Err(error));
        self
    }

    fn set_rule(&mut self, needle: &str, outcome: Result<String, CompletionError>) {
        match self.rules.iter_mut().find(|(n, _)| n == needle) {
            Some(rule) => rule.1 = outcome,
            None => self.rules.push((needle.to_string(), outcome)),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Err(CompletionError::Service("no scripted reply".to_string())))
    }
}

pub fn test_options() -> CompletionOptions {
    CompletionOptions {
        model: "test-model".to_string(),
        temperature: 0.0,
        max_tokens: 2048,
    }
}

pub fn notetaker(client: &Arc<ScriptedCompletionClient>) -> NoteTaker {
    NoteTaker::new(client.clone(), test_options()).unwrap()
}
