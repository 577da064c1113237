use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

use crate::error::NotetakerError;

/// User-facing explanation returned when the validator rejects a conversation
pub const NON_MEDICAL_MESSAGE: &str = "Sorry, I can only process medical conversations. I'm designed to extract medical information like symptoms, treatments, diagnoses, and prognosis from healthcare-related discussions.";

/// Marker the validator prompt asks the model to emit for non-medical input
pub const NON_MEDICAL_MARKER: &str = "NON_MEDICAL";

pub const UNPARSED_INTENT: &str = "Unable to parse";
pub const SOAP_REVIEW_NOTE: &str = "Please review raw output";

/// A full physician-patient transcript. Never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation(String);

impl Conversation {
    pub fn new(text: impl Into<String>) -> Result<Self, NotetakerError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(NotetakerError::EmptyConversation);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of the medical validation step, decided once from the validator output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicalVerdict {
    Medical,
    NonMedical,
}

impl MedicalVerdict {
    pub fn from_validator_output(output: &str) -> Self {
        if output.contains(NON_MEDICAL_MARKER) {
            MedicalVerdict::NonMedical
        } else {
            MedicalVerdict::Medical
        }
    }
}

/// The four clinical entity lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalEntities {
    #[serde(rename = "Symptoms", default)]
    pub symptoms: Vec<String>,
    #[serde(rename = "Treatment", default)]
    pub treatment: Vec<String>,
    #[serde(rename = "Diagnosis", default)]
    pub diagnosis: Vec<String>,
    #[serde(rename = "Prognosis", default)]
    pub prognosis: Vec<String>,
    /// Unparseable corrector output, kept for diagnostics
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl MedicalEntities {
    /// Empty lists, echoing the raw text when there was any
    pub fn fallback(raw_text: Option<String>) -> Self {
        Self {
            raw_text,
            ..Self::default()
        }
    }
}

/// Result of the entity-extraction pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityExtraction {
    /// The conversation was judged non-medical
    Rejected { message: String },
    Extracted {
        data: MedicalEntities,
        /// First-pass extraction text, before correction
        raw_extraction: String,
    },
}

impl EntityExtraction {
    pub fn rejected() -> Self {
        EntityExtraction::Rejected {
            message: NON_MEDICAL_MESSAGE.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EntityExtraction::Rejected { .. })
    }

    pub fn section(&self) -> SectionResult {
        match self {
            EntityExtraction::Rejected { message } => SectionResult {
                status: SectionStatus::Error,
                data: Value::Object(Map::new()),
                message: Some(message.clone()),
            },
            EntityExtraction::Extracted { data, .. } => SectionResult::success(data),
        }
    }
}

impl Serialize for EntityExtraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            error: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            message: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            data: Option<&'a MedicalEntities>,
            #[serde(skip_serializing_if = "Option::is_none")]
            raw_extraction: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            validation_status: Option<&'static str>,
        }

        let wire = match self {
            EntityExtraction::Rejected { message } => Wire {
                error: true,
                message: Some(message.as_str()),
                data: None,
                raw_extraction: None,
                validation_status: None,
            },
            EntityExtraction::Extracted {
                data,
                raw_extraction,
            } => Wire {
                error: false,
                message: None,
                data: Some(data),
                raw_extraction: Some(raw_extraction.as_str()),
                validation_status: Some("MEDICAL"),
            },
        };
        wire.serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(alias = "anxious", alias = "ANXIOUS")]
    Anxious,
    #[serde(alias = "neutral", alias = "NEUTRAL")]
    Neutral,
    #[serde(alias = "reassured", alias = "REASSURED")]
    Reassured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

/// Patient sentiment and intent as classified by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReport {
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentLabel,
    #[serde(rename = "Intent", default)]
    pub intent: Vec<String>,
    #[serde(
        rename = "Confidence",
        default,
        deserialize_with = "lenient_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<ConfidenceLevel>,
    #[serde(rename = "Patient_Quotes", default)]
    pub patient_quotes: Vec<String>,
}

/// An unrecognised confidence reads as absent rather than failing the report
fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<ConfidenceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedSentiment {
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentLabel,
    #[serde(rename = "Intent")]
    pub intent: Vec<String>,
    pub raw_output: String,
}

impl DegradedSentiment {
    pub fn new(raw_output: impl Into<String>) -> Self {
        Self {
            sentiment: SentimentLabel::Neutral,
            intent: vec![UNPARSED_INTENT.to_string()],
            raw_output: raw_output.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SentimentData {
    Report(SentimentReport),
    Degraded(DegradedSentiment),
}

/// One SOAP section: named fields as the template defines them
pub type SoapSection = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoapNote {
    #[serde(rename = "Subjective", default)]
    pub subjective: SoapSection,
    #[serde(rename = "Objective", default)]
    pub objective: SoapSection,
    #[serde(rename = "Assessment", default)]
    pub assessment: SoapSection,
    #[serde(rename = "Plan", default)]
    pub plan: SoapSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedSoapNote {
    pub raw_output: String,
    pub note: String,
}

impl DegradedSoapNote {
    pub fn new(raw_output: impl Into<String>) -> Self {
        Self {
            raw_output: raw_output.into(),
            note: SOAP_REVIEW_NOTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SoapNoteData {
    Note(SoapNote),
    Degraded(DegradedSoapNote),
}

/// Output of a single-stage pipeline. Parse failures are not errors, so
/// `error` stays false on both the parsed and the degraded path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutput<T> {
    pub error: bool,
    pub data: T,
}

impl<T: Serialize> AnalysisOutput<T> {
    pub fn success(data: T) -> Self {
        Self { error: false, data }
    }

    pub fn section(&self) -> SectionResult {
        SectionResult::success(&self.data)
    }
}

pub type SentimentAnalysis = AnalysisOutput<SentimentData>;
pub type SoapNoteAnalysis = AnalysisOutput<SoapNoteData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Success,
    Error,
}

/// One section of the full-analysis response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionResult {
    pub status: SectionStatus,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SectionResult {
    fn success(data: &impl Serialize) -> Self {
        Self {
            status: SectionStatus::Success,
            data: serde_json::to_value(data).unwrap_or(Value::Null),
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullAnalysis {
    pub ner_extraction: SectionResult,
    pub sentiment_analysis: SectionResult,
    pub soap_note: SectionResult,
}

/// Raw pipeline outputs, keyed by the pipelines that ran
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuickAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ner: Option<EntityExtraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soap: Option<SoapNoteAnalysis>,
}

/// Pipeline selector for quick analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisType {
    Ner,
    Sentiment,
    Soap,
    #[default]
    All,
}

impl AnalysisType {
    pub fn includes_ner(self) -> bool {
        matches!(self, AnalysisType::Ner | AnalysisType::All)
    }

    pub fn includes_sentiment(self) -> bool {
        matches!(self, AnalysisType::Sentiment | AnalysisType::All)
    }

    pub fn includes_soap(self) -> bool {
        matches!(self, AnalysisType::Soap | AnalysisType::All)
    }
}

impl FromStr for AnalysisType {
    type Err = NotetakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ner" => Ok(AnalysisType::Ner),
            "sentiment" => Ok(AnalysisType::Sentiment),
            "soap" => Ok(AnalysisType::Soap),
            "all" => Ok(AnalysisType::All),
            other => Err(NotetakerError::UnknownAnalysisType(other.to_string())),
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisType::Ner => "ner",
            AnalysisType::Sentiment => "sentiment",
            AnalysisType::Soap => "soap",
            AnalysisType::All => "all",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub conversation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuickAnalyzeRequest {
    #[serde(default)]
    pub conversation: String,
    #[serde(rename = "type", default)]
    pub analysis_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
