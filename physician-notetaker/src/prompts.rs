//! Prompt template store.
//!
//! Templates are tera sources registered once at startup. Rendering is a pure
//! function of the template and its variables, and substituted values are
//! never parsed as template syntax.

use tera::Tera;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{template}' requires variable '{variable}'")]
    MissingVariable {
        template: &'static str,
        variable: &'static str,
    },

    #[error("failed to render template '{template}': {source}")]
    Render {
        template: &'static str,
        #[source]
        source: tera::Error,
    },

    #[error("invalid prompt template source: {0}")]
    Invalid(#[from] tera::Error),
}

/// Example output embedded in the extraction prompt
pub const ENTITY_EXAMPLE_OUTPUT: &str = r#"{
  "Symptoms": ["neck pain", "back pain"],
  "Treatment": ["physiotherapy"],
  "Diagnosis": ["whiplash injury"],
  "Prognosis": ["full recovery expected"]
}"#;

const MEDICAL_VALIDATOR: &str = r#"You are a medical conversation validator.

Determine if the following conversation is related to medical/healthcare topics.

Conversation:
{{ conversation }}

Respond with ONLY one word: "MEDICAL" or "NON_MEDICAL"

Response:"#;

const ENTITY_EXTRACTION: &str = r#"You are a medical NER extraction system. Extract entities and return ONLY valid JSON.

**Extract these entities from the conversation:**
- Symptoms: Physical complaints, pain, discomfort
- Treatment: Medications, therapies, procedures
- Diagnosis: Medical conditions identified
- Prognosis: Recovery predictions, future outcomes

**Conversation:**
{{ conversation }}

**CRITICAL INSTRUCTIONS:**
- Return ONLY the JSON object, NO explanatory text
- NO markdown code blocks
- Start your response with { and end with }
- If no entity found, use empty array []

**Example Output Format:**
{
  "Symptoms": ["neck pain", "back pain"],
  "Treatment": ["physiotherapy"],
  "Diagnosis": ["whiplash injury"],
  "Prognosis": ["full recovery expected"]
}

Now extract from the conversation above. Return ONLY the JSON:"#;

const ENTITY_CORRECTION: &str = r#"You are a medical data validator. Verify extracted NER data and return corrected JSON.

**Original Conversation:**
{{ conversation }}

**Extracted Data to Validate:**
{{ extracted_data }}

**Your Task:**
1. Verify all entities exist in the conversation
2. Remove any hallucinated information
3. Add any missing entities
4. Return corrected JSON

**CRITICAL INSTRUCTIONS:**
- Return ONLY the JSON object, NO explanatory text
- NO markdown, NO "```json" tags, NO commentary
- Start with { and end with }
- Use exact medical terms from conversation

**Required JSON Format:**
{
  "Symptoms": ["list"],
  "Treatment": ["list"],
  "Diagnosis": ["list"],
  "Prognosis": ["list"]
}

Return ONLY the corrected JSON now:"#;

const SENTIMENT_ANALYSIS: &str = r#"You are a medical sentiment analysis expert. Analyze the patient's emotional state and intent.

**Conversation:**
{{ conversation }}

**Task:**
Analyze ONLY the patient's statements (not the physician's) to determine:

1. **Sentiment Classification:**
   - Anxious: Patient expresses worry, fear, concern, or distress
   - Neutral: Patient shows calm, matter-of-fact responses without strong emotion
   - Reassured: Patient expresses relief, comfort, or confidence

2. **Intent Detection:**
   - "Seeking reassurance": Patient wants confirmation things will be okay
   - "Reporting symptoms": Patient describing medical issues
   - "Expressing concern": Patient worried about health outcomes
   - "Asking questions": Patient seeking information
   - "Acknowledging improvement": Patient noting positive progress

**Instructions:**
- Focus on patient dialogue only
- Choose the MOST DOMINANT sentiment if multiple are present
- List ALL applicable intents
- Base analysis on explicit statements, not assumptions

**Output Format (STRICT JSON):**
{
  "Sentiment": "Anxious OR Neutral OR Reassured",
  "Intent": ["list of detected intents"],
  "Confidence": "High OR Medium OR Low",
  "Patient_Quotes": ["key quotes supporting the sentiment"]
}

JSON Output:"#;

const SOAP_NOTE: &str = r#"You are an expert medical documentation specialist. Generate a structured SOAP note from this physician-patient conversation.

**SOAP Format:**
- **Subjective**: Patient's complaints, symptoms, history (what patient says)
- **Objective**: Physical examination findings, observations (what physician observes)
- **Assessment**: Diagnosis, medical interpretation
- **Plan**: Treatment recommendations, follow-up

**Conversation:**
{{ conversation }}

**Instructions:**
- Extract ONLY information explicitly stated in the conversation
- Use professional medical terminology
- Be concise but comprehensive
- Organize chronologically within each section
- Include specific details (dates, numbers, durations)

**Output Format (STRICT JSON):**
{
  "Subjective": {
    "Chief_Complaint": "primary reason for visit",
    "History_of_Present_Illness": "detailed patient narrative",
    "Review_of_Systems": "additional symptoms or concerns"
  },
  "Objective": {
    "Physical_Exam": "examination findings",
    "Observations": "physician observations",
    "Vitals": "if mentioned"
  },
  "Assessment": {
    "Diagnosis": "confirmed diagnosis",
    "Severity": "condition severity",
    "Clinical_Impression": "physician's assessment"
  },
  "Plan": {
    "Treatment": "treatment given or recommended",
    "Medications": "if applicable",
    "Follow_Up": "follow-up instructions",
    "Prognosis": "expected outcome"
  }
}

JSON Output:"#;

/// The fixed set of prompts the pipelines use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTemplate {
    MedicalValidator,
    EntityExtraction,
    EntityCorrection,
    SentimentAnalysis,
    SoapNote,
}

impl PromptTemplate {
    pub const ALL: [PromptTemplate; 5] = [
        PromptTemplate::MedicalValidator,
        PromptTemplate::EntityExtraction,
        PromptTemplate::EntityCorrection,
        PromptTemplate::SentimentAnalysis,
        PromptTemplate::SoapNote,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PromptTemplate::MedicalValidator => "medical_validator",
            PromptTemplate::EntityExtraction => "entity_extraction",
            PromptTemplate::EntityCorrection => "entity_correction",
            PromptTemplate::SentimentAnalysis => "sentiment_analysis",
            PromptTemplate::SoapNote => "soap_note",
        }
    }

    /// Placeholders that must be supplied, in template order
    pub fn input_variables(self) -> &'static [&'static str] {
        match self {
            PromptTemplate::EntityCorrection => &["conversation", "extracted_data"],
            _ => &["conversation"],
        }
    }

    fn source(self) -> &'static str {
        match self {
            PromptTemplate::MedicalValidator => MEDICAL_VALIDATOR,
            PromptTemplate::EntityExtraction => ENTITY_EXTRACTION,
            PromptTemplate::EntityCorrection => ENTITY_CORRECTION,
            PromptTemplate::SentimentAnalysis => SENTIMENT_ANALYSIS,
            PromptTemplate::SoapNote => SOAP_NOTE,
        }
    }
}

pub struct PromptStore {
    tera: Tera,
}

impl PromptStore {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(PromptTemplate::ALL.iter().map(|t| (t.name(), t.source())))?;
        Ok(Self { tera })
    }

    /// Render `template`, failing if any of its input variables is not supplied
    pub fn render(
        &self,
        template: PromptTemplate,
        variables: &[(&str, &str)],
    ) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        for &variable in template.input_variables() {
            let value = variables
                .iter()
                .find(|(name, _)| *name == variable)
                .map(|(_, value)| *value)
                .ok_or(TemplateError::MissingVariable {
                    template: template.name(),
                    variable,
                })?;
            context.insert(variable, value);
        }

        self.tera
            .render(template.name(), &context)
            .map_err(|source| TemplateError::Render {
                template: template.name(),
                source,
            })
    }

    pub fn render_conversation(
        &self,
        template: PromptTemplate,
        conversation: &str,
    ) -> Result<String, TemplateError> {
        self.render(template, &[("conversation", conversation)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONVERSATION: &str = "Physician: How are you feeling?\nPatient: My neck still hurts.";

    #[test]
    fn every_template_compiles_and_renders() {
        let store = PromptStore::new().unwrap();
        for template in PromptTemplate::ALL {
            let variables: Vec<(&str, &str)> = template
                .input_variables()
                .iter()
                .map(|name| (*name, "value"))
                .collect();
            let rendered = store.render(template, &variables).unwrap();
            assert!(!rendered.contains("{{"), "{} left a placeholder", template.name());
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let store = PromptStore::new().unwrap();
        let first = store
            .render_conversation(PromptTemplate::SoapNote, CONVERSATION)
            .unwrap();
        let second = store
            .render_conversation(PromptTemplate::SoapNote, CONVERSATION)
            .unwrap();
        assert_eq!(first, second);
        assert!(first.contains(CONVERSATION));
    }

    #[test]
    fn corrector_requires_extracted_data() {
        let store = PromptStore::new().unwrap();
        let err = store
            .render_conversation(PromptTemplate::EntityCorrection, CONVERSATION)
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingVariable {
                template: "entity_correction",
                variable: "extracted_data"
            }
        ));
    }

    #[test]
    fn corrector_embeds_both_inputs() {
        let store = PromptStore::new().unwrap();
        let rendered = store
            .render(
                PromptTemplate::EntityCorrection,
                &[
                    ("conversation", CONVERSATION),
                    ("extracted_data", r#"{"Symptoms": ["neck pain"]}"#),
                ],
            )
            .unwrap();
        assert!(rendered.contains(CONVERSATION));
        assert!(rendered.contains(r#"{"Symptoms": ["neck pain"]}"#));
    }

    #[test]
    fn template_syntax_in_conversation_is_kept_verbatim() {
        let store = PromptStore::new().unwrap();
        let tricky = "Patient: I typed {{ secret }} and {% if x %} by accident";
        let rendered = store
            .render_conversation(PromptTemplate::MedicalValidator, tricky)
            .unwrap();
        assert!(rendered.contains(tricky));
    }

    #[test]
    fn extraction_prompt_shows_the_example_output() {
        let store = PromptStore::new().unwrap();
        let rendered = store
            .render_conversation(PromptTemplate::EntityExtraction, CONVERSATION)
            .unwrap();
        assert!(rendered.contains(ENTITY_EXAMPLE_OUTPUT));
    }
}
