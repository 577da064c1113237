pub mod entity_correction;
pub mod entity_extraction;
pub mod medical_validator;
pub mod utils;

pub use entity_correction::EntityCorrectionTask;
pub use entity_extraction::EntityExtractionTask;
pub use medical_validator::MedicalValidatorTask;
pub use utils::PromptRunner;

/// Keys the entity-extraction tasks read and write in the graph context
pub mod session_keys {
    pub const CONVERSATION: &str = "conversation";
    pub const VERDICT: &str = "verdict";
    pub const EXTRACTED_ENTITIES: &str = "extracted_entities";
    pub const FINAL_ENTITIES: &str = "final_entities";
}
