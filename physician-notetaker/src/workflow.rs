use crate::models::MedicalVerdict;
use crate::tasks::*;
use note_flow::{Graph, GraphBuilder};
use std::sync::Arc;

pub const ENTITY_WORKFLOW_ID: &str = "entity_extraction";

/// validate → extract → correct.
///
/// The edge out of the validator only matches a `Medical` verdict, so a
/// non-medical conversation ends the run after one completion call.
pub fn build_entity_workflow(runner: PromptRunner) -> Graph {
    let validator = Arc::new(MedicalValidatorTask::new(runner.clone()));
    let extraction = Arc::new(EntityExtractionTask::new(runner.clone()));
    let correction = Arc::new(EntityCorrectionTask::new(runner));

    GraphBuilder::new(ENTITY_WORKFLOW_ID)
        .add_task(validator)
        .add_task(extraction)
        .add_task(correction)
        .add_conditional_edge(
            MedicalValidatorTask::ID,
            EntityExtractionTask::ID,
            |ctx| {
                matches!(
                    ctx.get_sync::<MedicalVerdict>(session_keys::VERDICT),
                    Some(MedicalVerdict::Medical)
                )
            },
        )
        .add_edge(EntityExtractionTask::ID, EntityCorrectionTask::ID)
        .build()
}
