use std::path::PathBuf;

use anyhow::Context as _;
use physician_notetaker::{Config, Conversation, NoteTaker, telemetry::init_tracing};
use serde_json::json;
use tracing::{info, warn};

const OUTPUT_PATH: &str = "output_results.json";

const SAMPLE_CONSULTATION: &str = "\
Physician: Good morning, Ms. Jones. How are you feeling today?

Patient: Good morning, doctor. I'm doing better, but I still have some discomfort now and then.

Physician: I understand you were in a car accident last September. Can you walk me through what happened?

Patient: Yes, it was on September 1st, around 12:30 in the afternoon. I was driving from Cheadle Hulme to Manchester when I had to stop in traffic. Out of nowhere, another car hit me from behind, which pushed my car into the one in front.

Physician: That sounds like a strong impact. Were you wearing your seatbelt?

Patient: Yes, I always do.

Physician: What did you feel immediately after the accident?

Patient: At first, I was just shocked. But then I realized I had hit my head on the steering wheel, and I could feel pain in my neck and back almost right away.

Physician: Did you seek medical attention at that time?

Patient: Yes, I went to Moss Bank Accident and Emergency. They checked me over and said it was a whiplash injury, but they didn't do any X-rays. They just gave me some advice and sent me home.

Physician: How did things progress after that?

Patient: The first four weeks were rough. My neck and back pain were really bad, I had trouble sleeping and had to take painkillers regularly. It started improving after that, but I had to go through ten sessions of physiotherapy to help with the stiffness and discomfort.

Physician: That makes sense. Are you still experiencing pain now?

Patient: It's not constant, but I do get occasional backaches. It's nothing like before, though.

Physician: That's good to hear. Have you noticed any other effects, like anxiety while driving or difficulty concentrating?

Patient: No, nothing like that. I don't feel nervous driving, and I haven't had any emotional issues from the accident.

Physician: And how has this impacted your daily life? Work, hobbies, anything like that?

Patient: I had to take a week off work, but after that, I was back to my usual routine. It hasn't really stopped me from doing anything.

Physician: That's encouraging. Let's go ahead and do a physical examination to check your mobility and any lingering pain.

[Physical Examination Conducted]

Physician: Everything looks good. Your neck and back have a full range of movement, and there's no tenderness or signs of lasting damage. Your muscles and spine seem to be in good condition.

Patient: That's a relief!

Physician: Yes, your recovery so far has been quite positive. Given your progress, I'd expect you to make a full recovery within six months of the accident. There are no signs of long-term damage or degeneration.

Patient: That's great to hear. So, I don't need to worry about this affecting me in the future?

Physician: That's right. I don't foresee any long-term impact on your work or daily life. If anything changes or you experience worsening symptoms, you can always come back for a follow-up. But at this point, you're on track for a full recovery.

Patient: Thank you, doctor. I appreciate it.

Physician: You're very welcome, Ms. Jones. Take care, and don't hesitate to reach out if you need anything.
";

/// Run every pipeline over one transcript and write the raw outputs to disk.
///
/// Usage: `analyze_transcript [PATH]`. Without a path the built-in sample
/// consultation is analysed.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let text = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read transcript {}", path.display()))?,
        None => {
            info!("no transcript given, using the sample consultation");
            SAMPLE_CONSULTATION.to_string()
        }
    };
    let conversation = Conversation::new(text)?;

    let config = Config::from_env()?;
    let notetaker = NoteTaker::from_config(&config.llm)?;

    let (ner, sentiment, soap) = tokio::try_join!(
        notetaker.extract_entities(&conversation),
        notetaker.analyze_sentiment(&conversation),
        notetaker.generate_soap_note(&conversation),
    )?;

    if ner.is_error() {
        warn!(section = "ner_extraction", "conversation was not recognised as medical");
    } else {
        info!(section = "ner_extraction", result = %serde_json::to_string(&ner)?, "entities extracted");
    }
    info!(section = "sentiment_analysis", result = %serde_json::to_string(&sentiment.data)?, "sentiment analysed");
    info!(section = "soap_note", result = %serde_json::to_string(&soap.data)?, "SOAP note generated");

    let output = json!({
        "ner_extraction": ner,
        "sentiment_analysis": sentiment,
        "soap_note": soap,
    });
    std::fs::write(OUTPUT_PATH, serde_json::to_string_pretty(&output)?)
        .with_context(|| format!("failed to write {OUTPUT_PATH}"))?;

    info!(path = OUTPUT_PATH, "results saved");
    Ok(())
}
