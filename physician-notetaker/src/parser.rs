use serde::de::DeserializeOwned;
use tracing::debug;

/// Model output that could not be decoded into the expected schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFallback {
    /// The text as the model returned it, if there was any
    pub raw: Option<String>,
    pub reason: String,
}

/// Decode model output as JSON into `T`.
///
/// A single surrounding Markdown code fence is tolerated. Any other deviation
/// (not JSON, wrong field types, missing input) comes back as a [`RawFallback`]
/// carrying the original text.
pub fn parse_json<T: DeserializeOwned>(raw: Option<&str>) -> Result<T, RawFallback> {
    let Some(text) = raw else {
        return Err(RawFallback {
            raw: None,
            reason: "no model output".to_string(),
        });
    };

    serde_json::from_str::<T>(strip_code_fence(text)).map_err(|e| {
        debug!(error = %e, chars = text.len(), "model output is not valid JSON for the schema");
        RawFallback {
            raw: Some(text.to_string()),
            reason: e.to_string(),
        }
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_suffix("```").unwrap_or(body);

    // An info string such as `json` or `JSON` runs up to the first newline.
    match body.split_once('\n') {
        Some((tag, rest)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => rest.trim(),
        _ => strip_language_tag(body).trim(),
    }
}

fn strip_language_tag(body: &str) -> &str {
    match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    }
}
