use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "physician_notetaker=debug,note_flow=debug,tower_http=debug";

/// Output format selected by `LOG_FORMAT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// `pretty` in any case selects human-readable output; anything else is JSON
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Directives from `RUST_LOG` when they parse, [`DEFAULT_FILTER`] otherwise
pub fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let registry =
        tracing_subscriber::registry().with(env_filter(std::env::var("RUST_LOG").ok().as_deref()));

    match format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
        // Request spans carry the correlation id, so keep them on every event.
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_level(true),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_defaults_to_json() {
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some("compact")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some("Pretty")), LogFormat::Pretty);
    }

    #[test]
    fn default_filter_covers_workspace_crates() {
        let filter = env_filter(None).to_string();
        assert!(filter.contains("physician_notetaker=debug"));
        assert!(filter.contains("note_flow=debug"));

        let blank = env_filter(Some("  ")).to_string();
        assert!(blank.contains("physician_notetaker=debug"));
    }

    #[test]
    fn rust_log_overrides_default() {
        let filter = env_filter(Some("physician_notetaker=warn")).to_string();
        assert!(filter.contains("physician_notetaker=warn"));
        assert!(!filter.contains("note_flow"));
    }
}
