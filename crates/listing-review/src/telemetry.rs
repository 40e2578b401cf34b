use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// HTTP client internals that log every connection at `debug`.
const QUIETED_TARGETS: [&str; 3] = ["hyper_util", "reqwest", "h2"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("APP_LOG_LEVEL '{value}' is not a valid tracing filter")]
    Filter { value: String, source: ParseError },
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

/// Filter used when `RUST_LOG` is unset: the configured level for the console
/// and the sandbox, capped at `warn` for the HTTP stack.
pub fn default_directives(level: &str) -> String {
    let mut directives = vec![level.trim().to_string()];
    directives.extend(QUIETED_TARGETS.iter().map(|target| format!("{target}=warn")));
    directives.join(",")
}

fn filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directives(&config.log_level)).map_err(|source| {
        TelemetryError::Filter {
            value: config.log_level.clone(),
            source,
        }
    })
}

/// Installs the process-wide subscriber writing compact lines to stderr, so
/// console output on stdout stays clean.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}
