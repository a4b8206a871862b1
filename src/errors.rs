use crate::config::ConfigError;

/// Errors returned while assembling a [`ConsentHub`](crate::hub::ConsentHub).
///
/// Once running, nothing in the consent flow fails towards the caller; see
/// [`IntegrationError`] and [`ReportError`] for the failures that get logged instead.
#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No tokio runtime available for the consent reporter")]
    NoRuntime,

    #[error("Cannot build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failure of a single third-party integration while applying consent.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{0}")]
    Failed(#[from] anyhow::Error),

    #[error("Integration panicked: {0}")]
    Panicked(String),
}

/// Failure to deliver a consent report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Consent log answered with status {0}")]
    Status(u16),
}
