//! Third-party consent integrations.
//!
//! An [`Integration`] is told about every applied consent decision. Calls are
//! best-effort: the manager wraps each one in a catch-and-log boundary, so an
//! integration that errors or panics never interrupts the consent flow. What
//! went wrong is collected in an [`ApplyReport`].

use super::record::ConsentCategories;
use crate::errors::IntegrationError;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Receives consent decisions.
pub trait Integration: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Signals the integration that the user's choice changed.
    fn apply(&self, categories: &ConsentCategories) -> Result<(), IntegrationError>;
}

/// One integration that did not accept the signal.
#[derive(Debug)]
pub struct IntegrationFailure {
    pub integration: String,
    pub error: IntegrationError,
}

/// Outcome of applying consent.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Integrations that accepted the signal, in call order.
    pub signaled: Vec<String>,
    /// Integrations that failed, in call order.
    pub failures: Vec<IntegrationFailure>,
    /// Number of bus subscribers the notification reached.
    pub listeners: usize,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Calls `integration`, turning errors and panics into a [`IntegrationFailure`].
pub(crate) fn apply_guarded(
    integration: &dyn Integration,
    categories: &ConsentCategories,
) -> Result<(), IntegrationFailure> {
    let outcome = catch_unwind(AssertUnwindSafe(|| integration.apply(categories)))
        .unwrap_or_else(|panic| Err(IntegrationError::Panicked(panic_message(panic.as_ref()))));

    outcome.map_err(|error| {
        log::warn!("consent integration {} failed: {}", integration.name(), error);
        IntegrationFailure {
            integration: integration.name().to_string(),
            error,
        }
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Wraps a closure as an integration.
pub struct FnIntegration<F> {
    name: String,
    f: F,
}

impl<F> FnIntegration<F>
where
    F: Fn(&ConsentCategories) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> Integration for FnIntegration<F>
where
    F: Fn(&ConsentCategories) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, categories: &ConsentCategories) -> Result<(), IntegrationError> {
        (self.f)(categories).map_err(IntegrationError::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentState {
    Granted,
    Denied,
}

impl From<bool> for ConsentState {
    fn from(allowed: bool) -> Self {
        if allowed {
            ConsentState::Granted
        } else {
            ConsentState::Denied
        }
    }
}

/// A tag-manager style consent-mode update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentModeUpdate {
    pub analytics_storage: ConsentState,
    pub ad_storage: ConsentState,
    pub ad_user_data: ConsentState,
    pub ad_personalization: ConsentState,
    pub functionality_storage: ConsentState,
    pub personalization_storage: ConsentState,
    pub security_storage: ConsentState,
}

impl From<&ConsentCategories> for ConsentModeUpdate {
    fn from(c: &ConsentCategories) -> Self {
        Self {
            analytics_storage: c.analytics.into(),
            ad_storage: c.marketing.into(),
            ad_user_data: c.marketing.into(),
            ad_personalization: c.marketing.into(),
            functionality_storage: c.preferences.into(),
            personalization_storage: c.preferences.into(),
            security_storage: ConsentState::Granted,
        }
    }
}

type ConsentModeSink = Box<dyn Fn(&ConsentModeUpdate) -> anyhow::Result<()> + Send + Sync>;

/// Translates decisions into [`ConsentModeUpdate`]s and hands them to a sink
/// (typically the bridge that forwards them to the page's tag manager).
pub struct ConsentModeIntegration {
    sink: ConsentModeSink,
}

impl ConsentModeIntegration {
    pub fn new(sink: impl Fn(&ConsentModeUpdate) -> anyhow::Result<()> + Send + Sync + 'static) -> Self {
        Self { sink: Box::new(sink) }
    }
}

impl Integration for ConsentModeIntegration {
    fn name(&self) -> &str {
        "consent-mode"
    }

    fn apply(&self, categories: &ConsentCategories) -> Result<(), IntegrationError> {
        (self.sink)(&ConsentModeUpdate::from(categories))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn consent_mode_maps_categories() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let integration = ConsentModeIntegration::new(move |u| {
            *sink.lock().unwrap() = Some(u.clone());
            Ok(())
        });

        let categories = ConsentCategories { analytics: true, preferences: true, ..ConsentCategories::necessary_only() };
        integration.apply(&categories).unwrap();

        let update = seen.lock().unwrap().clone().unwrap();
        assert_eq!(update.analytics_storage, ConsentState::Granted);
        assert_eq!(update.ad_storage, ConsentState::Denied);
        assert_eq!(update.ad_user_data, ConsentState::Denied);
        assert_eq!(update.functionality_storage, ConsentState::Granted);
        assert_eq!(update.security_storage, ConsentState::Granted);

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["analytics_storage"], "granted");
        assert_eq!(json["ad_personalization"], "denied");
    }

    #[test]
    fn errors_are_captured() {
        let failing = FnIntegration::new("pixel", |_: &ConsentCategories| -> anyhow::Result<()> {
            anyhow::bail!("pixel not loaded")
        });
        let failure = apply_guarded(&failing, &ConsentCategories::necessary_only()).unwrap_err();
        assert_eq!(failure.integration, "pixel");
        assert!(failure.error.to_string().contains("pixel not loaded"));
    }

    #[test]
    fn panics_are_captured() {
        let panicking = FnIntegration::new("buggy", |_: &ConsentCategories| -> anyhow::Result<()> {
            panic!("hook exploded")
        });
        let failure = apply_guarded(&panicking, &ConsentCategories::necessary_only()).unwrap_err();
        assert!(matches!(failure.error, IntegrationError::Panicked(ref m) if m == "hook exploded"));
    }

    #[test]
    fn success_passes_through() {
        let ok = FnIntegration::new("ok", |_: &ConsentCategories| -> anyhow::Result<()> { Ok(()) });
        assert!(apply_guarded(&ok, &ConsentCategories::necessary_only()).is_ok());
    }
}
